use proptest::prelude::*;

use super::{Grid, SparsityError, build, build_with_capacity};

fn grid_strategy() -> impl Strategy<Value = Grid> {
    (1usize..=3, prop::collection::vec((1usize..=5, any::<bool>()), 1..=3)).prop_map(
        |(species, axes)| {
            let extents: Vec<usize> = axes.iter().map(|(n, _)| *n).collect();
            let periodic: Vec<bool> = axes.iter().map(|(_, p)| *p).collect();
            Grid::new(species, &extents, &periodic).unwrap()
        },
    )
}

#[test]
fn single_cell_single_species_lists_only_itself() {
    let grid = Grid::volume(1, [1, 1, 1], [true, true, true]).unwrap();
    let pattern = build(&grid);

    assert_eq!(pattern.len(), 1);
    assert_eq!(pattern.dependencies(0), &[0]);
}

#[test]
fn one_dimensional_two_species() {
    let grid = Grid::line(2, 5, false).unwrap();
    let pattern = build(&grid);

    assert_eq!(pattern.counts(), vec![3, 4, 4, 4, 3, 3, 4, 4, 4, 3]);

    // First cell has no left neighbor.
    assert_eq!(pattern.dependencies(0), &[0, 1, 5]);
    assert_eq!(pattern.dependencies(2), &[2, 3, 1, 7]);
    assert_eq!(pattern.dependencies(4), &[4, 3, 9]);
    assert_eq!(pattern.dependencies(5), &[5, 6, 0]);
}

#[test]
fn periodic_line_links_first_and_last() {
    let grid = Grid::line(1, 4, true).unwrap();
    let pattern = build(&grid);

    assert_eq!(pattern.dependencies(0), &[0, 1, 3]);
    assert_eq!(pattern.dependencies(3), &[3, 2, 0]);
    assert_eq!(pattern.dependencies(1), &[1, 2, 0]);
}

#[test]
fn plane_orders_fast_axis_first_then_wraps() {
    // 3 × 3, periodic along x only. Cell (0, 0) is index 0.
    let grid = Grid::plane(1, [3, 3], [true, false]).unwrap();
    let pattern = build(&grid);

    // self, +y, +x, then x wrap to (2, 0).
    assert_eq!(pattern.dependencies(0), &[0, 1, 3, 6]);
    // (1, 1): self, +y, +x, -x, -y.
    assert_eq!(pattern.dependencies(4), &[4, 5, 7, 1, 3]);
    // (2, 2): self, -x, -y, then x wrap to (0, 2).
    assert_eq!(pattern.dependencies(8), &[8, 5, 7, 2]);
}

#[test]
fn volume_interior_cell_has_six_neighbors() {
    let grid = Grid::volume(2, [3, 3, 3], [false; 3]).unwrap();
    let pattern = build(&grid);
    let center = grid.index(0, &[1, 1, 1]).unwrap();

    assert_eq!(center, 13);
    assert_eq!(pattern.dependencies(center), &[13, 14, 16, 22, 4, 10, 12, 40]);
}

#[test]
fn short_periodic_axes_do_not_duplicate() {
    let grid = Grid::plane(1, [2, 1], [true, true]).unwrap();
    let pattern = build(&grid);

    assert_eq!(pattern.dependencies(0), &[0, 1]);
    assert_eq!(pattern.dependencies(1), &[1, 0]);
}

#[test]
fn exhaustion_reports_the_variable_being_built() {
    let grid = Grid::line(1, 4, false).unwrap();

    let err = build_with_capacity(&grid, 5).unwrap_err();

    // Rows are 2, 3, 3, 2 long; the sixth entry belongs to variable 2.
    assert_eq!(
        err,
        SparsityError::BufferExhausted {
            capacity: 5,
            state: 2
        }
    );
}

proptest! {
    #[test]
    fn rows_start_with_self_and_stay_in_bounds(grid in grid_strategy()) {
        let pattern = build(&grid);
        let n = grid.state_count();

        prop_assert_eq!(pattern.len(), n);
        for (i, deps) in pattern.rows() {
            prop_assert_eq!(deps[0], i);
            prop_assert!(deps.iter().all(|&j| j < n));
        }
    }

    #[test]
    fn rows_have_no_duplicates(grid in grid_strategy()) {
        let pattern = build(&grid);
        for (_, deps) in pattern.rows() {
            let mut sorted = deps.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), deps.len());
        }
    }

    #[test]
    fn dependencies_are_symmetric(grid in grid_strategy()) {
        let pattern = build(&grid);
        for (i, deps) in pattern.rows() {
            for &j in deps {
                prop_assert!(pattern.contains(j, i));
            }
        }
    }

    #[test]
    fn colocated_species_appear_once_each(grid in grid_strategy()) {
        let pattern = build(&grid);
        let cells = grid.cells();
        for (i, deps) in pattern.rows() {
            let cell = i % cells;
            let colocated = deps.iter().filter(|&&j| j % cells == cell && j != i).count();
            prop_assert_eq!(colocated, grid.species() - 1);
        }
    }

    #[test]
    fn too_small_buffers_fail_instead_of_truncating(grid in grid_strategy(), cut in 1usize..10) {
        let full = build(&grid);
        let capacity = full.nnz().saturating_sub(cut);

        let result = build_with_capacity(&grid, capacity);

        let is_exhausted = matches!(result, Err(SparsityError::BufferExhausted { .. }));
        prop_assert!(is_exhausted);
    }
}
