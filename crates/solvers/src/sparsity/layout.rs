//! The integer-workspace encoding sparse solver services read.
//!
//! Slot [`HEADER`] holds 1. Slots `HEADER + 1 ..= HEADER + n` hold, for each
//! variable, the 1-based position one past its last entry. Entries follow
//! from slot `HEADER + 1 + n` as 1-based variable indices, terminated by 0.
//! No entry may be written past slot `len - 4`.

use lode_core::Workspace;

use super::{Grid, SparsityError, SparsityPattern, pattern::build_with_capacity};

/// First integer slot of the encoded pattern.
pub const HEADER: usize = 30;

/// Number of entries a workspace of `int_len` slots can hold for `n` variables.
#[must_use]
pub fn capacity(int_len: usize, n: usize) -> usize {
    int_len.saturating_sub(3).saturating_sub(HEADER + 1 + n)
}

/// Builds the pattern for `grid` and writes it into `workspace`.
///
/// # Errors
///
/// Returns [`SparsityError::Mismatch`] if the grid does not describe
/// `equations` variables, [`SparsityError::BufferExhausted`] if the integer
/// buffer is too small, or [`SparsityError::Overflow`] if a value does not
/// fit an `i32`. The workspace is left untouched on error.
pub fn install_grid(
    grid: &Grid,
    equations: usize,
    workspace: &mut Workspace,
) -> Result<SparsityPattern, SparsityError> {
    if grid.state_count() != equations {
        return Err(SparsityError::Mismatch {
            grid: grid.state_count(),
            equations,
        });
    }
    let capacity = capacity(workspace.int().len(), equations);
    let pattern = build_with_capacity(grid, capacity)?;
    install(&pattern, workspace)?;
    Ok(pattern)
}

/// Writes an already built pattern into `workspace`.
///
/// # Errors
///
/// Returns [`SparsityError::BufferExhausted`] if the pattern does not fit, or
/// [`SparsityError::Overflow`] if a value does not fit an `i32`.
pub fn install(pattern: &SparsityPattern, workspace: &mut Workspace) -> Result<(), SparsityError> {
    let n = pattern.len();
    let capacity = capacity(workspace.int().len(), n);
    if pattern.nnz() > capacity || workspace.int().len() < HEADER + 2 + n {
        let state = pattern
            .offsets()
            .iter()
            .position(|&end| end > capacity)
            .map_or(0, |row| row.saturating_sub(1));
        return Err(SparsityError::BufferExhausted { capacity, state });
    }

    let ends = pattern
        .offsets()
        .iter()
        .skip(1)
        .map(|&end| one_based(end))
        .collect::<Result<Vec<_>, _>>()?;
    let entries = pattern
        .indices()
        .iter()
        .map(|&j| one_based(j))
        .collect::<Result<Vec<_>, _>>()?;

    let int = workspace.int_mut();
    let first = HEADER + 1 + n;
    int[HEADER] = 1;
    int[HEADER + 1..first].copy_from_slice(&ends);
    int[first..first + entries.len()].copy_from_slice(&entries);
    int[first + entries.len()] = 0;
    Ok(())
}

/// Reads a pattern for `n` variables back out of `workspace`.
///
/// # Errors
///
/// Returns [`SparsityError::Missing`] if the header is absent or the encoded
/// offsets and entries are inconsistent.
pub fn read(workspace: &Workspace, n: usize) -> Result<SparsityPattern, SparsityError> {
    let missing = SparsityError::Missing { equations: n };
    let int = workspace.int();
    let first = HEADER + 1 + n;
    if int.len() < first || int[HEADER] != 1 {
        return Err(missing);
    }

    let mut offsets = Vec::with_capacity(n + 1);
    offsets.push(0);
    for &end in &int[HEADER + 1..first] {
        let end = usize::try_from(end).ok().and_then(|e| e.checked_sub(1));
        offsets.push(end.ok_or(missing)?);
    }

    let nnz = offsets[n];
    let raw = int.get(first..first + nnz).ok_or(missing)?;
    let indices = raw
        .iter()
        .map(|&j| {
            usize::try_from(j)
                .ok()
                .and_then(|j| j.checked_sub(1))
                .filter(|&j| j < n)
        })
        .collect::<Option<Vec<_>>>()
        .ok_or(missing)?;

    SparsityPattern::from_parts(offsets, indices).ok_or(missing)
}

fn one_based(value: usize) -> Result<i32, SparsityError> {
    value
        .checked_add(1)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(SparsityError::Overflow(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    use lode_core::WorkspaceSize;

    fn workspace(int_len: usize) -> Workspace {
        Workspace::new(WorkspaceSize {
            int_len,
            real_len: 0,
        })
    }

    #[test]
    fn encodes_header_offsets_and_entries() {
        // Two cells, one species: [0, 1] and [1, 0].
        let grid = Grid::line(1, 2, false).unwrap();
        let mut ws = workspace(64);

        install_grid(&grid, 2, &mut ws).unwrap();

        let int = ws.int();
        assert_eq!(int[30], 1);
        assert_eq!(&int[31..33], &[3, 5]);
        assert_eq!(&int[33..37], &[1, 2, 2, 1]);
        assert_eq!(int[37], 0);
    }

    #[test]
    fn reads_back_what_was_installed() {
        let grid = Grid::plane(2, [3, 4], [true, false]).unwrap();
        let n = grid.state_count();
        let mut ws = workspace(400);

        let pattern = install_grid(&grid, n, &mut ws).unwrap();

        assert_eq!(read(&ws, n).unwrap(), pattern);
    }

    #[test]
    fn exact_fit_succeeds_and_one_less_fails() {
        let grid = Grid::line(2, 5, false).unwrap();
        let nnz = crate::sparsity::build(&grid).nnz();
        let exact = HEADER + 1 + 10 + nnz + 3;

        assert!(install_grid(&grid, 10, &mut workspace(exact)).is_ok());

        let mut short = workspace(exact - 1);
        let err = install_grid(&grid, 10, &mut short).unwrap_err();
        assert!(matches!(
            err,
            SparsityError::BufferExhausted { state: 9, .. }
        ));
        assert!(short.int().iter().all(|&v| v == 0));
    }

    #[test]
    fn tiny_workspace_is_exhausted_not_truncated() {
        let grid = Grid::line(1, 3, false).unwrap();
        let err = install_grid(&grid, 3, &mut workspace(20)).unwrap_err();
        assert_eq!(
            err,
            SparsityError::BufferExhausted {
                capacity: 0,
                state: 0
            }
        );
    }

    #[test]
    fn rejects_grid_of_wrong_size() {
        let grid = Grid::line(1, 3, false).unwrap();
        let err = install_grid(&grid, 4, &mut workspace(100)).unwrap_err();
        assert_eq!(err, SparsityError::Mismatch { grid: 3, equations: 4 });
    }

    #[test]
    fn missing_header_is_reported() {
        let ws = workspace(100);
        assert_eq!(
            read(&ws, 3).unwrap_err(),
            SparsityError::Missing { equations: 3 }
        );
    }
}
