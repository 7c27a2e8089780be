use super::{Grid, SparsityError};

/// Per-variable dependency lists in compressed-row form.
///
/// Row `i` lists the state variables whose values enter the rate of change of
/// variable `i`, starting with `i` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl SparsityPattern {
    /// Creates a pattern from row offsets and flat indices.
    ///
    /// Returns `None` unless `offsets` starts at zero, never decreases, and
    /// ends at `indices.len()`.
    #[must_use]
    pub fn from_parts(offsets: Vec<usize>, indices: Vec<usize>) -> Option<Self> {
        let valid = offsets.first() == Some(&0)
            && offsets.last() == Some(&indices.len())
            && offsets.windows(2).all(|w| w[0] <= w[1]);
        valid.then_some(Self { offsets, indices })
    }

    /// Number of state variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of entries across all rows.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Returns the dependencies of variable `i`, or an empty slice if `i` is
    /// out of range.
    #[must_use]
    pub fn dependencies(&self, i: usize) -> &[usize] {
        match (self.offsets.get(i), self.offsets.get(i + 1)) {
            (Some(&start), Some(&end)) => &self.indices[start..end],
            _ => &[],
        }
    }

    /// Returns the entry count of each variable.
    #[must_use]
    pub fn counts(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[must_use]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns whether variable `i` depends on variable `j`.
    #[must_use]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.dependencies(i).contains(&j)
    }

    /// Iterates over `(variable, dependencies)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[usize])> {
        (0..self.len()).map(|i| (i, self.dependencies(i)))
    }
}

/// Builds the pattern for `grid` without a size limit.
#[must_use]
pub fn build(grid: &Grid) -> SparsityPattern {
    match build_with_capacity(grid, usize::MAX) {
        Ok(pattern) => pattern,
        Err(_) => unreachable!("an unbounded buffer cannot be exhausted"),
    }
}

/// Builds the pattern for `grid` into a buffer of at most `capacity` entries.
///
/// For every variable the entries are, in order: itself; the next cell along
/// each axis (last axis first); the previous cell along each axis (first axis
/// first); periodic wraps at the low and high edges (first axis first); then
/// the same cell of every other species in ascending order. Wrapped entries
/// that coincide with one already listed are skipped.
///
/// # Errors
///
/// Returns [`SparsityError::BufferExhausted`] naming the variable being built
/// when the buffer fills up. The partial pattern is discarded.
pub fn build_with_capacity(grid: &Grid, capacity: usize) -> Result<SparsityPattern, SparsityError> {
    let cells = grid.cells();
    let dims = grid.dimensionality();
    let extents = grid.extents();
    let periodic = grid.periodic();
    let strides: Vec<usize> = (0..dims).map(|axis| grid.stride(axis)).collect();

    let mut rows = Rows::new(grid.state_count(), capacity);
    let mut coords = [0; 3];

    for species in 0..grid.species() {
        let base = species * cells;
        for cell in 0..cells {
            let m = base + cell;
            grid.coords(cell, &mut coords);
            rows.begin();

            rows.push(m, m)?;

            for axis in (0..dims).rev() {
                if coords[axis] + 1 < extents[axis] {
                    rows.push(m + strides[axis], m)?;
                }
            }
            for axis in 0..dims {
                if coords[axis] > 0 {
                    rows.push(m - strides[axis], m)?;
                }
            }

            for axis in 0..dims {
                if !periodic[axis] {
                    continue;
                }
                let span = (extents[axis] - 1) * strides[axis];
                if coords[axis] == 0 {
                    rows.push_unique(m + span, m)?;
                }
                if coords[axis] + 1 == extents[axis] {
                    rows.push_unique(m - span, m)?;
                }
            }

            for other in (0..grid.species()).filter(|&s| s != species) {
                rows.push(other * cells + cell, m)?;
            }

            rows.end();
        }
    }

    Ok(rows.finish())
}

/// Growing compressed rows with a hard entry limit.
struct Rows {
    offsets: Vec<usize>,
    indices: Vec<usize>,
    capacity: usize,
    start: usize,
}

impl Rows {
    fn new(states: usize, capacity: usize) -> Self {
        let mut offsets = Vec::with_capacity(states + 1);
        offsets.push(0);
        Self {
            offsets,
            indices: Vec::new(),
            capacity,
            start: 0,
        }
    }

    fn begin(&mut self) {
        self.start = self.indices.len();
    }

    fn push(&mut self, index: usize, state: usize) -> Result<(), SparsityError> {
        if self.indices.len() >= self.capacity {
            return Err(SparsityError::BufferExhausted {
                capacity: self.capacity,
                state,
            });
        }
        self.indices.push(index);
        Ok(())
    }

    fn push_unique(&mut self, index: usize, state: usize) -> Result<(), SparsityError> {
        if self.indices[self.start..].contains(&index) {
            return Ok(());
        }
        self.push(index, state)
    }

    fn end(&mut self) {
        self.offsets.push(self.indices.len());
    }

    fn finish(self) -> SparsityPattern {
        SparsityPattern {
            offsets: self.offsets,
            indices: self.indices,
        }
    }
}
