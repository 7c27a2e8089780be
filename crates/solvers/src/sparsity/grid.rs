use thiserror::Error;

/// Errors raised when a grid description is invalid.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("a grid needs at least one species")]
    NoSpecies,

    #[error("grids have 1, 2, or 3 axes, got {0}")]
    Dimensionality(usize),

    #[error("axis {axis} has zero extent")]
    ZeroExtent { axis: usize },

    #[error("expected {expected} periodic flags, got {got}")]
    PeriodicFlags { expected: usize, got: usize },

    #[error("grid has more state variables than can be indexed")]
    TooLarge,
}

/// Species laid out on a regular 1D, 2D, or 3D grid.
///
/// State variables are flattened species-major, then by axis with the last
/// axis varying fastest: the variable for species `s` at cell `(x, y, z)` has
/// index `s * cells + (x * ny + y) * nz + z`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-derive", serde(try_from = "GridFile", into = "GridFile"))]
pub struct Grid {
    species: usize,
    extents: Vec<usize>,
    periodic: Vec<bool>,
}

impl Grid {
    /// Creates a grid from per-axis extents and periodic flags.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no species, the axis count is not 1–3,
    /// an extent is zero, the flag count differs from the axis count, or the
    /// state count overflows `usize`.
    pub fn new(species: usize, extents: &[usize], periodic: &[bool]) -> Result<Self, GridError> {
        if species == 0 {
            return Err(GridError::NoSpecies);
        }
        if !(1..=3).contains(&extents.len()) {
            return Err(GridError::Dimensionality(extents.len()));
        }
        if let Some(axis) = extents.iter().position(|&n| n == 0) {
            return Err(GridError::ZeroExtent { axis });
        }
        if periodic.len() != extents.len() {
            return Err(GridError::PeriodicFlags {
                expected: extents.len(),
                got: periodic.len(),
            });
        }
        extents
            .iter()
            .try_fold(species, |acc, &n| acc.checked_mul(n))
            .ok_or(GridError::TooLarge)?;

        Ok(Self {
            species,
            extents: extents.to_vec(),
            periodic: periodic.to_vec(),
        })
    }

    /// Creates a 1D grid.
    ///
    /// # Errors
    ///
    /// See [`Grid::new`].
    pub fn line(species: usize, n: usize, periodic: bool) -> Result<Self, GridError> {
        Self::new(species, &[n], &[periodic])
    }

    /// Creates a 2D grid.
    ///
    /// # Errors
    ///
    /// See [`Grid::new`].
    pub fn plane(species: usize, extents: [usize; 2], periodic: [bool; 2]) -> Result<Self, GridError> {
        Self::new(species, &extents, &periodic)
    }

    /// Creates a 3D grid.
    ///
    /// # Errors
    ///
    /// See [`Grid::new`].
    pub fn volume(
        species: usize,
        extents: [usize; 3],
        periodic: [bool; 3],
    ) -> Result<Self, GridError> {
        Self::new(species, &extents, &periodic)
    }

    #[must_use]
    pub fn species(&self) -> usize {
        self.species
    }

    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.extents.len()
    }

    #[must_use]
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    #[must_use]
    pub fn periodic(&self) -> &[bool] {
        &self.periodic
    }

    /// Number of cells (product of extents).
    #[must_use]
    pub fn cells(&self) -> usize {
        self.extents.iter().product()
    }

    /// Number of state variables (species × cells).
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.species * self.cells()
    }

    /// Distance in the flat index between neighbors along `axis`.
    #[must_use]
    pub fn stride(&self, axis: usize) -> usize {
        self.extents[axis + 1..].iter().product()
    }

    /// Returns the flat index of `species` at the cell with `coords`.
    ///
    /// Returns `None` if the species or any coordinate is out of range.
    #[must_use]
    pub fn index(&self, species: usize, coords: &[usize]) -> Option<usize> {
        if species >= self.species || coords.len() != self.extents.len() {
            return None;
        }
        let mut cell = 0;
        for (&c, &n) in coords.iter().zip(&self.extents) {
            if c >= n {
                return None;
            }
            cell = cell * n + c;
        }
        Some(species * self.cells() + cell)
    }

    /// Splits a cell number into per-axis coordinates.
    pub(super) fn coords(&self, mut cell: usize, out: &mut [usize; 3]) {
        for axis in (0..self.extents.len()).rev() {
            let n = self.extents[axis];
            out[axis] = cell % n;
            cell /= n;
        }
    }
}

/// Unvalidated grid as read from a settings file.
#[cfg(feature = "serde-derive")]
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct GridFile {
    species: usize,
    extents: Vec<usize>,
    #[serde(default)]
    periodic: Vec<bool>,
}

#[cfg(feature = "serde-derive")]
impl From<Grid> for GridFile {
    fn from(grid: Grid) -> Self {
        Self {
            species: grid.species,
            extents: grid.extents,
            periodic: grid.periodic,
        }
    }
}

#[cfg(feature = "serde-derive")]
impl TryFrom<GridFile> for Grid {
    type Error = GridError;

    fn try_from(file: GridFile) -> Result<Self, GridError> {
        let periodic = if file.periodic.is_empty() {
            vec![false; file.extents.len()]
        } else {
            file.periodic
        };
        Grid::new(file.species, &file.extents, &periodic)
    }
}
