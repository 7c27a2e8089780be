//! Jacobian sparsity patterns for reaction-transport systems on regular grids.
//!
//! A [`Grid`] places a number of species on a 1D, 2D, or 3D grid. The rate of
//! change of each species in a cell depends on that cell, its immediate
//! neighbors along every axis, and the other species in the same cell.
//! [`build`] lists those dependencies for every state variable, and
//! [`layout::install_grid`] writes them into the integer workspace of a sparse
//! solver service.
//!
//! Neighbors across a non-periodic edge are omitted; periodic axes wrap the
//! first and last cells onto each other.
//!
//! # Example
//!
//! ```
//! use lode_solvers::sparsity::{Grid, build};
//!
//! let grid = Grid::line(2, 5, false).unwrap();
//! let pattern = build(&grid);
//!
//! // Species 0, first cell: itself, the next cell, and species 1 there.
//! assert_eq!(pattern.dependencies(0), &[0, 1, 5]);
//! ```

mod error;
mod grid;
pub mod layout;
mod pattern;

#[cfg(test)]
mod tests;

pub use error::SparsityError;
pub use grid::{Grid, GridError};
pub use pattern::{SparsityPattern, build, build_with_capacity};
