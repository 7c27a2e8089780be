//! Session driving and sparsity construction for the Lode framework.
//!
//! - [`integration`] — the per-interval session driver, the status
//!   interpreter it consults, and a fixed-step reference solver service
//! - [`sparsity`] — jacobian sparsity patterns for species on 1D, 2D, and 3D
//!   grids, and their installation into a solver workspace

pub mod integration;
pub mod sparsity;
