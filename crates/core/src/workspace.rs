//! Fixed-size integer and real buffers shared with a solver service.
//!
//! A [`Workspace`] is allocated once when a session starts and belongs to that
//! session alone. Slot positions follow the layout solver services expect; the
//! well-known ones are named in [`slot`].

use std::ops::Range;

/// Named positions in the workspace buffers.
pub mod slot {
    /// Real slot holding the critical time a service must not step past.
    pub const CRITICAL_TIME: usize = 0;

    /// Real slot holding the initial step size (0 lets the service choose).
    pub const INITIAL_STEP: usize = 4;

    /// Real slot holding the maximum step size (0 means unbounded).
    pub const MAX_STEP: usize = 5;

    /// Real slot holding the minimum step size.
    pub const MIN_STEP: usize = 6;

    /// Integer slot holding the per-call step budget (0 selects the default).
    pub const MAX_STEPS: usize = 5;

    /// Integer slot where services record the cumulative step count.
    pub const STEPS_TAKEN: usize = 10;

    /// Integer slot where services record derivative evaluations.
    pub const DERIVATIVE_CALLS: usize = 11;

    /// Integer slot where services record jacobian evaluations.
    pub const JACOBIAN_CALLS: usize = 12;

    /// Real slot where services record the last step size used.
    pub const LAST_STEP: usize = 10;

    /// Real slot where services record the step size to try next.
    pub const NEXT_STEP: usize = 11;

    /// Real slot where services record how far integration actually got.
    pub const CURRENT_TIME: usize = 12;

    /// Integer slots a caller may seed with optional inputs.
    pub const INT_INPUTS: std::ops::Range<usize> = 5..10;

    /// Real slots a caller may seed with optional inputs.
    pub const REAL_INPUTS: std::ops::Range<usize> = 5..8;
}

/// Requested buffer lengths for a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkspaceSize {
    pub int_len: usize,
    pub real_len: usize,
}

/// Integer and real buffers owned by one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    int: Vec<i32>,
    real: Vec<f64>,
}

impl Workspace {
    /// Allocates zeroed buffers of the given size.
    #[must_use]
    pub fn new(size: WorkspaceSize) -> Self {
        Self {
            int: vec![0; size.int_len],
            real: vec![0.0; size.real_len],
        }
    }

    /// Copies caller-provided values into the front of each buffer.
    ///
    /// Values beyond a buffer's length are dropped.
    pub fn seed(&mut self, int_inputs: &[i32], real_inputs: &[f64]) {
        let n = int_inputs.len().min(self.int.len());
        self.int[..n].copy_from_slice(&int_inputs[..n]);
        let n = real_inputs.len().min(self.real.len());
        self.real[..n].copy_from_slice(&real_inputs[..n]);
    }

    #[must_use]
    pub fn int(&self) -> &[i32] {
        &self.int
    }

    pub fn int_mut(&mut self) -> &mut [i32] {
        &mut self.int
    }

    #[must_use]
    pub fn real(&self) -> &[f64] {
        &self.real
    }

    pub fn real_mut(&mut self) -> &mut [f64] {
        &mut self.real
    }

    /// Reads an integer slot, treating missing slots as zero.
    #[must_use]
    pub fn int_at(&self, index: usize) -> i32 {
        self.int.get(index).copied().unwrap_or(0)
    }

    /// Reads a real slot, treating missing slots as zero.
    #[must_use]
    pub fn real_at(&self, index: usize) -> f64 {
        self.real.get(index).copied().unwrap_or(0.0)
    }

    /// Writes an integer slot if it exists.
    pub fn set_int(&mut self, index: usize, value: i32) {
        if let Some(slot) = self.int.get_mut(index) {
            *slot = value;
        }
    }

    /// Writes a real slot if it exists.
    pub fn set_real(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.real.get_mut(index) {
            *slot = value;
        }
    }

    /// Returns whether any optional-input slot holds a non-default value.
    #[must_use]
    pub fn has_optional_inputs(&self) -> bool {
        let ints = slot::INT_INPUTS.filter_map(|i| self.int.get(i)).any(|v| *v != 0);
        let reals = slot::REAL_INPUTS
            .filter_map(|i| self.real.get(i))
            .any(|v| *v != 0.0);
        ints || reals
    }

    /// Captures the statistics slots named by `layout`.
    #[must_use]
    pub fn snapshot(&self, status: i32, layout: &DiagnosticLayout) -> Diagnostics {
        Diagnostics {
            status,
            int_stats: clamped(&self.int, layout.int.clone()).to_vec(),
            real_stats: clamped(&self.real, layout.real.clone()).to_vec(),
        }
    }
}

fn clamped<T>(buffer: &[T], range: Range<usize>) -> &[T] {
    let end = range.end.min(buffer.len());
    let start = range.start.min(end);
    &buffer[start..end]
}

/// Which workspace slots make up a diagnostic snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagnosticLayout {
    pub int: Range<usize>,
    pub real: Range<usize>,
}

impl Default for DiagnosticLayout {
    fn default() -> Self {
        Self {
            int: 10..22,
            real: 10..15,
        }
    }
}

/// The last status code and workspace statistics of a session.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    pub status: i32,
    pub int_stats: Vec<i32>,
    pub real_stats: Vec<f64>,
}
