use ndarray::Array2;

/// One output row: the time reached, the state there, and auxiliary outputs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    pub time: f64,
    pub state: Vec<f64>,
    pub aux: Vec<f64>,
}

/// The rows produced by a session, in time order.
///
/// A trajectory never holds more rows than output times were requested. It is
/// partial when the session ended before the last requested time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub struct Trajectory {
    rows: Vec<Row>,
    requested: usize,
    partial: bool,
}

impl Trajectory {
    /// Creates an empty trajectory with room for `requested` rows.
    #[must_use]
    pub fn with_requested(requested: usize) -> Self {
        Self {
            rows: Vec::with_capacity(requested),
            requested,
            partial: false,
        }
    }

    /// Appends a row.
    ///
    /// Returns `false` (and drops the row) if the trajectory is already full.
    pub fn push(&mut self, row: Row) -> bool {
        if self.rows.len() >= self.requested {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Marks the trajectory as ending before the last requested time.
    pub fn mark_partial(&mut self) {
        self.partial = true;
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn requested(&self) -> usize {
        self.requested
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    #[must_use]
    pub fn last(&self) -> Option<&Row> {
        self.rows.last()
    }

    /// Returns the time of every row.
    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.time).collect()
    }

    /// Returns state component `index` across all rows.
    #[must_use]
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.state.get(index).copied().unwrap_or(f64::NAN))
            .collect()
    }

    /// Returns the rows as a matrix with columns `[time, state.., aux..]`.
    ///
    /// Rows shorter than the first row are padded with NaN.
    #[must_use]
    pub fn to_matrix(&self) -> Array2<f64> {
        let (n_state, n_aux) = self
            .rows
            .first()
            .map_or((0, 0), |r| (r.state.len(), r.aux.len()));
        let cols = 1 + n_state + n_aux;

        Array2::from_shape_fn((self.rows.len(), cols), |(i, j)| {
            let row = &self.rows[i];
            match j {
                0 => row.time,
                j if j <= n_state => row.state.get(j - 1).copied().unwrap_or(f64::NAN),
                j => row.aux.get(j - 1 - n_state).copied().unwrap_or(f64::NAN),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn row(time: f64, y: f64) -> Row {
        Row {
            time,
            state: vec![y, -y],
            aux: vec![y * 10.0],
        }
    }

    #[test]
    fn never_exceeds_requested_rows() {
        let mut traj = Trajectory::with_requested(2);

        assert!(traj.push(row(0.0, 1.0)));
        assert!(traj.push(row(1.0, 2.0)));
        assert!(!traj.push(row(2.0, 3.0)));

        assert_eq!(traj.len(), 2);
        assert!(!traj.is_partial());
    }

    #[test]
    fn matrix_has_time_state_and_aux_columns() {
        let mut traj = Trajectory::with_requested(3);
        traj.push(row(0.0, 1.0));
        traj.push(row(0.5, 2.0));

        let m = traj.to_matrix();

        assert_eq!(m.dim(), (2, 4));
        assert_relative_eq!(m[[1, 0]], 0.5);
        assert_relative_eq!(m[[1, 1]], 2.0);
        assert_relative_eq!(m[[1, 2]], -2.0);
        assert_relative_eq!(m[[1, 3]], 20.0);
    }

    #[test]
    fn columns_are_extracted_by_index() {
        let mut traj = Trajectory::with_requested(2);
        traj.push(row(0.0, 1.0));
        traj.push(row(1.0, 4.0));
        traj.mark_partial();

        assert_eq!(traj.times(), vec![0.0, 1.0]);
        assert_eq!(traj.component(1), vec![-1.0, -4.0]);
        assert!(traj.is_partial());
    }
}
