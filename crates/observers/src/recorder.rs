use lode_core::{Observer, Row};
use lode_solvers::integration::{
    Outcome,
    session::{Action, Event, Trigger},
};

/// An owned copy of one session event.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Interval { index: usize, row: Row },
    Warning { time: f64, outcome: Outcome, code: i32, retries: usize },
    Escalated { time: f64, cumulative: f64 },
    Root { time: f64, roots: Vec<usize> },
    EventApplied { time: f64, trigger: Trigger },
}

impl From<&Event<'_>> for Record {
    fn from(event: &Event<'_>) -> Self {
        match *event {
            Event::Interval { index, row } => Self::Interval {
                index,
                row: row.clone(),
            },
            Event::Warning {
                time,
                verdict,
                retries,
            } => Self::Warning {
                time,
                outcome: verdict.outcome,
                code: verdict.code,
                retries,
            },
            Event::Escalated {
                time, cumulative, ..
            } => Self::Escalated { time, cumulative },
            Event::Root { time, roots } => Self::Root {
                time,
                roots: roots.to_vec(),
            },
            Event::EventApplied { time, trigger } => Self::EventApplied { time, trigger },
        }
    }
}

/// Keeps an owned record of every session event.
///
/// Pass `&mut Recorder` as the observer to inspect the records afterwards.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    records: Vec<Record>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the warnings seen, in order.
    #[must_use]
    pub fn warnings(&self) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| matches!(r, Record::Warning { .. }))
            .collect()
    }

    /// Returns the times of every recorded row.
    #[must_use]
    pub fn row_times(&self) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| match r {
                Record::Interval { row, .. } => Some(row.time),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Observer<Event<'_>, Action> for Recorder {
    fn observe(&mut self, event: &Event<'_>) -> Option<Action> {
        self.records.push(Record::from(event));
        None
    }
}

impl Observer<Event<'_>, Action> for &mut Recorder {
    fn observe(&mut self, event: &Event<'_>) -> Option<Action> {
        (**self).observe(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lode_core::SolverKind;
    use lode_solvers::integration::interpret;

    #[test]
    fn records_owned_copies() {
        let mut recorder = Recorder::new();
        let row = Row {
            time: 0.5,
            state: vec![2.0],
            aux: vec![],
        };
        let roots = vec![0, 2];

        recorder.observe(&Event::Interval { index: 1, row: &row });
        recorder.observe(&Event::Warning {
            time: 0.5,
            verdict: interpret(-5, SolverKind::Stiff),
            retries: 1,
        });
        recorder.observe(&Event::Root {
            time: 0.7,
            roots: &roots,
        });

        assert_eq!(recorder.records().len(), 3);
        assert_eq!(recorder.row_times(), vec![0.5]);
        assert_eq!(
            recorder.warnings(),
            vec![&Record::Warning {
                time: 0.5,
                outcome: Outcome::ConvergenceFailures,
                code: -5,
                retries: 1
            }]
        );
        assert_eq!(
            recorder.records()[2],
            Record::Root {
                time: 0.7,
                roots: vec![0, 2]
            }
        );
    }
}
