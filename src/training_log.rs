use std::{collections::BTreeMap, fmt};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The attribute of a [`LogRow`] through which extensions ask the main loop to stop training
pub const TRAINING_FINISH_REQUESTED: &str = "training_finish_requested";

/// Attributes whose names start with an underscore are internal bookkeeping, and are hidden from reports such as [`Printing`](crate::extensions::Printing)
pub fn is_private_attribute(name: &str) -> bool {
    name.starts_with('_')
}

/// A single value recorded in a [`LogRow`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogValue {
    /// a flag, such as [`TRAINING_FINISH_REQUESTED`]
    Bool(bool),
    /// a count
    Int(i64),
    /// a measurement, such as a loss or a duration in seconds
    Float(f64),
    /// anything else
    Text(String),
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogValue::Bool(value) => write!(f, "{}", value),
            LogValue::Int(value) => write!(f, "{}", value),
            LogValue::Float(value) => write!(f, "{}", value),
            LogValue::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<bool> for LogValue {
    fn from(value: bool) -> Self {
        LogValue::Bool(value)
    }
}

impl From<i64> for LogValue {
    fn from(value: i64) -> Self {
        LogValue::Int(value)
    }
}

/// Values above `i64::MAX` saturate
impl From<usize> for LogValue {
    fn from(value: usize) -> Self {
        LogValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        LogValue::Float(value)
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        LogValue::Text(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        LogValue::Text(value)
    }
}

/// The records logged during a single iteration of the main loop, stored as named attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRow {
    records: FxHashMap<String, LogValue>,
}

impl LogRow {
    /// Create an empty row
    pub fn new() -> Self {
        LogRow::default()
    }

    /// Look up an attribute by name
    pub fn get(&self, name: &str) -> Option<&LogValue> {
        self.records.get(name)
    }

    /// Set the attribute `name`, returning the value it replaced, if any
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<LogValue>) -> Option<LogValue> {
        self.records.insert(name.into(), value.into())
    }

    /// Copy every attribute of `other` into this row, overwriting attributes with the same name
    pub fn extend(&mut self, other: LogRow) {
        self.records.extend(other.records);
    }

    /// All attributes of the row, including private ones, sorted by name
    pub fn attributes(&self) -> Vec<(&str, &LogValue)> {
        let mut attributes: Vec<(&str, &LogValue)> = self
            .records
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        attributes.sort_by(|a, b| a.0.cmp(b.0));
        attributes
    }

    /// Number of attributes in the row
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the row holds no attributes
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ask the main loop to stop training at its next check
    pub fn request_training_finish(&mut self) {
        self.insert(TRAINING_FINISH_REQUESTED, true);
    }

    /// true if [`TRAINING_FINISH_REQUESTED`] is set to `true` in this row
    pub fn training_finish_requested(&self) -> bool {
        matches!(self.get(TRAINING_FINISH_REQUESTED), Some(LogValue::Bool(true)))
    }
}

/// The progress of the training procedure.
///
/// Fields whose attribute names start with an underscore are bookkeeping for the main loop (see [`is_private_attribute`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingStatus {
    /// number of batches processed so far, across all epochs
    pub iterations_done: usize,
    /// number of epochs completed so far
    pub epochs_done: usize,
    /// the value of `iterations_done` at the end of each completed epoch
    #[serde(rename = "_epoch_ends")]
    pub epoch_ends: Vec<usize>,
    /// true between the `before_epoch` and `after_epoch` callbacks
    #[serde(rename = "_epoch_started")]
    pub epoch_started: bool,
    /// true once the `before_training` callback has been dispatched
    #[serde(rename = "_training_started")]
    pub training_started: bool,
}

impl TrainingStatus {
    /// The status as named attributes, in a fixed order
    pub fn attributes(&self) -> Vec<(&'static str, LogValue)> {
        vec![
            ("iterations_done", self.iterations_done.into()),
            ("epochs_done", self.epochs_done.into()),
            ("_epoch_ends", format!("{:?}", self.epoch_ends).into()),
            ("_epoch_started", self.epoch_started.into()),
            ("_training_started", self.training_started.into()),
        ]
    }

    /// Number of batches in the most recently completed epoch, if any epoch has completed
    pub fn last_epoch_length(&self) -> Option<usize> {
        let last = *self.epoch_ends.last()?;
        let previous = if self.epoch_ends.len() > 1 {
            self.epoch_ends[self.epoch_ends.len() - 2]
        } else {
            0
        };
        Some(last - previous)
    }
}

/// The log of a training run: the [`TrainingStatus`] and one [`LogRow`] per iteration.
///
/// The row for iteration `i` holds the records written once `i` batches have been processed,
/// so the row for iteration 0 holds anything logged before the first batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    /// counters and flags kept by the main loop
    pub status: TrainingStatus,
    rows: BTreeMap<usize, LogRow>,
}

impl TrainingLog {
    /// Create an empty log for a run that has not started
    pub fn new() -> Self {
        TrainingLog::default()
    }

    /// The row for the current iteration, created empty if nothing was logged in it yet
    pub fn current_row(&mut self) -> &mut LogRow {
        self.rows.entry(self.status.iterations_done).or_default()
    }

    /// The row for the current iteration, if anything was logged in it
    pub fn peek_current_row(&self) -> Option<&LogRow> {
        self.rows.get(&self.status.iterations_done)
    }

    /// The row for the iteration before the current one. `None` before the first batch is processed
    pub fn previous_row(&self) -> Option<&LogRow> {
        let previous = self.status.iterations_done.checked_sub(1)?;
        self.rows.get(&previous)
    }

    /// The row of `iteration`, if anything was logged there
    pub fn row(&self, iteration: usize) -> Option<&LogRow> {
        self.rows.get(&iteration)
    }

    /// Iterates over the logged rows in iteration order
    pub fn rows(&self) -> impl Iterator<Item = (usize, &LogRow)> {
        self.rows.iter().map(|(iteration, row)| (*iteration, row))
    }

    /// true if an extension requested the end of training in the current row
    pub fn training_finish_requested(&self) -> bool {
        self.peek_current_row()
            .is_some_and(|row| row.training_finish_requested())
    }
}
