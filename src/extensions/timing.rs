use chrono::{DateTime, Local};
use log::debug;

use crate::{extension_error::ExtensionError, training_extension::TrainingExtension, training_log::TrainingLog};

/// Records how long each epoch, and the whole training run, took.
///
/// After every epoch the current log row gets an `epoch_took` attribute, and after training a `training_took` attribute, both in seconds.
#[derive(Debug, Default)]
pub struct Timing {
    training_started: Option<DateTime<Local>>,
    epoch_started: Option<DateTime<Local>>,
}

impl Timing {
    /// Create a new Timing extension
    pub fn new() -> Self {
        Timing::default()
    }
}

fn seconds_since(start: DateTime<Local>) -> f64 {
    let elapsed = Local::now() - start;
    match elapsed.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => elapsed.num_milliseconds() as f64 / 1_000.0,
    }
}

impl<B> TrainingExtension<B> for Timing {
    fn name(&self) -> &str {
        "Timing"
    }

    fn before_training(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
        self.training_started = Some(Local::now());
        Ok(())
    }

    fn before_epoch(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
        self.epoch_started = Some(Local::now());
        Ok(())
    }

    fn after_epoch(&mut self, log: &mut TrainingLog) -> Result<(), ExtensionError> {
        if let Some(start) = self.epoch_started.take() {
            let took = seconds_since(start);
            debug!("epoch {} took {}s", log.status.epochs_done, took);
            log.current_row().insert("epoch_took", took);
        }
        Ok(())
    }

    fn after_training(&mut self, log: &mut TrainingLog) -> Result<(), ExtensionError> {
        if let Some(start) = self.training_started.take() {
            log.current_row().insert("training_took", seconds_since(start));
        }
        Ok(())
    }
}
