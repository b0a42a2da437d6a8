use indicatif::{ProgressDrawTarget, ProgressStyle};

use crate::{extension_error::ExtensionError, training_extension::TrainingExtension, training_log::TrainingLog};

const BAR_TEMPLATE: &str =
    "[{elapsed_precise}] [{bar:40.green/white}] {human_pos}/{human_len} {per_sec} ({eta}) {msg}";
const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner} {human_pos} batches {per_sec} {msg}";

/// Draws a progress bar over the batches of each epoch.
///
/// The length of the bar is the number of batches per epoch when it is known up front, otherwise the length of the previous epoch.
/// The first epoch of a run with an unknown length gets a spinner instead.
#[derive(Debug)]
pub struct ProgressBar {
    batches_per_epoch: Option<u64>,
    hidden: bool,
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a progress bar drawn to stderr
    pub fn new(batches_per_epoch: Option<u64>) -> Self {
        ProgressBar {
            batches_per_epoch,
            hidden: false,
            bar: None,
        }
    }

    /// Create a progress bar that keeps count but never draws anything
    pub fn hidden(batches_per_epoch: Option<u64>) -> Self {
        ProgressBar {
            hidden: true,
            ..ProgressBar::new(batches_per_epoch)
        }
    }

    /// The position and length of the bar for the current epoch, if an epoch is in progress
    pub fn progress(&self) -> Option<(u64, Option<u64>)> {
        self.bar.as_ref().map(|bar| (bar.position(), bar.length()))
    }

    fn build_bar(&self, log: &TrainingLog) -> Result<indicatif::ProgressBar, ExtensionError> {
        let length = self
            .batches_per_epoch
            .or_else(|| log.status.last_epoch_length().map(|length| length as u64));
        let target = if self.hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let bar = indicatif::ProgressBar::with_draw_target(length, target);
        let style = match length {
            Some(_) => ProgressStyle::default_bar().template(BAR_TEMPLATE),
            None => ProgressStyle::default_spinner().template(SPINNER_TEMPLATE),
        }
        .map_err(|e| ExtensionError::failed(format!("invalid progress bar template: {}", e)))?;
        bar.set_style(style);
        bar.set_message(format!("epoch {}", log.status.epochs_done + 1));
        Ok(bar)
    }
}

impl<B> TrainingExtension<B> for ProgressBar {
    fn name(&self) -> &str {
        "ProgressBar"
    }

    fn before_epoch(&mut self, log: &mut TrainingLog) -> Result<(), ExtensionError> {
        self.bar = Some(self.build_bar(log)?);
        Ok(())
    }

    fn after_batch(&mut self, _log: &mut TrainingLog, _batch: &B) -> Result<(), ExtensionError> {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        Ok(())
    }

    fn after_epoch(&mut self, log: &mut TrainingLog) -> Result<(), ExtensionError> {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(format!("epoch {} done", log.status.epochs_done));
        }
        Ok(())
    }

    fn after_training(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
        // training can finish in the middle of an epoch
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        Ok(())
    }

    fn on_interrupt(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
        if let Some(bar) = self.bar.take() {
            bar.abandon_with_message("interrupted");
        }
        Ok(())
    }
}
