use crate::{
    callback::Callback,
    extension_error::ExtensionError,
    simple_extension::{Action, ConditionOptions, Invocation, SimpleExtension},
};

/// Finishes the training process when triggered, by setting
/// [`training_finish_requested`](crate::training_log::TRAINING_FINISH_REQUESTED) in the current log row.
///
/// The request is just a flag: stopping is left to the main loop, which checks it after every batch and epoch.
#[derive(Debug, Default)]
pub struct FinishAfter {
    _private: (),
}

impl FinishAfter {
    /// Create an extension requesting the end of training whenever one of the conditions in `options` holds
    pub fn new(options: ConditionOptions) -> SimpleExtension<FinishAfter> {
        SimpleExtension::new(FinishAfter::default(), options)
    }
}

impl<B> Action<B> for FinishAfter {
    fn name(&self) -> &str {
        "FinishAfter"
    }

    fn perform(
        &mut self,
        _which_callback: Callback,
        mut invocation: Invocation<'_, B>,
    ) -> Result<(), ExtensionError> {
        invocation.log_mut().current_row().request_training_finish();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{training_extension::TrainingExtension, training_log::TrainingLog};

    fn dispatch(
        extension: &mut SimpleExtension<FinishAfter>,
        callback: Callback,
        log: &mut TrainingLog,
    ) {
        TrainingExtension::<()>::dispatch(extension, callback, log, None).unwrap();
    }

    #[test]
    fn test_after_training_requests_finish() {
        let mut extension = FinishAfter::new(ConditionOptions {
            after_training: true,
            ..Default::default()
        });
        let mut log = TrainingLog::new();
        dispatch(&mut extension, Callback::AfterEpoch, &mut log);
        assert!(!log.training_finish_requested());
        dispatch(&mut extension, Callback::AfterTraining, &mut log);
        assert!(log.current_row().training_finish_requested());
    }

    #[test]
    fn test_after_n_epochs_requests_finish_in_current_row() {
        let mut extension = FinishAfter::new(ConditionOptions {
            after_n_epochs: Some(2),
            ..Default::default()
        });
        let mut log = TrainingLog::new();
        log.status.epochs_done = 1;
        log.status.iterations_done = 10;
        dispatch(&mut extension, Callback::AfterEpoch, &mut log);
        assert!(!log.training_finish_requested());

        log.status.epochs_done = 2;
        log.status.iterations_done = 20;
        dispatch(&mut extension, Callback::AfterEpoch, &mut log);
        assert!(log.training_finish_requested());
        assert!(log.row(20).unwrap().training_finish_requested());
        assert!(log.row(10).is_none());
    }

    #[test]
    fn test_name() {
        let extension = FinishAfter::new(ConditionOptions::default());
        assert_eq!(TrainingExtension::<()>::name(&extension), "FinishAfter");
    }
}
