use log::trace;

use crate::{callback::Callback, extension_error::ExtensionError, training_log::TrainingLog};

/// A set of callbacks sharing a joint context, invoked by the [`MainLoop`](crate::MainLoop) at certain stages of the training procedure.
///
/// All callbacks default to doing nothing, so implementors only need to override the ones they care about.
/// The main loop lends its [`TrainingLog`] to every callback; extensions never hold on to it.
///
/// `B` is the type of the batches the main loop feeds to its algorithm.
pub trait TrainingExtension<B>: Send {
    /// Name used in log messages and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// called before training is started
    fn before_training(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// called before starting an epoch
    fn before_epoch(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// called before `batch` is processed
    fn before_batch(&mut self, _log: &mut TrainingLog, _batch: &B) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// called after `batch` is processed. `log.status.iterations_done` already counts it
    fn after_batch(&mut self, _log: &mut TrainingLog, _batch: &B) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// called after an epoch is finished
    fn after_epoch(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// called after training is finished
    fn after_training(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// called when training is interrupted
    fn on_interrupt(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Run the callback `callback`.
    ///
    /// The default implementation invokes the matching method above. Implementors may override it to intercept
    /// callback invocations, e.g. to skip them when some condition does not hold (see [`SimpleExtension`](crate::simple_extension::SimpleExtension)).
    ///
    /// # Errors
    /// * returns an error of kind [`MissingBatch`](crate::extension_error::ExtensionErrorKind::MissingBatch) if `callback` [takes a batch](Callback::takes_batch) and `batch` is `None`
    /// * propagates any error returned by the invoked callback
    fn dispatch(
        &mut self,
        callback: Callback,
        log: &mut TrainingLog,
        batch: Option<&B>,
    ) -> Result<(), ExtensionError> {
        trace!("{} running callback {}", self.name(), callback);
        let result = match callback {
            Callback::BeforeTraining => self.before_training(log),
            Callback::BeforeEpoch => self.before_epoch(log),
            Callback::BeforeBatch => match batch {
                Some(batch) => self.before_batch(log, batch),
                None => Err(ExtensionError::missing_batch(callback)),
            },
            Callback::AfterBatch => match batch {
                Some(batch) => self.after_batch(log, batch),
                None => Err(ExtensionError::missing_batch(callback)),
            },
            Callback::AfterEpoch => self.after_epoch(log),
            Callback::AfterTraining => self.after_training(log),
            Callback::OnInterrupt => self.on_interrupt(log),
        };
        result.map_err(|e| e.with_extension(self.name()))
    }

    /// Look up a callback by its snake_case name and [`dispatch`](TrainingExtension::dispatch) it.
    ///
    /// # Errors
    /// returns an error of kind [`UnknownCallback`](crate::extension_error::ExtensionErrorKind::UnknownCallback) if no callback has that name,
    /// otherwise any error returned by [`dispatch`](TrainingExtension::dispatch)
    fn dispatch_named(
        &mut self,
        callback_name: &str,
        log: &mut TrainingLog,
        batch: Option<&B>,
    ) -> Result<(), ExtensionError> {
        let callback = Callback::from_name(callback_name).map_err(|e| e.with_extension(self.name()))?;
        self.dispatch(callback, log, batch)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::extension_error::ExtensionErrorKind;
    use test_log::test;

    #[derive(Default)]
    struct CallRecorder {
        calls: Vec<(Callback, Option<u32>)>,
    }

    impl TrainingExtension<u32> for CallRecorder {
        fn name(&self) -> &str {
            "CallRecorder"
        }

        fn before_epoch(&mut self, _log: &mut TrainingLog) -> Result<(), ExtensionError> {
            self.calls.push((Callback::BeforeEpoch, None));
            Ok(())
        }

        fn after_batch(&mut self, _log: &mut TrainingLog, batch: &u32) -> Result<(), ExtensionError> {
            self.calls.push((Callback::AfterBatch, Some(*batch)));
            Ok(())
        }

        fn on_interrupt(&mut self, log: &mut TrainingLog) -> Result<(), ExtensionError> {
            log.current_row().insert("interrupted", true);
            self.calls.push((Callback::OnInterrupt, None));
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_invokes_matching_method() {
        let mut recorder = CallRecorder::default();
        let mut log = TrainingLog::new();
        recorder.dispatch(Callback::BeforeEpoch, &mut log, None).unwrap();
        recorder.dispatch(Callback::AfterBatch, &mut log, Some(&7)).unwrap();
        recorder.dispatch(Callback::OnInterrupt, &mut log, None).unwrap();
        // not overridden, so these are no-ops
        recorder.dispatch(Callback::AfterEpoch, &mut log, None).unwrap();
        recorder.dispatch(Callback::BeforeBatch, &mut log, Some(&8)).unwrap();

        assert_eq!(
            recorder.calls,
            vec![
                (Callback::BeforeEpoch, None),
                (Callback::AfterBatch, Some(7)),
                (Callback::OnInterrupt, None)
            ]
        );
        assert!(log.current_row().get("interrupted").is_some());
    }

    #[test]
    fn test_dispatch_named() {
        let mut recorder = CallRecorder::default();
        let mut log = TrainingLog::new();
        recorder
            .dispatch_named("after_batch", &mut log, Some(&3))
            .unwrap();
        assert_eq!(recorder.calls, vec![(Callback::AfterBatch, Some(3))]);
    }

    #[test]
    fn test_dispatch_named_unknown() {
        let mut recorder = CallRecorder::default();
        let mut log = TrainingLog::new();
        let err = recorder
            .dispatch_named("after_batches", &mut log, None)
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ExtensionErrorKind::UnknownCallback("after_batches".to_string())
        );
        assert_eq!(err.extension(), Some("CallRecorder"));
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn test_batch_callback_without_batch() {
        let mut recorder = CallRecorder::default();
        let mut log = TrainingLog::new();
        let err = recorder
            .dispatch(Callback::AfterBatch, &mut log, None)
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ExtensionErrorKind::MissingBatch(Callback::AfterBatch)
        );
        assert!(recorder.calls.is_empty());
    }
}
