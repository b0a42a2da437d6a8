#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use trainhook::{
    simple_extension::{Action, Invocation},
    Algorithm, AlgorithmError, Callback, ExtensionError, LogRow, LogValue, TrainingExtension,
    TrainingLog,
};

/// One call to [`RecordingAction::perform`]: the callback, the batch, the condition arguments, and the counters at that moment
#[derive(Debug, Clone, PartialEq)]
pub struct Performed {
    pub callback: Callback,
    pub batch: Option<u32>,
    pub arguments: Vec<LogValue>,
    pub epochs_done: usize,
    pub iterations_done: usize,
}

/// An action that records every call, readable through the shared handle after the extension has been moved into a main loop
#[derive(Clone, Default)]
pub struct RecordingAction {
    pub performed: Arc<Mutex<Vec<Performed>>>,
}

impl RecordingAction {
    pub fn new() -> Self {
        RecordingAction::default()
    }

    pub fn performed(&self) -> Vec<Performed> {
        self.performed.lock().unwrap().clone()
    }
}

impl Action<u32> for RecordingAction {
    fn name(&self) -> &str {
        "RecordingAction"
    }

    fn perform(
        &mut self,
        which_callback: Callback,
        invocation: Invocation<'_, u32>,
    ) -> Result<(), ExtensionError> {
        self.performed.lock().unwrap().push(Performed {
            callback: which_callback,
            batch: invocation.batch().copied(),
            arguments: invocation.arguments().to_vec(),
            epochs_done: invocation.log().status.epochs_done,
            iterations_done: invocation.log().status.iterations_done,
        });
        Ok(())
    }
}

/// An extension that records every callback it receives, without any conditions
#[derive(Clone, Default)]
pub struct CallbackLog {
    pub callbacks: Arc<Mutex<Vec<Callback>>>,
}

impl CallbackLog {
    pub fn received(&self) -> Vec<Callback> {
        self.callbacks.lock().unwrap().clone()
    }
}

impl TrainingExtension<u32> for CallbackLog {
    fn name(&self) -> &str {
        "CallbackLog"
    }

    fn dispatch(
        &mut self,
        callback: Callback,
        _log: &mut TrainingLog,
        _batch: Option<&u32>,
    ) -> Result<(), ExtensionError> {
        self.callbacks.lock().unwrap().push(callback);
        Ok(())
    }
}

/// Logs each batch as `value`, and fails on the batch `fail_on`, if set
pub struct TestAlgorithm {
    pub fail_on: Option<u32>,
}

impl TestAlgorithm {
    pub fn new() -> Self {
        TestAlgorithm { fail_on: None }
    }

    pub fn failing_on(batch: u32) -> Self {
        TestAlgorithm {
            fail_on: Some(batch),
        }
    }
}

impl Algorithm<u32> for TestAlgorithm {
    fn process_batch(&mut self, batch: &u32) -> Result<LogRow, AlgorithmError> {
        if self.fail_on == Some(*batch) {
            return Err(format!("batch {} is poisoned", batch).into());
        }
        let mut records = LogRow::new();
        records.insert("value", *batch as i64);
        Ok(records)
    }
}
