use std::fmt;

use crate::extension_error::ExtensionError;

/// The error type of [`Algorithm::process_batch`](crate::main_loop::Algorithm::process_batch)
pub type AlgorithmError = Box<dyn std::error::Error + Send + Sync>;

/// Indicates that the main loop stopped because of an error
///
/// If displayed, this error will show the epoch and iteration at which the error was encountered, as well as the error that caused it.
#[derive(Debug)]
pub struct MainLoopError {
    /// what went wrong
    pub kind: MainLoopErrorKind,
    /// the epoch (one-indexed) during which the error was encountered. 0 if it happened before the first epoch started
    pub epoch: usize,
    /// the number of batches processed before the error was encountered
    pub iteration: usize,
}

/// What stopped the main loop
#[derive(Debug)]
pub enum MainLoopErrorKind {
    /// An extension failed while handling a callback
    Extension(ExtensionError),
    /// The algorithm failed to process a batch
    Algorithm(AlgorithmError),
    /// The batches could not be shuffled
    Shuffle(String),
}

impl fmt::Display for MainLoopError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cause = match &self.kind {
            MainLoopErrorKind::Extension(e) => e.to_string(),
            MainLoopErrorKind::Algorithm(e) => format!("algorithm error {}", e),
            MainLoopErrorKind::Shuffle(e) => format!("unable to shuffle batches: {}", e),
        };
        write!(
            f,
            "epoch {} iteration {} encountered error {}",
            self.epoch, self.iteration, cause
        )
    }
}

impl std::error::Error for MainLoopError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            MainLoopErrorKind::Extension(e) => Some(e),
            MainLoopErrorKind::Algorithm(e) => Some(e.as_ref()),
            MainLoopErrorKind::Shuffle(_) => None,
        }
    }
}
