use std::fmt;

/// Used by the [`MainLoop`](crate::MainLoop) to determine how batches are fed to the algorithm.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MainLoopOptions {
    /// stop after this many epochs even if no extension asked for it. If `None`, the loop runs until an extension requests the end of training
    pub max_epochs: Option<usize>,
    /// whether to process the batches in a new random order every epoch
    pub shuffle: bool,
    /// seed for the shuffling order, for reproducible runs. Random if not set
    pub seed: Option<u64>,
}

impl MainLoopOptions {
    /// Create a new MainLoopOptions struct with the given parameters.
    /// # Errors
    /// Returns a [`MainLoopOptionsError`] if...
    /// * `max_epochs` is `Some(0)`,
    /// * `seed` is set but `shuffle` is false.
    pub fn new(
        max_epochs: Option<usize>,
        shuffle: bool,
        seed: Option<u64>,
    ) -> Result<Self, MainLoopOptionsError> {
        if max_epochs == Some(0) {
            return Err(MainLoopOptionsError::ZeroMaxEpochs);
        }
        if seed.is_some() && !shuffle {
            return Err(MainLoopOptionsError::SeedWithoutShuffle);
        }
        Ok(MainLoopOptions {
            max_epochs,
            shuffle,
            seed,
        })
    }
}

/// Errors that can occur when creating a new MainLoopOptions struct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainLoopOptionsError {
    /// The epoch limit was zero, so no batch would ever be processed
    ZeroMaxEpochs,
    /// A shuffle seed was provided, but shuffling was not enabled
    SeedWithoutShuffle,
}

impl fmt::Display for MainLoopOptionsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MainLoopOptionsError::ZeroMaxEpochs => write!(f, "max_epochs must be at least 1"),
            MainLoopOptionsError::SeedWithoutShuffle => {
                write!(f, "a shuffle seed was given, but shuffling is disabled")
            }
        }
    }
}

impl std::error::Error for MainLoopOptionsError {}
