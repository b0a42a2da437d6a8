#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Lifecycle extensions for machine-learning training loops.
//!
//! The `trainhook` crate lets you attach behaviour to the stages of a training run without touching the training loop itself.
//!
//! The [training_extension] module contains the [`TrainingExtension`] trait: a set of callbacks invoked before and after training,
//! each epoch, and each batch, plus one invoked when training is interrupted. The host loop calls a single entry point,
//! [`TrainingExtension::dispatch`], with the [`Callback`] being run.
//!
//! The [simple_extension] module decouples *when* to act from *what* to do: a [`SimpleExtension`](simple_extension::SimpleExtension)
//! holds an ordered list of conditions (a callback, a predicate over the [`TrainingLog`], and extra arguments) and performs its
//! [`Action`](simple_extension::Action) once per condition that holds.
//! Ready-made extensions live in [extensions].
//!
//! The crate also contains the [`MainLoop`] struct, a minimal host that feeds batches to an [`Algorithm`] and runs its extensions.
//! The training algorithm itself is up to you.
//!
//! # Examples
//! Stop after two epochs and print a report before the first epoch, after every epoch, and after training:
//! ```
//! use trainhook::{Algorithm, AlgorithmError, LogRow, MainLoop, MainLoopOptions};
//! use trainhook::extensions::{FinishAfter, Printing};
//! use trainhook::simple_extension::ConditionOptions;
//!
//! // an algorithm that only logs the size of each batch
//! struct CountFeatures;
//! impl Algorithm<Vec<f64>> for CountFeatures {
//!     fn process_batch(&mut self, batch: &Vec<f64>) -> Result<LogRow, AlgorithmError> {
//!         let mut records = LogRow::new();
//!         records.insert("batch_size", batch.len());
//!         Ok(records)
//!     }
//! }
//!
//! let batches = vec![vec![1.0, 2.0], vec![3.0], vec![4.0, 5.0, 6.0]];
//! let mut main_loop = MainLoop::new(batches, CountFeatures, MainLoopOptions::default());
//! main_loop
//!     .add_extension(FinishAfter::new(ConditionOptions { after_n_epochs: Some(2), ..Default::default() }))
//!     .add_extension(Printing::new());
//! main_loop.run()?;
//!
//! assert_eq!(main_loop.log().status.epochs_done, 2);
//! assert_eq!(main_loop.log().status.iterations_done, 6);
//! # Ok::<(), trainhook::MainLoopError>(())
//! ```

/// Contains the [`Callback`] enum naming the stages of the training procedure.
pub mod callback;
/// Errors raised by extensions.
pub mod extension_error;
/// Ready-made extensions.
pub mod extensions;
/// Contains the [`MainLoop`] struct, which runs an [`Algorithm`] over batches and dispatches callbacks to extensions.
pub mod main_loop;
/// Options for running a [`MainLoop`].
pub mod main_loop_options;
/// Condition-triggered extensions.
pub mod simple_extension;
/// Provides the trait implemented by every extension.
pub mod training_extension;
/// The log shared by the main loop and its extensions.
pub mod training_log;

pub use callback::Callback;
pub use extension_error::{ExtensionError, ExtensionErrorKind};
pub use main_loop::{
    main_loop_error::{AlgorithmError, MainLoopError, MainLoopErrorKind},
    Algorithm, MainLoop,
};
pub use main_loop_options::{MainLoopOptions, MainLoopOptionsError};
pub use training_extension::TrainingExtension;
pub use training_log::{LogRow, LogValue, TrainingLog, TrainingStatus};
