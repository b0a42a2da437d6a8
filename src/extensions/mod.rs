//! Ready-made extensions.
//!
//! [`FinishAfter`] and [`Printing`] are [`SimpleExtension`](crate::simple_extension::SimpleExtension) actions, triggered by conditions.
//! [`Timing`] and [`ProgressBar`] are plain [`TrainingExtension`](crate::training_extension::TrainingExtension)s that run on every callback they implement.

mod finish_after;
mod printing;
mod progress_bar;
mod timing;

pub use finish_after::FinishAfter;
pub use printing::Printing;
pub use progress_bar::ProgressBar;
pub use timing::Timing;
