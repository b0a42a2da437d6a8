use log::{debug, trace, warn};
use rand::{rngs::StdRng, SeedableRng};
use shuffle::{fy, shuffler::Shuffler};

use crate::{
    callback::Callback,
    main_loop_options::MainLoopOptions,
    training_extension::TrainingExtension,
    training_log::{LogRow, TrainingLog},
};

/// Errors returned by [`MainLoop::run`]
pub mod main_loop_error;
use main_loop_error::{AlgorithmError, MainLoopError, MainLoopErrorKind};

/// The work done on each batch. The main loop has no idea what that work is; it only records what the algorithm reports.
pub trait Algorithm<B>: Send {
    /// Process a single batch, returning the records to log for this iteration
    ///
    /// # Errors
    /// any error interrupts training: the main loop runs the `on_interrupt` callback of every extension and returns the error
    fn process_batch(&mut self, batch: &B) -> Result<LogRow, AlgorithmError>;
}

/// Feeds batches to an [`Algorithm`] epoch after epoch, running the callbacks of its extensions along the way.
///
/// Extensions are run in the order they were added. Training stops when an extension requests it through the log
/// (see [`LogRow::request_training_finish`] and [`FinishAfter`](crate::extensions::FinishAfter)), or after
/// [`max_epochs`](MainLoopOptions::max_epochs) epochs. The request is checked after each callback of the `before_training`,
/// `before_epoch`, `before_batch`, `after_batch` and `after_epoch` stages; when it comes in the middle of an epoch, that epoch
/// is left unfinished and its `after_epoch` callback is not run.
pub struct MainLoop<B> {
    batches: Vec<B>,
    algorithm: Box<dyn Algorithm<B>>,
    extensions: Vec<Box<dyn TrainingExtension<B>>>,
    log: TrainingLog,
    options: MainLoopOptions,
}

impl<B> MainLoop<B> {
    /// Create a main loop running `algorithm` over `batches` once per epoch
    pub fn new<A: Algorithm<B> + 'static>(
        batches: Vec<B>,
        algorithm: A,
        options: MainLoopOptions,
    ) -> Self {
        MainLoop {
            batches,
            algorithm: Box::new(algorithm),
            extensions: Vec::new(),
            log: TrainingLog::new(),
            options,
        }
    }

    /// Add an extension, to be run after the ones already added
    pub fn add_extension<E: TrainingExtension<B> + 'static>(&mut self, extension: E) -> &mut Self {
        self.extensions.push(Box::new(extension));
        self
    }

    /// Builder form of [`add_extension`](MainLoop::add_extension)
    pub fn with_extension<E: TrainingExtension<B> + 'static>(mut self, extension: E) -> Self {
        self.add_extension(extension);
        self
    }

    /// Names of the extensions, in the order they are run
    pub fn extension_names(&self) -> Vec<&str> {
        self.extensions.iter().map(|extension| extension.name()).collect()
    }

    /// The log of the run so far
    pub fn log(&self) -> &TrainingLog {
        &self.log
    }

    /// Consume the main loop, keeping its log
    pub fn into_log(self) -> TrainingLog {
        self.log
    }

    /// Run the training procedure.
    ///
    /// # Errors
    /// returns a [`MainLoopError`] if an extension fails while handling a callback, or if the algorithm fails to process a batch.
    /// The `on_interrupt` callbacks are run before returning an algorithm error.
    pub fn run(&mut self) -> Result<(), MainLoopError> {
        let MainLoop {
            batches,
            algorithm,
            extensions,
            log,
            options,
        } = self;

        let mut randomness = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut fys = fy::FisherYates::default();
        let mut order: Vec<usize> = (0..batches.len()).collect();

        debug!(
            "starting main loop with {} batches per epoch and {} extensions",
            batches.len(),
            extensions.len()
        );
        log.status.training_started = true;
        dispatch_all(extensions, log, Callback::BeforeTraining, None)?;

        'training: loop {
            if finish_requested(log) {
                break;
            }
            if let Some(max_epochs) = options.max_epochs {
                if log.status.epochs_done >= max_epochs {
                    debug!("reached the limit of {} epochs", max_epochs);
                    break;
                }
            }
            if options.shuffle {
                fys.shuffle(&mut order, &mut randomness)
                    .map_err(|e| error_at(log, MainLoopErrorKind::Shuffle(e.to_string())))?;
            }

            log.status.epoch_started = true;
            dispatch_all(extensions, log, Callback::BeforeEpoch, None)?;
            if finish_requested(log) {
                break;
            }

            for &index in order.iter() {
                let batch = &batches[index];
                dispatch_all(extensions, log, Callback::BeforeBatch, Some(batch))?;
                if finish_requested(log) {
                    break 'training;
                }

                let records = match algorithm.process_batch(batch) {
                    Ok(records) => records,
                    Err(e) => {
                        warn!(
                            "algorithm failed after {} iterations, interrupting training",
                            log.status.iterations_done
                        );
                        interrupt_all(extensions, log);
                        return Err(error_at(log, MainLoopErrorKind::Algorithm(e)));
                    }
                };
                log.status.iterations_done += 1;
                log.current_row().extend(records);

                dispatch_all(extensions, log, Callback::AfterBatch, Some(batch))?;
                if finish_requested(log) {
                    break 'training;
                }
            }

            log.status.epochs_done += 1;
            log.status.epoch_ends.push(log.status.iterations_done);
            log.status.epoch_started = false;
            dispatch_all(extensions, log, Callback::AfterEpoch, None)?;
        }

        dispatch_all(extensions, log, Callback::AfterTraining, None)?;
        debug!(
            "main loop finished after {} epochs and {} iterations",
            log.status.epochs_done, log.status.iterations_done
        );
        Ok(())
    }
}

fn finish_requested(log: &TrainingLog) -> bool {
    let requested = log.training_finish_requested();
    if requested {
        debug!(
            "training finish requested at iteration {}",
            log.status.iterations_done
        );
    }
    requested
}

fn error_at(log: &TrainingLog, kind: MainLoopErrorKind) -> MainLoopError {
    let epoch = if log.status.epoch_started {
        log.status.epochs_done + 1
    } else {
        log.status.epochs_done
    };
    MainLoopError {
        kind,
        epoch,
        iteration: log.status.iterations_done,
    }
}

fn dispatch_all<B>(
    extensions: &mut [Box<dyn TrainingExtension<B>>],
    log: &mut TrainingLog,
    callback: Callback,
    batch: Option<&B>,
) -> Result<(), MainLoopError> {
    trace!("running {} for {} extensions", callback, extensions.len());
    for extension in extensions.iter_mut() {
        if let Err(e) = extension.dispatch(callback, log, batch) {
            return Err(error_at(log, MainLoopErrorKind::Extension(e)));
        }
    }
    Ok(())
}

/// Runs `on_interrupt` on every extension. Failures are logged and do not stop the other extensions
fn interrupt_all<B>(extensions: &mut [Box<dyn TrainingExtension<B>>], log: &mut TrainingLog) {
    for extension in extensions.iter_mut() {
        if let Err(e) = extension.dispatch(Callback::OnInterrupt, log, None) {
            warn!("{} failed to handle the interrupt: {}", extension.name(), e);
        }
    }
}
