use std::fmt;

use log::{debug, trace};

use crate::{
    callback::Callback,
    extension_error::ExtensionError,
    training_extension::TrainingExtension,
    training_log::{LogValue, TrainingLog},
};

/// A function of the main loop's log, returning `true` when a [`Condition`] holds
pub type Predicate = Box<dyn Fn(&TrainingLog) -> bool + Send>;

/// When an [`Action`] should be performed: during which callback, under which predicate, and with which additional arguments.
pub struct Condition {
    callback: Callback,
    predicate: Predicate,
    arguments: Vec<LogValue>,
}

impl Condition {
    /// the callback during which the condition is checked
    pub fn callback(&self) -> Callback {
        self.callback
    }

    /// the additional arguments passed to [`Action::perform`] when the condition holds
    pub fn arguments(&self) -> &[LogValue] {
        &self.arguments
    }

    /// true if `callback_invoked` is this condition's callback and its predicate holds for `log`
    pub fn is_satisfied(&self, callback_invoked: Callback, log: &TrainingLog) -> bool {
        self.callback == callback_invoked && (self.predicate)(log)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Condition")
            .field("callback", &self.callback)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Shorthands for the most common conditions, used by [`SimpleExtension::new`].
///
/// All triggers compare counters for exact equality, so `after_n_batches: Some(5)` fires on the after_batch callback where
/// `iterations_done == 5`, and never again after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConditionOptions {
    /// trigger on `before_epoch` when no epoch has been completed yet
    pub before_first_epoch: bool,
    /// trigger on every `after_epoch`
    pub after_every_epoch: bool,
    /// trigger on every `after_batch`
    pub after_every_batch: bool,
    /// trigger on `after_training`
    pub after_training: bool,
    /// trigger on `after_epoch` once exactly this many epochs are done. `Some(0)` is treated as `None`
    pub after_n_epochs: Option<usize>,
    /// trigger on `after_batch` once exactly this many batches are done. `Some(0)` is treated as `None`
    pub after_n_batches: Option<usize>,
}

/// What a [`SimpleExtension`] does when more than one of its conditions holds during the same callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FiringPolicy {
    /// perform the action once for every satisfied condition, in registration order
    #[default]
    AllMatches,
    /// perform the action only for the first satisfied condition
    FirstMatch,
}

/// The arguments of a single [`Action::perform`] call.
///
/// The arguments from the main loop (the batch, for batch callbacks) come first, followed by the additional arguments of the condition that triggered the call.
pub struct Invocation<'a, B> {
    log: &'a mut TrainingLog,
    batch: Option<&'a B>,
    arguments: &'a [LogValue],
}

impl<'a, B> Invocation<'a, B> {
    /// the main loop's log
    pub fn log(&self) -> &TrainingLog {
        &*self.log
    }

    /// the main loop's log, for actions that write to it
    pub fn log_mut(&mut self) -> &mut TrainingLog {
        &mut *self.log
    }

    /// the batch passed by the main loop, for `before_batch` and `after_batch`
    pub fn batch(&self) -> Option<&'a B> {
        self.batch
    }

    /// the additional arguments registered with the triggering condition
    pub fn arguments(&self) -> &'a [LogValue] {
        self.arguments
    }
}

/// The job of a [`SimpleExtension`].
pub trait Action<B>: Send {
    /// Name used in log messages and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Do the job. Called once per satisfied condition, with the callback in the context of which it is run.
    fn perform(
        &mut self,
        which_callback: Callback,
        invocation: Invocation<'_, B>,
    ) -> Result<(), ExtensionError>;
}

/// An extension whose logic is concentrated in a single [`Action`], performed whenever one of its [conditions](Condition) holds.
///
/// Conditions are set up from [`ConditionOptions`] at construction, and more can be added with [`add_condition`](SimpleExtension::add_condition).
/// Conditions can only be added, never removed.
///
/// # Example
/// ```
/// use trainhook::{Callback, TrainingLog, TrainingExtension};
/// use trainhook::simple_extension::{Action, ConditionOptions, Invocation, SimpleExtension};
/// # use trainhook::ExtensionError;
///
/// struct CountCalls(usize);
/// impl Action<()> for CountCalls {
///     fn perform(&mut self, _which: Callback, _invocation: Invocation<'_, ()>) -> Result<(), ExtensionError> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
///
/// let mut extension = SimpleExtension::new(
///     CountCalls(0),
///     ConditionOptions { after_every_epoch: true, ..Default::default() },
/// );
/// let mut log = TrainingLog::new();
/// for _ in 0..3 {
///     extension.dispatch(Callback::AfterEpoch, &mut log, None)?;
/// }
/// extension.dispatch(Callback::AfterTraining, &mut log, None)?;
/// assert_eq!(extension.action().0, 3);
/// # Ok::<(), ExtensionError>(())
/// ```
pub struct SimpleExtension<A> {
    action: A,
    conditions: Vec<Condition>,
    policy: FiringPolicy,
}

impl<A> SimpleExtension<A> {
    /// Create a new extension performing `action` under the conditions described by `options`
    pub fn new(action: A, options: ConditionOptions) -> Self {
        let mut extension = SimpleExtension {
            action,
            conditions: Vec::new(),
            policy: FiringPolicy::default(),
        };
        if options.before_first_epoch {
            extension.add_condition(
                Callback::BeforeEpoch,
                Some(Box::new(|log: &TrainingLog| log.status.epochs_done == 0)),
                None,
            );
        }
        if options.after_every_epoch {
            extension.add_condition(Callback::AfterEpoch, None, None);
        }
        if options.after_every_batch {
            extension.add_condition(Callback::AfterBatch, None, None);
        }
        if options.after_training {
            extension.add_condition(Callback::AfterTraining, None, None);
        }
        if let Some(n) = options.after_n_epochs.filter(|&n| n > 0) {
            extension.add_condition(
                Callback::AfterEpoch,
                Some(Box::new(move |log: &TrainingLog| log.status.epochs_done == n)),
                None,
            );
        }
        if let Some(n) = options.after_n_batches.filter(|&n| n > 0) {
            extension.add_condition(
                Callback::AfterBatch,
                Some(Box::new(move |log: &TrainingLog| {
                    log.status.iterations_done == n
                })),
                None,
            );
        }
        extension
    }

    /// Set how simultaneously satisfied conditions are handled. Defaults to [`FiringPolicy::AllMatches`]
    pub fn with_policy(mut self, policy: FiringPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a condition under which the action is performed.
    ///
    /// If `predicate` is `None` the condition holds on every invocation of `callback`.
    /// `arguments` are passed to [`Action::perform`] after the ones from the main loop.
    pub fn add_condition(
        &mut self,
        callback: Callback,
        predicate: Option<Predicate>,
        arguments: Option<Vec<LogValue>>,
    ) -> &mut Self {
        let predicate: Predicate = match predicate {
            Some(predicate) => predicate,
            None => Box::new(|_: &TrainingLog| true),
        };
        self.conditions.push(Condition {
            callback,
            predicate,
            arguments: arguments.unwrap_or_default(),
        });
        self
    }

    /// Add a condition for the callback called `callback_name`, see [`add_condition`](SimpleExtension::add_condition)
    ///
    /// # Errors
    /// returns an error of kind [`UnknownCallback`](crate::extension_error::ExtensionErrorKind::UnknownCallback) if `callback_name` is not a lifecycle callback.
    /// No condition is added in that case.
    pub fn add_named_condition(
        &mut self,
        callback_name: &str,
        predicate: Option<Predicate>,
        arguments: Option<Vec<LogValue>>,
    ) -> Result<&mut Self, ExtensionError> {
        let callback = Callback::from_name(callback_name)?;
        Ok(self.add_condition(callback, predicate, arguments))
    }

    /// The conditions, in the order they are checked
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// How the extension handles several conditions holding at once
    pub fn policy(&self) -> FiringPolicy {
        self.policy
    }

    /// The action performed when a condition holds
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Mutable access to the action
    pub fn action_mut(&mut self) -> &mut A {
        &mut self.action
    }

    /// Consume the extension, returning its action
    pub fn into_action(self) -> A {
        self.action
    }
}

impl<B, A: Action<B>> TrainingExtension<B> for SimpleExtension<A> {
    fn name(&self) -> &str {
        self.action.name()
    }

    /// Check the conditions in registration order and perform the action for each one that holds.
    fn dispatch(
        &mut self,
        callback_invoked: Callback,
        log: &mut TrainingLog,
        batch: Option<&B>,
    ) -> Result<(), ExtensionError> {
        if callback_invoked.takes_batch() && batch.is_none() {
            return Err(ExtensionError::missing_batch(callback_invoked).with_extension(self.action.name()));
        }
        for (index, condition) in self.conditions.iter().enumerate() {
            if !condition.is_satisfied(callback_invoked, log) {
                trace!(
                    "{}: condition {} does not hold during {}",
                    self.action.name(),
                    index,
                    callback_invoked
                );
                continue;
            }
            debug!(
                "{}: condition {} triggered during {}",
                self.action.name(),
                index,
                callback_invoked
            );
            let invocation = Invocation {
                log: &mut *log,
                batch,
                arguments: &condition.arguments,
            };
            self.action
                .perform(callback_invoked, invocation)
                .map_err(|e| e.with_extension(self.action.name()))?;
            if self.policy == FiringPolicy::FirstMatch {
                break;
            }
        }
        Ok(())
    }
}
