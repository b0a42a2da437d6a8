use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::extension_error::ExtensionError;

/// The points of the training procedure at which a [`TrainingExtension`](crate::training_extension::TrainingExtension) is invoked.
///
/// The string form of each callback is its snake_case name, e.g. `Callback::AfterBatch` is `"after_batch"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Callback {
    /// Invoked once, before the first epoch is started
    BeforeTraining,
    /// Invoked before each epoch is started
    BeforeEpoch,
    /// Invoked before each batch is processed. Receives the batch.
    BeforeBatch,
    /// Invoked after each batch is processed. Receives the batch.
    AfterBatch,
    /// Invoked after each epoch is finished
    AfterEpoch,
    /// Invoked once, after training is finished
    AfterTraining,
    /// Invoked when training is interrupted by a failure of the training algorithm
    OnInterrupt,
}

impl Callback {
    /// Look up a callback by its snake_case name.
    ///
    /// # Errors
    /// returns an [`ExtensionError`] of kind [`UnknownCallback`](crate::extension_error::ExtensionErrorKind::UnknownCallback) if `name` is not one of the lifecycle callbacks
    pub fn from_name(name: &str) -> Result<Self, ExtensionError> {
        name.parse()
            .map_err(|_| ExtensionError::unknown_callback(name))
    }

    /// The snake_case name of the callback
    pub fn name(&self) -> &'static str {
        (*self).into()
    }

    /// Whether the main loop passes the current batch along with this callback
    pub fn takes_batch(&self) -> bool {
        matches!(self, Callback::BeforeBatch | Callback::AfterBatch)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::extension_error::ExtensionErrorKind;
    use strum::IntoEnumIterator;

    #[test]
    fn test_names_parse_back() {
        for callback in Callback::iter() {
            assert_eq!(Callback::from_name(callback.name()).unwrap(), callback);
            assert_eq!(callback.to_string(), callback.name());
        }
    }

    #[test]
    fn test_expected_names() {
        let names: Vec<&str> = Callback::iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "before_training",
                "before_epoch",
                "before_batch",
                "after_batch",
                "after_epoch",
                "after_training",
                "on_interrupt"
            ]
        );
    }

    #[test]
    fn test_unknown_name() {
        let err = Callback::from_name("after_everything").unwrap_err();
        assert_eq!(
            err.kind(),
            &ExtensionErrorKind::UnknownCallback("after_everything".to_string())
        );
        // names are case sensitive
        assert!(Callback::from_name("AfterEpoch").is_err());
    }

    #[test]
    fn test_takes_batch() {
        let batch_callbacks: Vec<Callback> = Callback::iter().filter(|c| c.takes_batch()).collect();
        assert_eq!(
            batch_callbacks,
            vec![Callback::BeforeBatch, Callback::AfterBatch]
        );
    }
}
