use std::fmt;

use crate::callback::Callback;

/// An error raised while dispatching a callback to an extension
///
/// Displaying the error will show the name of the extension that raised it, if known, and what went wrong
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionError {
    kind: ExtensionErrorKind,
    /// the extension that raised the error
    extension: Option<String>,
}

/// What went wrong in an [`ExtensionError`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionErrorKind {
    /// A callback was looked up by a name that is not one of the lifecycle callbacks
    UnknownCallback(String),
    /// A batch callback was dispatched without a batch
    MissingBatch(Callback),
    /// Writing extension output failed
    Io {
        /// the kind of the underlying IO error
        kind: std::io::ErrorKind,
        /// the message of the underlying IO error
        message: String,
    },
    /// The extension reported a failure of its own
    Failed(String),
}

impl ExtensionError {
    /// `name` is not a lifecycle callback
    pub fn unknown_callback(name: &str) -> Self {
        Self {
            kind: ExtensionErrorKind::UnknownCallback(name.to_string()),
            extension: None,
        }
    }

    /// A batch callback was dispatched without a batch
    pub fn missing_batch(callback: Callback) -> Self {
        Self {
            kind: ExtensionErrorKind::MissingBatch(callback),
            extension: None,
        }
    }

    /// An I/O failure, such as a report that could not be written
    pub fn io(source: std::io::Error) -> Self {
        Self {
            kind: ExtensionErrorKind::Io {
                kind: source.kind(),
                message: source.to_string(),
            },
            extension: None,
        }
    }

    /// A failure described by `message`
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            kind: ExtensionErrorKind::Failed(message.into()),
            extension: None,
        }
    }

    /// Attach the name of the extension that raised this error. An already attached name is kept.
    pub fn with_extension(mut self, extension: &str) -> Self {
        if self.extension.is_none() {
            self.extension = Some(extension.to_string());
        }
        self
    }

    /// What went wrong
    pub fn kind(&self) -> &ExtensionErrorKind {
        &self.kind
    }

    /// Name of the extension that raised the error, if known
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

impl From<std::io::Error> for ExtensionError {
    fn from(source: std::io::Error) -> Self {
        ExtensionError::io(source)
    }
}

impl fmt::Display for ExtensionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExtensionErrorKind::UnknownCallback(name) => write!(f, "unknown callback '{}'", name),
            ExtensionErrorKind::MissingBatch(callback) => {
                write!(f, "callback {} requires a batch, but none was passed", callback)
            }
            ExtensionErrorKind::Io { message, .. } => write!(f, "unable to write output: {}", message),
            ExtensionErrorKind::Failed(message) => write!(f, "{}", message),
        }
    }
}

impl fmt::Display for ExtensionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.extension {
            Some(extension) => write!(f, "extension {} encountered error: {}", extension, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ExtensionError {}
