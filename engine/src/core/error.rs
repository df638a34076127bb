use crate::pool::{InstanceHandle, TemplateId};

/// Errors raised by the decal core.
///
/// Query misses and duplicate registration are ordinary control flow and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pool has no free instance left for the template.
    #[error("instance pool exhausted for template {0:?}")]
    PoolExhausted(TemplateId),

    /// The handle does not name a live instance (released or never acquired).
    #[error("unknown or released instance {0:?}")]
    UnknownInstance(InstanceHandle),

    /// A modifier failed inside `setup` or `perform`.
    #[error("modifier `{name}` failed: {message}")]
    Modifier {
        /// Name of the failing modifier.
        name: &'static str,
        /// What went wrong.
        message: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Modifier`].
    pub fn modifier(name: &'static str, message: impl Into<String>) -> Self {
        Self::Modifier {
            name,
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
