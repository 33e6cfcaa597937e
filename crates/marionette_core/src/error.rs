use std::fmt;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures that abort an action and surface at the job boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The external feed could not be fetched or decoded.
    #[error("feed transport failed ({source_name}): {source}")]
    Transport {
        source_name: String,
        #[source]
        source: BoxError,
    },

    /// The identity store rejected a new actor.
    #[error("identity creation failed for '{username}': {source}")]
    IdentityCreation {
        username: String,
        #[source]
        source: BoxError,
    },

    /// A content store, identity store or privilege call failed.
    #[error("{operation} failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl EngineError {
    pub fn transport(source_name: &str, err: anyhow::Error) -> Self {
        Self::Transport {
            source_name: source_name.to_string(),
            source: err.into(),
        }
    }

    pub fn identity(username: &str, err: anyhow::Error) -> Self {
        Self::IdentityCreation {
            username: username.to_string(),
            source: err.into(),
        }
    }

    pub fn store(operation: &'static str, err: anyhow::Error) -> Self {
        Self::Store {
            operation,
            source: err.into(),
        }
    }
}

/// Why an action ended as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No actor in the pool, and spawning one did not yield a usable identity.
    NoActor,
    /// Feed cache empty even after one refresh.
    NoContent,
    /// The actor may not start threads in any category.
    NoCategory,
    /// No recent thread, even after creating one.
    NoReplyTarget,
    /// The chosen reply target or its main post disappeared.
    TargetUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoActor => "no actor available",
            SkipReason::NoContent => "no feed content available",
            SkipReason::NoCategory => "no postable category",
            SkipReason::NoReplyTarget => "no recent reply target",
            SkipReason::TargetUnavailable => "reply target unavailable",
        };
        f.write_str(text)
    }
}

/// Result of one action that ran without error.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome<T> {
    Done(T),
    Skipped(SkipReason),
}

impl<T> ActionOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, ActionOutcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            ActionOutcome::Done(v) => Some(v),
            ActionOutcome::Skipped(_) => None,
        }
    }
}
