use crate::subject::SubjectId;

/// Errors raised while declaring listeners or managing subscriptions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A listener registered a hook that no observable method in scope derives
    #[error("listener `{listener}` declares hook `{hook}`, which matches no observable method of its targets")]
    UnknownHook { listener: String, hook: String },

    /// A detach was requested for a listener that is not attached
    #[error("listener is not attached to subject {subject}")]
    ListenerNotFound { subject: SubjectId },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
