use beacon_core::UserId;
use thiserror::Error;

/// Failures a relay operation can report. All of them go back to the
/// originating connection only, never into a broadcast.
///
/// A relay addressed to a connection that no longer exists anywhere is not an
/// error: the sender cannot know the peer disconnected a moment earlier, so
/// stale targets are absorbed silently.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed `register-user`. The registry is left untouched.
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    /// `call-user` without a usable caller id or username. No lookup is
    /// attempted.
    #[error("caller info must include id and username")]
    InvalidCallerInfo,

    /// The requested user is not present in the registry.
    #[error("target user not found: {0}")]
    TargetNotFound(UserId),

    /// The fan-out layer could not accept a publish. Fatal at startup,
    /// reported to the caller at runtime.
    #[error("backplane unavailable: {0}")]
    BackplaneUnavailable(String),
}
