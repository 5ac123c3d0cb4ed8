//! Error types for rt-exchange.
//!
//! Exchange operations never fail: an empty queue is reported through `bool` or
//! `Option`. Errors only exist for misuse that can be detected outside the hot path.

use std::thread::ThreadId;

use crate::thread_role::Role;

/// Errors reported by the checking helpers of this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    /// A handle bound to one thread was used from another.
    #[error("{role} handle bound to thread {bound:?} was used from thread {caller:?}")]
    RoleViolation {
        /// Role of the handle that was misused
        role: Role,
        /// Thread the handle is bound to
        bound: ThreadId,
        /// Thread that made the call
        caller: ThreadId,
    },

    /// The atomic type backing the lock-free family is emulated with a lock.
    ///
    /// Kept for [`assert_lock_free`](crate::assert_lock_free); the crate does not
    /// compile on targets where this could be produced.
    #[error("{atomic} is not lock-free on this target")]
    NotLockFree {
        /// Name of the atomic type
        atomic: &'static str,
    },
}

impl ExchangeError {
    /// Check if this error comes from a thread role violation.
    #[must_use]
    pub fn is_role_violation(&self) -> bool {
        matches!(self, ExchangeError::RoleViolation { .. })
    }

    /// Role involved in the error, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self {
            ExchangeError::RoleViolation { role, .. } => Some(*role),
            ExchangeError::NotLockFree { .. } => None,
        }
    }
}

/// A specialized `Result` type for rt-exchange checks.
pub type Result<T = ()> = std::result::Result<T, ExchangeError>;
