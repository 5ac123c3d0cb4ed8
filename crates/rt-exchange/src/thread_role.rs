//! Optional thread affinity checks for exchange handles.
//!
//! The lock-free handles already make a second producer or consumer impossible, but
//! nothing stops a handle from being moved to the wrong thread. [`ThreadBound`] wraps a
//! handle, remembers the thread that first used it, and reports any later access from
//! another thread as [`ExchangeError::RoleViolation`].
//!
//! # Example
//!
//! ```rust
//! use rt_exchange::lockfree::SingleElementQueue;
//! use rt_exchange::{Role, ThreadBound};
//!
//! let (producer, _consumer) = SingleElementQueue::<u32>::new();
//! let mut producer = ThreadBound::new(producer, Role::Producer);
//!
//! let handle = std::thread::spawn(move || -> rt_exchange::Result<()> {
//!     // The first access binds the handle to this thread
//!     producer.try_get_mut()?.push(&1);
//!     producer.try_get_mut()?.push(&2);
//!     Ok(())
//! });
//! assert!(matches!(handle.join(), Ok(Ok(()))));
//! ```

use core::fmt;
use std::thread::{self, ThreadId};

use crate::error::{ExchangeError, Result};

/// Side of an exchange a handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Writes values into the exchange.
    Producer,
    /// Reads values out of the exchange.
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

/// A handle that may only be used from one thread.
///
/// The thread is fixed by the first successful access, or explicitly by
/// [`rebind`](Self::rebind).
pub struct ThreadBound<H> {
    handle: H,
    role: Role,
    bound: Option<ThreadId>,
}

impl<H> ThreadBound<H> {
    /// Wrap `handle` without binding it to a thread yet.
    #[must_use]
    pub fn new(handle: H, role: Role) -> Self {
        Self {
            handle,
            role,
            bound: None,
        }
    }

    /// Role this handle plays.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Thread the handle is bound to, if it has been used yet.
    #[must_use]
    pub fn bound_thread(&self) -> Option<ThreadId> {
        self.bound
    }

    /// Access the handle, checking that the caller is the bound thread.
    ///
    /// Binds the handle to the calling thread on first access.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::RoleViolation`] when called from a thread other than
    /// the bound one. The violation is logged at `error` level.
    pub fn try_get_mut(&mut self) -> Result<&mut H> {
        self.check()?;
        Ok(&mut self.handle)
    }

    /// Access the handle, checking the calling thread in debug builds only.
    ///
    /// Release builds skip the check entirely, so this is the accessor to use on the
    /// real-time path.
    ///
    /// # Panics
    ///
    /// Panics in debug builds when called from a thread other than the bound one.
    #[inline]
    pub fn get_mut(&mut self) -> &mut H {
        if cfg!(debug_assertions) {
            if let Err(err) = self.check() {
                panic!("{err}");
            }
        }
        &mut self.handle
    }

    /// Bind the handle to the calling thread, forgetting the previous binding.
    ///
    /// Use after deliberately handing the handle over to another thread, for example
    /// when an audio device restarts its callback thread.
    pub fn rebind(&mut self) {
        let caller = thread::current().id();
        tracing::debug!(
            role = %self.role,
            previous = ?self.bound,
            thread = ?caller,
            "exchange handle rebound"
        );
        self.bound = Some(caller);
    }

    /// Unwrap the handle.
    #[must_use]
    pub fn into_inner(self) -> H {
        self.handle
    }

    fn check(&mut self) -> Result<()> {
        let caller = thread::current().id();
        match self.bound {
            Some(bound) if bound == caller => Ok(()),
            Some(bound) => {
                tracing::error!(
                    role = %self.role,
                    bound = ?bound,
                    caller = ?caller,
                    "exchange handle used from the wrong thread"
                );
                Err(ExchangeError::RoleViolation {
                    role: self.role,
                    bound,
                    caller,
                })
            }
            None => {
                tracing::debug!(role = %self.role, thread = ?caller, "exchange handle bound");
                self.bound = Some(caller);
                Ok(())
            }
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for ThreadBound<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadBound")
            .field("handle", &self.handle)
            .field("role", &self.role)
            .field("bound", &self.bound)
            .finish()
    }
}
