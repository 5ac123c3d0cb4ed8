//! Unwrap helpers with good error messages.
//!
//! These helpers replace `unwrap()` and `expect()` in test code, providing
//! better error messages with `#[track_caller]` for accurate panic locations.

use std::fmt::Debug;
use std::thread::JoinHandle;

/// Unwrap a `Result`, panicking with context on error.
///
/// # Example
///
/// ```rust
/// use rt_exchange_test_helpers::must;
///
/// let result: Result<i32, &str> = Ok(42);
/// assert_eq!(must(result), 42);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`, with a message including the error value.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with a custom message if `None`.
///
/// # Example
///
/// ```rust
/// use rt_exchange_test_helpers::must_some;
///
/// assert_eq!(must_some(Some(42), "expected a value"), 42);
/// ```
///
/// # Panics
///
/// Panics if the option is `None`, with the provided message.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap a `Result` with a custom context message.
///
/// # Panics
///
/// Panics if the result is `Err`, with the context and error value.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must_with: {context}: {e:?}"),
    }
}

/// Join a thread and return its result, panicking if the thread panicked.
///
/// # Example
///
/// ```rust
/// use rt_exchange_test_helpers::must_join;
///
/// let handle = std::thread::spawn(|| 6 * 7);
/// assert_eq!(must_join(handle), 42);
/// ```
///
/// # Panics
///
/// Panics if the joined thread panicked.
#[track_caller]
pub fn must_join<T>(handle: JoinHandle<T>) -> T {
    let name = handle.thread().name().map(str::to_owned);
    match handle.join() {
        Ok(v) => v,
        Err(_) => panic!(
            "must_join: thread {} panicked",
            name.as_deref().unwrap_or("<unnamed>")
        ),
    }
}
