//! Unwrap helpers with good error messages.
//!
//! These replace `unwrap()` and `expect()` in test code. The sync helpers
//! are `#[track_caller]` so a failure points at the test line, not here.
//! The async ones name themselves in the panic message instead.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error value.
///
/// # Example
///
/// ```rust
/// use nxbridge_test_helpers::must;
///
/// let result: Result<u8, &str> = Ok(0x30);
/// assert_eq!(must(result), 0x30);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` if `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap a `Result` with a context message.
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

#[cfg(feature = "console")]
mod async_helpers {
    use super::*;
    use std::future::Future;
    use std::time::Duration;

    /// Await a future returning `Result`, panicking on `Err`.
    ///
    /// # Panics
    ///
    /// Panics if the future resolves to `Err`.
    pub async fn must_async<F, T, E>(future: F) -> T
    where
        F: Future<Output = Result<T, E>>,
        E: Debug,
    {
        match future.await {
            Ok(v) => v,
            Err(e) => panic!("must_async: unexpected Err: {e:?}"),
        }
    }

    /// Await a future for at most `limit`.
    ///
    /// Under a paused test clock the limit is virtual time.
    ///
    /// # Panics
    ///
    /// Panics if the future does not finish in time.
    pub async fn must_within<F, T>(limit: Duration, future: F) -> T
    where
        F: Future<Output = T>,
    {
        match tokio::time::timeout(limit, future).await {
            Ok(v) => v,
            Err(_) => panic!("must_within: not done after {limit:?}"),
        }
    }
}

#[cfg(feature = "console")]
pub use async_helpers::{must_async, must_within};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_must_ok() {
        let result: Result<i32, &str> = Ok(42);
        assert_eq!(must(result), 42);
    }

    #[test]
    #[should_panic(expected = "must: unexpected Err")]
    fn test_must_err() {
        let result: Result<i32, &str> = Err("test error");
        let _ = must(result);
    }

    #[test]
    #[should_panic(expected = "must_some: expected value")]
    fn test_must_some_none() {
        let option: Option<i32> = None;
        let _ = must_some(option, "expected value");
    }

    #[test]
    #[should_panic(expected = "must_with: context")]
    fn test_must_with_err() {
        let result: Result<i32, &str> = Err("error");
        let _ = must_with(result, "context");
    }

    #[cfg(feature = "console")]
    mod async_tests {
        use super::*;
        use std::time::Duration;

        #[tokio::test]
        async fn test_must_async_ok() {
            async fn get() -> Result<i32, String> {
                Ok(42)
            }
            assert_eq!(must_async(get()).await, 42);
        }

        #[tokio::test(start_paused = true)]
        async fn test_must_within_ready() {
            let v = must_within(Duration::from_millis(10), async { 7 }).await;
            assert_eq!(v, 7);
        }

        #[tokio::test(start_paused = true)]
        #[should_panic(expected = "must_within: not done")]
        async fn test_must_within_expires() {
            must_within(Duration::from_millis(10), std::future::pending::<()>()).await;
        }
    }
}
