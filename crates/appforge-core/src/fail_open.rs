//! Fail-open utilities for best-effort pipeline steps
//!
//! Some steps degrade the result instead of aborting the run: a failed
//! attachment is omitted, a failed commit lookup reports a placeholder id.
//! These helpers make that branch explicit and always log what was absorbed.
//!
//! DO NOT use fail-open for:
//! - Code generation
//! - Repository publication
//! - Evaluation delivery (it has its own retry budget)

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Run a best-effort operation, returning `None` on failure
///
/// # Usage
///
/// ```no_run
/// use appforge_core::fail_open::fail_open;
/// use appforge_core::Result;
///
/// async fn stage() -> Result<Vec<u8>> {
///     Ok(vec![])
/// }
///
/// async fn example() {
///     let staged = fail_open("stage attachment", stage()).await;
///     // staged is None if stage() failed
/// }
/// ```
pub async fn fail_open<Fut, T>(operation_name: &str, fut: Fut) -> Option<T>
where
    Fut: Future<Output = Result<T>>,
{
    match fut.await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

/// Run a best-effort operation, substituting `placeholder` on failure
///
/// # Usage
///
/// ```no_run
/// use appforge_core::fail_open::fail_open_or;
/// use appforge_core::{Result, UNKNOWN_COMMIT};
///
/// async fn head_sha() -> Result<String> {
///     Ok("abc123".to_string())
/// }
///
/// async fn example() {
///     let sha = fail_open_or("latest commit", head_sha(), UNKNOWN_COMMIT.to_string()).await;
/// }
/// ```
pub async fn fail_open_or<Fut, T>(operation_name: &str, fut: Fut, placeholder: T) -> T
where
    Fut: Future<Output = Result<T>>,
{
    fail_open(operation_name, fut).await.unwrap_or(placeholder)
}
