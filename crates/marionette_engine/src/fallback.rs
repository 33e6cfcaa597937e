//! Bounded fallback combinators.
//!
//! Every "missing prerequisite" path in the engine gets exactly one recovery
//! attempt. Taking the recovery step as `FnOnce` makes a second attempt
//! unrepresentable.

use marionette_core::EngineError;
use std::future::Future;

/// Await `primary`; if it yields nothing, run `fallback` once and return its result.
pub async fn or_fallback_once<T, P, F, FFut>(primary: P, fallback: F) -> Result<Option<T>, EngineError>
where
    P: Future<Output = Result<Option<T>, EngineError>>,
    F: FnOnce() -> FFut,
    FFut: Future<Output = Result<Option<T>, EngineError>>,
{
    if let Some(found) = primary.await? {
        return Ok(Some(found));
    }
    fallback().await
}

/// Run `attempt`; if it yields nothing, run `recover` once and try again.
///
/// Errors from either step propagate. A second empty attempt is returned as `None`.
pub async fn retry_once_after<T, A, AFut, R, RFut>(
    mut attempt: A,
    recover: R,
) -> Result<Option<T>, EngineError>
where
    A: FnMut() -> AFut,
    AFut: Future<Output = Result<Option<T>, EngineError>>,
    R: FnOnce() -> RFut,
    RFut: Future<Output = Result<(), EngineError>>,
{
    if let Some(found) = attempt().await? {
        return Ok(Some(found));
    }
    recover().await?;
    attempt().await
}
