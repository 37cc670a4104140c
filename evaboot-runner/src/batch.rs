//! Continue-on-failure batches
//!
//! Multi-item operations (create/get/list/wait over several inputs) share
//! one convention: with `continue_on_fail` a failed item becomes an
//! `{"error": message}` record and its siblings still run; without it the
//! first error aborts the whole batch.

use serde_json::{Value, json};
use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Inline record standing in for a failed item
pub fn error_record(message: impl Display) -> Value {
    json!({ "error": message.to_string() })
}

/// Runs `op` over every item, in order, collecting the produced records
pub async fn run_batch<I, F, Fut, E>(
    items: I,
    continue_on_fail: bool,
    mut op: F,
) -> Result<Vec<Value>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<Vec<Value>, E>>,
    E: Display,
{
    let mut records = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match op(item).await {
            Ok(produced) => records.extend(produced),
            Err(e) if continue_on_fail => {
                warn!("Item {} failed, continuing: {}", index, e);
                records.push(error_record(&e));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}
