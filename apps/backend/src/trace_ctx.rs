//! Task-local trace id for the request being served.
//!
//! `RequestTrace` opens the scope; error rendering and log lines read it.
//! Outside a request scope the id reads as `"unknown"`.

use std::future::Future;

use tokio::task_local;

task_local! {
    static TRACE_ID: String;
}

pub fn trace_id() -> String {
    TRACE_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| "unknown".to_string())
}

pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: Future<Output = R>,
{
    TRACE_ID.scope(trace_id, future).await
}
