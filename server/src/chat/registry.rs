//! Active-request registry.
//!
//! Maps request ids to an in-flight status and a cancel handle. A cancel
//! only lands while the request is still `processing`; terminal entries
//! refuse it, so a stale cancel can never fire against a finished call.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Notify;

/// Finished entries stay queryable this long before being swept.
const FINISHED_TTL_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Processing,
    Completed,
    Cancelled,
    Error,
}

struct RequestEntry {
    session_id: String,
    status: RequestStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    error: Option<String>,
    cancel: Arc<Notify>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestStatusView {
    pub status: RequestStatus,
    pub request_id: String,
    pub session_id: String,
    /// Epoch milliseconds.
    pub start_time: i64,
    pub elapsed_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ActiveRequests {
    entries: DashMap<String, RequestEntry>,
}

impl ActiveRequests {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Track a new in-flight request and hand back its cancel handle.
    /// Also sweeps finished entries past their TTL, keeping the map
    /// bounded without a background task.
    pub fn register(&self, request_id: &str, session_id: &str) -> Arc<Notify> {
        self.sweep_older_than(FINISHED_TTL_SECS);

        let cancel = Arc::new(Notify::new());
        self.entries.insert(
            request_id.to_string(),
            RequestEntry {
                session_id: session_id.to_string(),
                status: RequestStatus::Processing,
                started_at: Utc::now(),
                finished_at: None,
                error: None,
                cancel: cancel.clone(),
            },
        );
        cancel
    }

    /// Cooperative cancel. Returns false when the id is unknown or the
    /// request already reached a terminal state.
    pub fn cancel(&self, request_id: &str) -> bool {
        match self.entries.get_mut(request_id) {
            Some(mut entry) if entry.status == RequestStatus::Processing => {
                entry.status = RequestStatus::Cancelled;
                entry.finished_at = Some(Utc::now());
                // notify_one stores a permit, so the handler sees the
                // cancel even if it has not polled yet.
                entry.cancel.notify_one();
                true
            }
            _ => false,
        }
    }

    /// Record a terminal status. A no-op when the request was already
    /// cancelled or finished (first terminal state wins).
    pub fn finish(&self, request_id: &str, status: RequestStatus, error: Option<String>) {
        if let Some(mut entry) = self.entries.get_mut(request_id) {
            if entry.status == RequestStatus::Processing {
                entry.status = status;
                entry.error = error;
                entry.finished_at = Some(Utc::now());
            }
        }
    }

    pub fn status_view(&self, request_id: &str) -> Option<RequestStatusView> {
        self.entries.get(request_id).map(|entry| {
            let end = entry.finished_at.unwrap_or_else(Utc::now);
            RequestStatusView {
                status: entry.status,
                request_id: request_id.to_string(),
                session_id: entry.session_id.clone(),
                start_time: entry.started_at.timestamp_millis(),
                elapsed_ms: end
                    .signed_duration_since(entry.started_at)
                    .num_milliseconds(),
                error: entry.error.clone(),
            }
        })
    }

    fn sweep_older_than(&self, ttl_secs: i64) {
        let now = Utc::now();
        self.entries.retain(|_, entry| match entry.finished_at {
            Some(finished) => now.signed_duration_since(finished).num_seconds() < ttl_secs,
            None => true,
        });
    }
}

impl Default for ActiveRequests {
    fn default() -> Self {
        Self::new()
    }
}
