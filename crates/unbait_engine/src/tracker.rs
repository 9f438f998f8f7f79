use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use unbait_core::RequestStatus;

use crate::TabId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRequest {
    pub url: String,
    pub source: TabId,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// In-flight requests keyed by URL; at most one per URL.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    inner: Arc<Mutex<HashMap<String, TrackedRequest>>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `url`, or `None` if a request for it is already in flight.
    pub fn try_begin(&self, url: &str, source: TabId) -> Option<RequestGuard> {
        let mut requests = self.lock();
        if requests.contains_key(url) {
            return None;
        }
        requests.insert(
            url.to_string(),
            TrackedRequest {
                url: url.to_string(),
                source,
                status: RequestStatus::PendingTab,
                created_at: Utc::now(),
            },
        );
        Some(RequestGuard {
            tracker: self.clone(),
            url: url.to_string(),
        })
    }

    pub fn get(&self, url: &str) -> Option<TrackedRequest> {
        self.lock().get(url).cloned()
    }

    /// Active requests, oldest first.
    pub fn active(&self) -> Vec<TrackedRequest> {
        let mut requests: Vec<_> = self.lock().values().cloned().collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.url.cmp(&b.url)));
        requests
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TrackedRequest>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a URL marked in flight; the entry is removed on drop.
#[derive(Debug)]
pub struct RequestGuard {
    tracker: RequestTracker,
    url: String,
}

impl RequestGuard {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_status(&self, status: RequestStatus) {
        if let Some(request) = self.tracker.lock().get_mut(&self.url) {
            request.status = status;
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.tracker
            .get(&self.url)
            .map(|request| Utc::now() - request.created_at)
            .unwrap_or_else(chrono::Duration::zero)
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.tracker.lock().remove(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_request_for_same_url_is_rejected_until_release() {
        let tracker = RequestTracker::new();
        let first = tracker.try_begin("https://a.example", TabId(1)).unwrap();
        assert!(tracker.try_begin("https://a.example", TabId(2)).is_none());
        assert!(tracker.try_begin("https://b.example", TabId(1)).is_some_and(|g| {
            g.url() == "https://b.example"
        }));

        drop(first);
        assert!(tracker.is_empty());
        assert!(tracker.try_begin("https://a.example", TabId(2)).is_some());
    }

    #[test]
    fn status_updates_are_visible() {
        let tracker = RequestTracker::new();
        let guard = tracker.try_begin("u", TabId(7)).unwrap();
        assert_eq!(tracker.get("u").unwrap().status, RequestStatus::PendingTab);
        guard.set_status(RequestStatus::Querying);
        let tracked = tracker.get("u").unwrap();
        assert_eq!(tracked.status, RequestStatus::Querying);
        assert_eq!(tracked.source, TabId(7));
        assert_eq!(tracker.active().len(), 1);
    }
}
