use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use unbait_core::{Ack, UpdateMessage};

/// Identity of a browsing context (a tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Document of a background tab that reached "load complete".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    /// URL after redirects.
    pub url: String,
    /// HTTP status of the document; error pages load like any other.
    pub status: u16,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("{0} no longer exists")]
    TabNotFound(TabId),
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("page failed to load: {0}")]
    LoadFailed(String),
    #[error("{0} has not finished loading")]
    NotLoaded(TabId),
    #[error("nothing is listening for messages in {0}")]
    NoReceiver(TabId),
}

/// Browser capabilities the orchestrator drives.
///
/// Implementations must be safe to call from many concurrent requests.
#[async_trait]
pub trait BrowserPlatform: Send + Sync {
    async fn tab_exists(&self, tab: TabId) -> bool;

    /// Open `url` in a new, non-focused tab and start loading it.
    async fn open_background_tab(&self, url: &str) -> Result<TabId, PlatformError>;

    /// Resolve once the tab signals "load complete". Callers bound this with a timeout.
    async fn wait_for_load(&self, tab: TabId) -> Result<(), PlatformError>;

    /// Snapshot the loaded document of `tab`.
    async fn page(&self, tab: TabId) -> Result<LoadedPage, PlatformError>;

    async fn close_tab(&self, tab: TabId) -> Result<(), PlatformError>;

    /// Deliver an update to the page surface of `tab` and wait for its acknowledgment.
    async fn send_message(&self, tab: TabId, message: UpdateMessage)
        -> Result<Ack, PlatformError>;
}
