use std::time::Duration;

use unbait_core::{Ack, UpdateMessage};

use crate::{BrowserPlatform, PlatformError, TabId};

/// Outcome of one request/response exchange with a page surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Acked(Ack),
    /// The tab is closed or nothing in it is listening.
    TabGone,
    /// No acknowledgment within the delivery timeout.
    TimedOut,
    Failed(PlatformError),
}

/// Send `message` to `tab` and wait at most `timeout` for its acknowledgment.
pub async fn deliver(
    platform: &dyn BrowserPlatform,
    tab: TabId,
    message: UpdateMessage,
    timeout: Duration,
) -> Delivery {
    match tokio::time::timeout(timeout, platform.send_message(tab, message)).await {
        Ok(Ok(ack)) => Delivery::Acked(ack),
        Ok(Err(PlatformError::TabNotFound(_) | PlatformError::NoReceiver(_))) => Delivery::TabGone,
        Ok(Err(err)) => Delivery::Failed(err),
        Err(_) => Delivery::TimedOut,
    }
}
