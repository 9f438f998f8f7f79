//! In-process browser: background tabs are HTTP page loads, source tabs are
//! message inboxes owned by a page surface.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use unbait_core::{Ack, UpdateMessage};
use unbait_logging::{unbait_debug, unbait_info};

use crate::{decode_html, BrowserPlatform, FetchedPage, Fetcher, LoadedPage, PlatformError, TabId};

/// An update waiting for the page surface, with its reply channel.
#[derive(Debug)]
pub struct Envelope {
    pub message: UpdateMessage,
    reply: oneshot::Sender<Ack>,
}

impl Envelope {
    pub fn respond(self, ack: Ack) {
        // The sender may have timed out already; nothing left to tell it.
        let _ = self.reply.send(ack);
    }
}

/// Receiving end of a source tab. Dropping it closes the tab.
#[derive(Debug)]
pub struct SourceInbox {
    tab: TabId,
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl SourceInbox {
    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

#[derive(Debug, Clone)]
enum LoadState {
    Loading,
    Complete(Arc<LoadedPage>),
    Failed(String),
}

enum Tab {
    Source(mpsc::UnboundedSender<Envelope>),
    Background {
        state: watch::Receiver<LoadState>,
        cancel: CancellationToken,
    },
}

pub struct HeadlessBrowser {
    fetcher: Arc<dyn Fetcher>,
    next_id: AtomicU64,
    tabs: Mutex<HashMap<TabId, Tab>>,
}

impl HeadlessBrowser {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            next_id: AtomicU64::new(1),
            tabs: Mutex::new(HashMap::new()),
        }
    }

    /// Open a tab whose page surface reads updates from the returned inbox.
    pub fn register_source_tab(&self) -> SourceInbox {
        let tab = self.allocate();
        let (tx, rx) = mpsc::unbounded_channel();
        self.tabs().insert(tab, Tab::Source(tx));
        unbait_debug!("Registered source {}", tab);
        SourceInbox { tab, rx }
    }

    pub fn background_tab_count(&self) -> usize {
        self.tabs()
            .values()
            .filter(|tab| matches!(tab, Tab::Background { .. }))
            .count()
    }

    fn allocate(&self) -> TabId {
        TabId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn tabs(&self) -> MutexGuard<'_, HashMap<TabId, Tab>> {
        self.tabs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_state(&self, tab: TabId) -> Result<Option<watch::Receiver<LoadState>>, PlatformError> {
        match self.tabs().get(&tab) {
            Some(Tab::Background { state, .. }) => Ok(Some(state.clone())),
            Some(Tab::Source(_)) => Ok(None),
            None => Err(PlatformError::TabNotFound(tab)),
        }
    }
}

#[async_trait]
impl BrowserPlatform for HeadlessBrowser {
    async fn tab_exists(&self, tab: TabId) -> bool {
        let mut tabs = self.tabs();
        match tabs.get(&tab) {
            Some(Tab::Source(tx)) if tx.is_closed() => {
                tabs.remove(&tab);
                unbait_debug!("Source {} went away", tab);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    async fn open_background_tab(&self, url: &str) -> Result<TabId, PlatformError> {
        let parsed = url::Url::parse(url).map_err(|err| PlatformError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PlatformError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let tab = self.allocate();
        let (state_tx, state_rx) = watch::channel(LoadState::Loading);
        let cancel = CancellationToken::new();
        self.tabs().insert(
            tab,
            Tab::Background {
                state: state_rx,
                cancel: cancel.clone(),
            },
        );

        let fetcher = self.fetcher.clone();
        let target = parsed.to_string();
        tokio::spawn(async move {
            let state = tokio::select! {
                _ = cancel.cancelled() => return,
                result = fetcher.fetch(&target) => match result {
                    Ok(fetched) => LoadState::Complete(Arc::new(into_page(fetched))),
                    Err(err) => LoadState::Failed(err.to_string()),
                },
            };
            let _ = state_tx.send(state);
        });

        unbait_info!("Opened background {} for {}", tab, url);
        Ok(tab)
    }

    async fn wait_for_load(&self, tab: TabId) -> Result<(), PlatformError> {
        let Some(mut state) = self.load_state(tab)? else {
            return Ok(());
        };
        let settled = match state
            .wait_for(|state| !matches!(state, LoadState::Loading))
            .await
        {
            Ok(settled) => settled.clone(),
            Err(_) => return Err(PlatformError::LoadFailed("tab was closed".to_string())),
        };
        match settled {
            LoadState::Failed(reason) => Err(PlatformError::LoadFailed(reason)),
            _ => Ok(()),
        }
    }

    async fn page(&self, tab: TabId) -> Result<LoadedPage, PlatformError> {
        let Some(state) = self.load_state(tab)? else {
            return Err(PlatformError::NotLoaded(tab));
        };
        let current = state.borrow().clone();
        match current {
            LoadState::Complete(page) => Ok(page.as_ref().clone()),
            LoadState::Loading => Err(PlatformError::NotLoaded(tab)),
            LoadState::Failed(reason) => Err(PlatformError::LoadFailed(reason)),
        }
    }

    async fn close_tab(&self, tab: TabId) -> Result<(), PlatformError> {
        let mut tabs = self.tabs();
        match tabs.remove(&tab) {
            Some(Tab::Background { cancel, .. }) => {
                cancel.cancel();
                unbait_debug!("Closed background {}", tab);
                Ok(())
            }
            Some(source @ Tab::Source(_)) => {
                // Source tabs close when their page surface drops its inbox.
                tabs.insert(tab, source);
                Err(PlatformError::NoReceiver(tab))
            }
            None => Err(PlatformError::TabNotFound(tab)),
        }
    }

    async fn send_message(
        &self,
        tab: TabId,
        message: UpdateMessage,
    ) -> Result<Ack, PlatformError> {
        let sender = match self.tabs().get(&tab) {
            Some(Tab::Source(tx)) => tx.clone(),
            Some(Tab::Background { .. }) => return Err(PlatformError::NoReceiver(tab)),
            None => return Err(PlatformError::TabNotFound(tab)),
        };
        let (reply, ack) = oneshot::channel();
        if sender.send(Envelope { message, reply }).is_err() {
            self.tabs().remove(&tab);
            return Err(PlatformError::TabNotFound(tab));
        }
        ack.await.map_err(|_| PlatformError::NoReceiver(tab))
    }
}

fn into_page(fetched: FetchedPage) -> LoadedPage {
    let decoded = decode_html(&fetched.body, fetched.content_type.as_deref());
    if decoded.lossy {
        unbait_debug!(
            "Lossy {} decode for {}",
            decoded.encoding_label,
            fetched.final_url
        );
    }
    LoadedPage {
        url: fetched.final_url,
        status: fetched.status,
        html: decoded.html,
    }
}
