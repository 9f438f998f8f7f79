//! Per-link request lifecycle: background tab, extraction, LLM query, delivery.

use std::sync::{mpsc, Arc};
use std::time::Duration;

use unbait_core::{Ack, AckStatus, RequestStatus, UpdateMessage};
use unbait_logging::{unbait_debug, unbait_error, unbait_info, unbait_warn};

use crate::{
    deliver, extract_or_fallback, BrowserPlatform, ContentExtractor, Delivery, LlmClient,
    RequestEvent, RequestGuard, RequestOutcome, RequestTracker, SettingsStore, TabId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Ceiling on waiting for a background tab to finish loading.
    pub load_timeout: Duration,
    /// How long a page surface may take to acknowledge an update.
    pub delivery_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(30),
            delivery_timeout: Duration::from_secs(5),
        }
    }
}

pub trait StatusSink: Send + Sync {
    fn emit(&self, event: RequestEvent);
}

pub struct ChannelStatusSink {
    tx: mpsc::Sender<RequestEvent>,
}

impl ChannelStatusSink {
    pub fn new(tx: mpsc::Sender<RequestEvent>) -> Self {
        Self { tx }
    }
}

impl StatusSink for ChannelStatusSink {
    fn emit(&self, event: RequestEvent) {
        let _ = self.tx.send(event);
    }
}

pub struct Orchestrator {
    platform: Arc<dyn BrowserPlatform>,
    settings: Arc<dyn SettingsStore>,
    extractor: Arc<dyn ContentExtractor>,
    llm: Arc<dyn LlmClient>,
    sink: Arc<dyn StatusSink>,
    tracker: RequestTracker,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        platform: Arc<dyn BrowserPlatform>,
        settings: Arc<dyn SettingsStore>,
        extractor: Arc<dyn ContentExtractor>,
        llm: Arc<dyn LlmClient>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            platform,
            settings,
            extractor,
            llm,
            sink,
            tracker: RequestTracker::new(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Resolve `url` for the page in `source`, reporting progress to that page.
    ///
    /// Every path ends with exactly one [`RequestEvent::Finished`] on the status sink.
    pub async fn resolve(&self, url: &str, source: TabId) {
        let outcome = match self.tracker.try_begin(url, source) {
            Some(request) => {
                let outcome = self.run(&request, source).await;
                unbait_info!(
                    "Request for {} finished after {} ms: {:?}",
                    url,
                    request.elapsed().num_milliseconds(),
                    outcome
                );
                outcome
            }
            None => {
                unbait_warn!("Request for {} already in flight; ignoring duplicate", url);
                RequestOutcome::Rejected
            }
        };
        self.sink.emit(RequestEvent::Finished {
            url: url.to_string(),
            outcome,
        });
    }

    async fn run(&self, request: &RequestGuard, source: TabId) -> RequestOutcome {
        let url = request.url();

        if !self.platform.tab_exists(source).await {
            unbait_info!("Source {} no longer exists, aborting request for {}", source, url);
            return RequestOutcome::SourceGone;
        }

        let loading = UpdateMessage::ShowLoading {
            url: url.to_string(),
        };
        let delivery = deliver(
            self.platform.as_ref(),
            source,
            loading,
            self.config.delivery_timeout,
        )
        .await;
        if !matches!(delivery, Delivery::Acked(_)) {
            unbait_info!(
                "Failed to send loading update to {} ({:?}); abandoning {}",
                source,
                delivery,
                url
            );
            return RequestOutcome::SourceGone;
        }

        let settings = self.settings.load().unwrap_or_else(|err| {
            unbait_error!("Error getting settings, using defaults: {}", err);
            self.settings.defaults()
        });

        self.advance(request, RequestStatus::PendingTab);
        let tab = match self.platform.open_background_tab(url).await {
            Ok(tab) => tab,
            Err(err) => {
                unbait_error!("Error creating background tab for {}: {}", url, err);
                return self
                    .fail(request, source, "Failed to open link in background tab")
                    .await;
            }
        };

        self.advance(request, RequestStatus::PendingLoad);
        let loaded =
            tokio::time::timeout(self.config.load_timeout, self.platform.wait_for_load(tab)).await;
        match loaded {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                unbait_error!("Error loading {} in {}: {}", url, tab, err);
                self.close_quietly(tab).await;
                return self
                    .fail(request, source, &format!("Failed to load page: {err}"))
                    .await;
            }
            Err(_) => {
                unbait_error!(
                    "Loading {} timed out after {:?}",
                    url,
                    self.config.load_timeout
                );
                self.close_quietly(tab).await;
                return self.fail(request, source, "Page took too long to load").await;
            }
        }

        self.advance(request, RequestStatus::Extracting);
        let content = match self.platform.page(tab).await {
            Ok(page) => {
                if page.status >= 400 {
                    unbait_warn!("{} loaded an error page ({}); extracting it anyway", url, page.status);
                }
                extract_or_fallback(self.extractor.as_ref(), &page)
            }
            Err(err) => {
                unbait_error!("Error reading document of {}: {}", tab, err);
                self.close_quietly(tab).await;
                return self
                    .fail(request, source, "Failed to extract content from page")
                    .await;
            }
        };
        self.close_quietly(tab).await;
        unbait_debug!(
            "Extracted {} chars titled {:?} from {}",
            content.content.len(),
            content.title,
            content.url
        );

        self.advance(request, RequestStatus::Querying);
        let answer = match self.llm.answer(&content, &settings).await {
            Ok(answer) => answer,
            Err(err) => {
                unbait_error!("API error for {}: {}", url, err);
                return self.fail(request, source, &err.user_message()).await;
            }
        };

        if !self.platform.tab_exists(source).await {
            unbait_info!("Source {} closed during processing, abandoning result", source);
            return RequestOutcome::SourceGone;
        }

        let result = UpdateMessage::ShowResult {
            url: url.to_string(),
            result: answer,
        };
        match self.deliver_terminal(source, result).await {
            Delivery::Acked(Ack {
                status: AckStatus::Canceled,
            }) => {
                self.advance(request, RequestStatus::Canceled);
                RequestOutcome::Canceled
            }
            Delivery::Acked(_) => {
                self.advance(request, RequestStatus::Done);
                RequestOutcome::Delivered
            }
            other => {
                unbait_info!("Failed to deliver result to {}: {:?}", source, other);
                RequestOutcome::SourceGone
            }
        }
    }

    async fn fail(&self, request: &RequestGuard, source: TabId, message: &str) -> RequestOutcome {
        self.advance(request, RequestStatus::Errored);
        let error = UpdateMessage::ShowError {
            url: request.url().to_string(),
            error: message.to_string(),
        };
        match self.deliver_terminal(source, error).await {
            Delivery::Acked(Ack {
                status: AckStatus::Canceled,
            }) => {
                self.advance(request, RequestStatus::Canceled);
                RequestOutcome::Canceled
            }
            Delivery::Acked(_) => RequestOutcome::Errored(message.to_string()),
            other => {
                unbait_info!("Failed to deliver error to {}: {:?}", source, other);
                RequestOutcome::Errored(message.to_string())
            }
        }
    }

    /// Terminal updates re-check the source first; failures are never retried.
    async fn deliver_terminal(&self, source: TabId, message: UpdateMessage) -> Delivery {
        if !self.platform.tab_exists(source).await {
            return Delivery::TabGone;
        }
        deliver(
            self.platform.as_ref(),
            source,
            message,
            self.config.delivery_timeout,
        )
        .await
    }

    async fn close_quietly(&self, tab: TabId) {
        if let Err(err) = self.platform.close_tab(tab).await {
            unbait_warn!("Error closing {}: {}", tab, err);
        }
    }

    fn advance(&self, request: &RequestGuard, status: RequestStatus) {
        request.set_status(status);
        self.sink.emit(RequestEvent::StatusChanged {
            url: request.url().to_string(),
            status,
        });
    }
}
