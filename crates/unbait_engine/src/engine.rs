use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::{
    BrowserPlatform, ChannelStatusSink, ContentExtractor, LlmClient, Orchestrator,
    OrchestratorConfig, RequestEvent, SettingsStore, TabId,
};

/// Collaborators the engine thread drives.
pub struct EngineComponents {
    pub platform: Arc<dyn BrowserPlatform>,
    pub settings: Arc<dyn SettingsStore>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub llm: Arc<dyn LlmClient>,
    pub config: OrchestratorConfig,
}

enum EngineCommand {
    Resolve { url: String, source: TabId },
}

/// Runs the orchestrator on its own tokio runtime; talks to callers over channels.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<RequestEvent>,
}

impl EngineHandle {
    pub fn new(components: EngineComponents) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        let orchestrator = Arc::new(
            Orchestrator::new(
                components.platform,
                components.settings,
                components.extractor,
                components.llm,
                Arc::new(ChannelStatusSink::new(event_tx)),
            )
            .with_config(components.config),
        );

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let orchestrator = orchestrator.clone();
                runtime.spawn(async move {
                    handle_command(&orchestrator, command).await;
                });
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn resolve(&self, url: impl Into<String>, source: TabId) {
        let _ = self.cmd_tx.send(EngineCommand::Resolve {
            url: url.into(),
            source,
        });
    }

    pub fn try_recv(&self) -> Option<RequestEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<RequestEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(orchestrator: &Orchestrator, command: EngineCommand) {
    match command {
        EngineCommand::Resolve { url, source } => orchestrator.resolve(&url, source).await,
    }
}
