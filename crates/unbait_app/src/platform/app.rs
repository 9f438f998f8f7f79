use std::io::IsTerminal;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use unbait_core::{
    update, Ack, ClickTarget, Effect, Msg, Point, PopupController, Size, UpdateMessage,
    DISMISS_CONTROL_SIZE,
};
use unbait_engine::{
    EngineComponents, EngineHandle, FetchSettings, FileSettingsStore, HeadlessBrowser,
    LlmEndpoints, OrchestratorConfig, ProviderClient, ReadabilityExtractor, RequestEvent,
    RequestOutcome, ReqwestFetcher, SourceInbox,
};
use unbait_logging::{unbait_debug, unbait_info, unbait_warn};

use super::{config, effects, logging, ui};
use crate::cli::{Cli, Commands};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    let store = config::open_store(&cli.settings, cli.prompt_file.as_deref());
    match cli.command {
        Commands::Resolve {
            urls,
            at,
            scroll,
            viewport,
            cancel,
        } => resolve_links(
            store,
            ResolveRequest {
                urls,
                at,
                scroll,
                viewport,
                cancel,
            },
        ),
        Commands::Config { action } => config::run(&store, action),
    }
}

struct ResolveRequest {
    urls: Vec<String>,
    at: Point,
    scroll: Point,
    viewport: Size,
    cancel: Vec<String>,
}

fn resolve_links(store: FileSettingsStore, request: ResolveRequest) -> anyhow::Result<()> {
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).context("building page loader")?;
    let browser = Arc::new(HeadlessBrowser::new(Arc::new(fetcher)));
    let inbox = browser.register_source_tab();
    let source = inbox.tab();
    let llm = ProviderClient::new(LlmEndpoints::default()).context("building LLM client")?;
    let engine = EngineHandle::new(EngineComponents {
        platform: browser,
        settings: Arc::new(store),
        extractor: Arc::new(ReadabilityExtractor),
        llm: Arc::new(llm),
        config: OrchestratorConfig::default(),
    })
    .context("starting engine")?;

    let mut surface = PageSurface::new(inbox, request.viewport, std::io::stdout().is_terminal());
    surface.send(Msg::Scrolled(request.scroll));
    surface.send(Msg::ContextClick(request.at));

    let started = Utc::now();
    for url in &request.urls {
        unbait_info!("Resolving {} for {}", url, source);
        engine.resolve(url.clone(), source);
    }

    let mut cancels = request.cancel;
    let mut finished = 0;
    let mut delivered = 0;
    while finished < request.urls.len() {
        surface.pump();
        cancels.retain(|url| !surface.press_dismiss_control(url));
        while let Some(event) = engine.try_recv() {
            match event {
                RequestEvent::StatusChanged { url, status } => {
                    unbait_debug!("{} -> {}", url, status.label());
                }
                RequestEvent::Finished { url, outcome } => {
                    if outcome == RequestOutcome::Delivered {
                        delivered += 1;
                    }
                    unbait_info!("Finished {}: {:?}", url, outcome);
                    finished += 1;
                }
            }
        }
        if let Some(frame) = surface.take_frame() {
            println!("{frame}");
        }
        thread::sleep(POLL_INTERVAL);
    }
    surface.pump();
    if let Some(frame) = surface.take_frame() {
        println!("{frame}");
    }

    let elapsed = Utc::now() - started;
    println!(
        "{delivered}/{} answered in {:.1}s",
        request.urls.len(),
        elapsed.num_milliseconds() as f64 / 1000.0
    );
    Ok(())
}

/// Content-script side of a source tab: owns the popup store and answers every update.
struct PageSurface {
    state: PopupController,
    inbox: SourceInbox,
    styled: bool,
    frame: Option<String>,
}

impl PageSurface {
    fn new(inbox: SourceInbox, viewport: Size, styled: bool) -> Self {
        Self {
            state: PopupController::with_viewport(viewport),
            inbox,
            styled,
            frame: None,
        }
    }

    /// Handle every update waiting in the inbox.
    fn pump(&mut self) {
        while let Some(envelope) = self.inbox.try_recv() {
            let ack = self.receive(envelope.message.clone());
            envelope.respond(ack);
        }
    }

    fn receive(&mut self, message: UpdateMessage) -> Ack {
        self.send(Msg::Incoming(message)).unwrap_or_else(Ack::success)
    }

    /// Dispatch `msg` and run its effects. Returns the ack owed to an incoming update.
    fn send(&mut self, msg: Msg) -> Option<Ack> {
        let effects = self.dispatch(msg);
        let outcome = effects::run_effects(&self.state, effects);
        for follow_up in outcome.follow_up {
            self.send(follow_up);
        }
        outcome.ack
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.frame = Some(ui::render::render(&state.view(), self.styled));
        }
        self.state = state;
        effects
    }

    fn take_frame(&mut self) -> Option<String> {
        self.frame.take()
    }

    /// Click the dismiss control of `url`'s loading popup. Returns false while
    /// there is nothing to click yet.
    fn press_dismiss_control(&mut self, url: &str) -> bool {
        let Some(popup) = self.state.popup(url) else {
            return false;
        };
        if !popup.is_loading() {
            unbait_warn!("Popup for {} already settled; nothing to cancel", url);
            return true;
        }
        let Some(size) = popup.size else {
            return false;
        };
        let point = Point {
            x: popup.position.x + size.width - DISMISS_CONTROL_SIZE / 2,
            y: popup.position.y + DISMISS_CONTROL_SIZE / 2,
        };
        let target = self.state.hit_test(point);
        if target == ClickTarget::DismissControl(url.to_string()) {
            self.send(Msg::Click(target));
        } else {
            // Another popup covers the control.
            self.send(Msg::Dismiss {
                url: url.to_string(),
                via_explicit_control: true,
            });
        }
        true
    }
}
