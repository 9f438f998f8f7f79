//! UnBait engine: browser platform seam, content extraction, LLM clients and
//! the per-link request orchestrator.
mod anthropic;
mod decode;
mod engine;
mod extract;
mod fetch;
mod headless;
mod llm;
mod messaging;
mod openai;
mod orchestrator;
mod persist;
mod platform;
mod settings;
mod tracker;
mod types;

pub use decode::{decode_html, DecodedHtml};
pub use engine::{EngineComponents, EngineHandle};
pub use extract::{
    extract_or_fallback, fallback_extraction, ContentExtractor, ExtractError, ExtractedContent,
    ReadabilityExtractor, FALLBACK_TEXT_LIMIT,
};
pub use fetch::{FetchSettings, FetchedPage, Fetcher, ReqwestFetcher};
pub use headless::{Envelope, HeadlessBrowser, SourceInbox};
pub use llm::{format_user_prompt, LlmClient, LlmEndpoints, LlmError, ProviderClient};
pub use messaging::{deliver, Delivery};
pub use orchestrator::{ChannelStatusSink, Orchestrator, OrchestratorConfig, StatusSink};
pub use persist::{write_atomically, PersistError};
pub use platform::{BrowserPlatform, LoadedPage, PlatformError, TabId};
pub use settings::{
    load_default_prompt, FileSettingsStore, MemorySettingsStore, Provider, Settings,
    SettingsError, SettingsStore, SettingsUpdate, BUNDLED_DEFAULT_PROMPT, FALLBACK_PROMPT,
};
pub use tracker::{RequestGuard, RequestTracker, TrackedRequest};
pub use types::{FailureKind, FetchError, RequestEvent, RequestOutcome};
