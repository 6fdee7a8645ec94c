//! Keyboard hints for any application's UI
//!
//! Discovers the actionable elements of the focused window through the
//! platform accessibility tree, labels them with short letter codes, lets the
//! user fuzzy-search menus and sidebars, and activates the chosen element
//! with a ladder of semantic actions and synthetic-click fallbacks.

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

pub mod cache;
pub mod commands;
pub mod crawler;
pub mod dedup;
pub mod element;
pub mod errors;
pub mod executor;
pub mod fuzzy;
pub mod labels;
pub mod permission;
pub mod platforms;
pub mod roles;
#[cfg(test)]
mod tests;
pub mod title;
pub mod types;
pub mod ui_thread;
pub mod validator;

pub use cache::{Clock, Fingerprint, SystemClock, TtlCache};
pub use crawler::{CancellationFlag, CrawlConfig, CrawlStats};
pub use element::{Attribute, AttributeValue, ElementHandle, ElementRef, ValidatedElement};
pub use errors::{DiscoveryError, ExecutionError, ProviderError};
pub use executor::{ActionReport, ExecutionContext, ExecutionMethod, ExecutorConfig};
pub use fuzzy::Match;
pub use labels::HintLabels;
pub use permission::{PermissionOutcome, PermissionWatch};
pub use platforms::{AccessibilityProvider, ActionOutcome, InputSynthesizer};
pub use types::{
    CommandId, CommandItem, CommandKind, CoordinateSystem, Point, ProcessId, Profile, Rect, Size,
    Target, TargetId,
};
pub use ui_thread::{UiContext, UiThread};
pub use validator::MatchMode;

/// Everything the engine can be tuned with. Missing JSON fields fall back to
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub crawl: CrawlConfig,
    pub executor: ExecutorConfig,
    pub cache_ttl_ms: u64,
    pub permission_poll_interval_ms: u64,
    pub permission_poll_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            executor: ExecutorConfig::default(),
            cache_ttl_ms: 300,
            permission_poll_interval_ms: 500,
            permission_poll_timeout_ms: 60_000,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn permission_poll_interval(&self) -> Duration {
        Duration::from_millis(self.permission_poll_interval_ms)
    }

    pub fn permission_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.permission_poll_timeout_ms)
    }
}

/// Targets as they are discovered. Dropping the stream cancels the crawl.
///
/// The crawl never waits for the consumer; at most `max_items` targets are
/// queued.
pub struct TargetStream<H> {
    receiver: mpsc::UnboundedReceiver<Result<Target<H>, DiscoveryError>>,
    cancel: CancellationFlag,
}

impl<H> TargetStream<H> {
    /// Stops the crawl; already queued targets are still yielded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl<H> Unpin for TargetStream<H> {}

impl<H> Stream for TargetStream<H> {
    type Item = Result<Target<H>, DiscoveryError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl<H> Drop for TargetStream<H> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Entry point: owns the UI thread and the discovery caches.
pub struct HintEngine<P: AccessibilityProvider + 'static> {
    ui: Arc<UiThread<P>>,
    config: EngineConfig,
    targets: Arc<TtlCache<Vec<Target<P::Element>>>>,
    commands: Arc<TtlCache<Vec<CommandItem<P::Element>>>>,
}

impl<P: AccessibilityProvider + 'static> HintEngine<P> {
    /// Starts the UI thread. `init` runs on that thread and builds the
    /// provider and input synthesizer.
    #[instrument(skip(config, init))]
    pub fn new<F>(config: EngineConfig, init: F) -> Result<Self, DiscoveryError>
    where
        F: FnOnce() -> UiContext<P> + Send + 'static,
    {
        Self::with_clock(config, SystemClock, init)
    }

    /// Like [`HintEngine::new`] with an injected cache clock.
    pub fn with_clock<C, F>(config: EngineConfig, clock: C, init: F) -> Result<Self, DiscoveryError>
    where
        C: Clock + Clone + 'static,
        F: FnOnce() -> UiContext<P> + Send + 'static,
    {
        let ui = UiThread::spawn("keyhint-ui", init)?;
        Ok(Self {
            ui: Arc::new(ui),
            targets: Arc::new(TtlCache::with_clock(config.cache_ttl(), clock.clone())),
            commands: Arc::new(TtlCache::with_clock(config.cache_ttl(), clock)),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drops cached discovery results.
    pub fn invalidate(&self) {
        self.targets.invalidate();
        self.commands.invalidate();
    }

    /// All targets of the focused window of `pid`, deduplicated, in
    /// discovery order. Reuses the previous result while the window looks
    /// unchanged and the cache entry is fresh.
    #[instrument(skip(self))]
    pub async fn discover(&self, pid: ProcessId) -> Result<Vec<Target<P::Element>>, DiscoveryError> {
        self.discover_cancellable(pid, CancellationFlag::new()).await
    }

    #[instrument(skip(self, cancel))]
    pub async fn discover_cancellable(
        &self,
        pid: ProcessId,
        cancel: CancellationFlag,
    ) -> Result<Vec<Target<P::Element>>, DiscoveryError> {
        let cache = self.targets.clone();
        let config = self.config.crawl.clone();
        self.ui
            .run(move |ctx| {
                let fingerprint = crawler::window_fingerprint(&ctx.provider, pid)?;
                if let Some(hit) = cache.get(pid, &fingerprint) {
                    debug!(targets = hit.len(), "reusing cached discovery");
                    return Ok(hit);
                }
                let targets = crawler::discover(&ctx.provider, pid, &config, &cancel)?;
                if !cancel.is_cancelled() {
                    cache.insert(pid, fingerprint, targets.clone());
                }
                Ok(targets)
            })
            .await?
    }

    /// Streams targets as the crawl finds them. Deduplication happens
    /// incrementally, so every yielded target is final.
    #[instrument(skip(self))]
    pub fn discover_streaming(
        &self,
        pid: ProcessId,
    ) -> Result<TargetStream<P::Element>, DiscoveryError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationFlag::new();
        let flag = cancel.clone();
        let config = self.config.crawl.clone();
        self.ui.spawn_job(move |ctx| {
            let result = crawler::crawl(&ctx.provider, pid, &config, &flag, |target| {
                sender.send(Ok(target)).is_ok()
            });
            if let Err(e) = result {
                let _ = sender.send(Err(e));
            }
        })?;
        Ok(TargetStream { receiver, cancel })
    }

    /// Menu items, sidebar rows, toolbar buttons and windows of `pid`.
    #[instrument(skip(self))]
    pub async fn commands(&self, pid: ProcessId) -> Result<Vec<CommandItem<P::Element>>, DiscoveryError> {
        let cache = self.commands.clone();
        let config = self.config.crawl.clone();
        self.ui
            .run(move |ctx| {
                let fingerprint = crawler::window_fingerprint(&ctx.provider, pid).ok();
                if let Some(hit) = fingerprint.and_then(|f| cache.get(pid, &f)) {
                    debug!(items = hit.len(), "reusing cached commands");
                    return Ok(hit);
                }
                let items = commands::discover_commands(&ctx.provider, pid, &config)?;
                if let Some(fingerprint) = fingerprint {
                    cache.insert(pid, fingerprint, items.clone());
                }
                Ok(items)
            })
            .await?
    }

    /// Ranks `items` against `query`. Pure; never touches the UI thread.
    pub fn search(&self, query: &str, items: &[CommandItem<P::Element>]) -> Vec<Match> {
        fuzzy::search(query, items)
    }

    /// Labels for `count` targets, capped at the label capacity.
    pub fn labels(&self, count: usize) -> HintLabels {
        HintLabels::for_count(count)
    }

    /// Revalidates and activates `target`. Caches are dropped afterwards
    /// because the UI has likely changed.
    #[instrument(skip(self, target), fields(title = %target.title))]
    pub async fn execute(&self, target: &Target<P::Element>) -> Result<ActionReport, ExecutionError> {
        let target = target.clone();
        let config = self.config.executor.clone();
        let result = self
            .ui
            .run(move |ctx| {
                let context = ExecutionContext {
                    provider: &ctx.provider,
                    input: ctx.input.as_ref(),
                    config: &config,
                };
                executor::execute(&context, &target)
            })
            .await
            .map_err(|e| ExecutionError::ActionFailed(e.to_string()))?;
        self.invalidate();
        if let Ok(report) = &result {
            if report.method == ExecutionMethod::SyntheticClick {
                warn!("target activated by synthetic click");
            }
        }
        result
    }

    #[instrument(skip(self, item), fields(title = %item.title, kind = %item.kind))]
    pub async fn execute_command(
        &self,
        item: &CommandItem<P::Element>,
    ) -> Result<ActionReport, ExecutionError> {
        let item = item.clone();
        let config = self.config.executor.clone();
        let result = self
            .ui
            .run(move |ctx| {
                let context = ExecutionContext {
                    provider: &ctx.provider,
                    input: ctx.input.as_ref(),
                    config: &config,
                };
                commands::execute_command(&context, &item)
            })
            .await
            .map_err(|e| ExecutionError::ActionFailed(e.to_string()))?;
        self.invalidate();
        result
    }

    /// Whether accessibility access is currently granted.
    pub async fn is_trusted(&self) -> Result<bool, DiscoveryError> {
        self.ui.run(|ctx| ctx.provider.is_trusted()).await
    }

    /// Polls for accessibility access in the background. Must be called
    /// from within a tokio runtime.
    #[instrument(skip(self))]
    pub fn watch_permission(&self) -> PermissionWatch {
        let ui = self.ui.clone();
        PermissionWatch::spawn(
            move || {
                let ui = ui.clone();
                async move { ui.run(|ctx| ctx.provider.is_trusted()).await.unwrap_or(false) }
            },
            self.config.permission_poll_interval(),
            self.config.permission_poll_timeout(),
        )
    }
}
