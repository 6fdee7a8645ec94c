//! Depth-first discovery of actionable elements in the focused window

use crate::cache::Fingerprint;
use crate::dedup::Deduplicator;
use crate::element::{Attribute, ElementRef};
use crate::errors::DiscoveryError;
use crate::platforms::{AccessibilityProvider, ProviderExt};
use crate::roles::{self, RolePolicy};
use crate::title;
use crate::types::{CoordinateSystem, ProcessId, Profile, Rect, Target, TargetId};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

pub mod frame;
mod stable;
mod volatile;

pub use frame::{FrameSource, Placement};
use stable::StableTree;
use volatile::VolatileTree;

/// Tuning for one discovery pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Nodes deeper than this are not visited.
    pub max_depth: usize,
    /// Discovery stops once this many targets were emitted.
    pub max_items: usize,
    /// Descendant levels searched when a row or cell has no own title.
    pub descendant_title_depth: usize,
    /// Pins the heuristics for the whole pass instead of switching on
    /// embedded web content.
    pub forced_profile: Option<Profile>,
    /// Drop volatile targets whose frame lies outside the window.
    pub skip_offscreen: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 25,
            max_items: crate::labels::CAPACITY,
            descendant_title_depth: title::DEFAULT_DESCENDANT_DEPTH,
            forced_profile: None,
            skip_offscreen: true,
        }
    }
}

/// Shared stop flag checked at every node.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters collected while walking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub elements_visited: usize,
    pub targets_emitted: usize,
    pub elements_skipped: usize,
    pub section_headers: usize,
    pub duplicates_dropped: usize,
    pub offscreen_dropped: usize,
    pub max_depth_reached: usize,
    /// The item or depth limit cut the walk short.
    pub truncated: bool,
    pub cancelled: bool,
}

impl CrawlStats {
    fn visit(&mut self, depth: usize) {
        self.elements_visited += 1;
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }
}

/// What the heuristics need to know about a node.
pub(crate) struct NodeInfo {
    pub role: String,
    pub policy: RolePolicy,
    pub actions: Vec<String>,
}

/// Profile-specific decisions on top of the shared walk.
pub(crate) trait CrawlHeuristics {
    fn profile(&self) -> Profile;

    fn coordinate_system(&self) -> CoordinateSystem;

    fn is_actionable<P: AccessibilityProvider>(
        &self,
        provider: &P,
        node: &NodeInfo,
        frame: Option<Rect>,
    ) -> bool;

    /// Targets of this profile must carry a frame.
    fn requires_frame(&self) -> bool;
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Application element and its focused window, falling back to the main
/// window and then to the first window child.
pub fn focused_window<P: AccessibilityProvider>(
    provider: &P,
    pid: ProcessId,
) -> Result<(P::Element, P::Element), DiscoveryError> {
    if !provider.is_trusted() {
        return Err(DiscoveryError::PermissionDenied(format!(
            "process is not trusted to inspect pid {pid}"
        )));
    }
    let application = provider.application(pid)?;

    let window = provider
        .element_attribute(&application, Attribute::FocusedWindow)
        .ok()
        .flatten()
        .or_else(|| {
            provider
                .element_attribute(&application, Attribute::MainWindow)
                .ok()
                .flatten()
        })
        .or_else(|| {
            provider
                .children_or_empty(&application)
                .into_iter()
                .find(|child| provider.role(child).as_deref() == Some(roles::WINDOW))
        });

    match window {
        Some(window) => Ok((application, window)),
        None => Err(DiscoveryError::NoWindow(format!(
            "application {pid} has no focused or main window"
        ))),
    }
}

/// Cheap digest of the focused window's top-level shape. Two passes with
/// equal fingerprints are assumed to see the same targets.
pub fn window_fingerprint<P: AccessibilityProvider>(
    provider: &P,
    pid: ProcessId,
) -> Result<Fingerprint, DiscoveryError> {
    let (_, window) = focused_window(provider, pid)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(provider.role(&window).unwrap_or_default().as_bytes());
    hasher.update(&[0]);
    hasher.update(
        provider
            .text(&window, Attribute::Title)
            .unwrap_or_default()
            .as_bytes(),
    );
    if let Some(frame) = provider.position_frame(&window) {
        for value in [frame.x, frame.y, frame.width, frame.height] {
            hasher.update(&value.to_le_bytes());
        }
    }
    let children = provider.children_or_empty(&window);
    hasher.update(&(children.len() as u64).to_le_bytes());
    for child in &children {
        hasher.update(provider.role(child).unwrap_or_default().as_bytes());
        hasher.update(&[0]);
    }
    Ok(Fingerprint::from_hash(hasher.finalize()))
}

/// Crawls the focused window of `pid`, passing each deduplicated target to
/// `sink` in discovery order. `sink` returns `false` to stop early.
///
/// Per-element failures are skipped; only permission, application and
/// window lookup failures are returned as errors.
#[instrument(level = "debug", skip(provider, config, cancel, sink))]
pub fn crawl<P, F>(
    provider: &P,
    pid: ProcessId,
    config: &CrawlConfig,
    cancel: &CancellationFlag,
    sink: F,
) -> Result<CrawlStats, DiscoveryError>
where
    P: AccessibilityProvider,
    F: FnMut(Target<P::Element>) -> bool,
{
    let (_, window) = focused_window(provider, pid)?;
    let mut walker = Walker {
        provider,
        config,
        cancel,
        generation: next_generation(),
        window_frame: provider.position_frame(&window).filter(Rect::is_usable),
        dedup: Deduplicator::new(),
        stats: CrawlStats::default(),
        sink,
    };

    let profile = config.forced_profile.unwrap_or(Profile::Stable);
    if walker.emit_window_chrome(&window).is_continue() {
        let children = provider.children_or_empty(&window);
        let count = children.len();
        for (index, child) in children.iter().enumerate() {
            let visit = Visit {
                depth: 1,
                profile,
                path: Vec::new(),
                placement: Placement {
                    parent_frame: walker.window_frame,
                    index,
                    siblings: count,
                },
                inside_target: false,
            };
            if walker.walk(child, &visit).is_break() {
                break;
            }
        }
    }

    let stats = walker.stats;
    if stats.truncated && stats.targets_emitted >= config.max_items {
        warn!(limit = config.max_items, "discovery truncated at the item limit");
    }
    info!(
        "Discovery completed for PID: {}. Stats: visited={}, targets={}, skipped={}, headers={}, duplicates={}, offscreen={}, depth={}, truncated={}, cancelled={}",
        pid,
        stats.elements_visited,
        stats.targets_emitted,
        stats.elements_skipped,
        stats.section_headers,
        stats.duplicates_dropped,
        stats.offscreen_dropped,
        stats.max_depth_reached,
        stats.truncated,
        stats.cancelled
    );
    Ok(stats)
}

/// Collecting form of [`crawl`].
pub fn discover<P: AccessibilityProvider>(
    provider: &P,
    pid: ProcessId,
    config: &CrawlConfig,
    cancel: &CancellationFlag,
) -> Result<Vec<Target<P::Element>>, DiscoveryError> {
    let mut targets = Vec::new();
    crawl(provider, pid, config, cancel, |target| {
        targets.push(target);
        true
    })?;
    Ok(targets)
}

/// Per-node walk state handed down to children.
#[derive(Debug, Clone)]
struct Visit {
    depth: usize,
    profile: Profile,
    path: Vec<String>,
    placement: Placement,
    /// An ancestor was already emitted as a row or cell target.
    inside_target: bool,
}

struct Walker<'a, P: AccessibilityProvider, F> {
    provider: &'a P,
    config: &'a CrawlConfig,
    cancel: &'a CancellationFlag,
    generation: u64,
    window_frame: Option<Rect>,
    dedup: Deduplicator<P::Element>,
    stats: CrawlStats,
    sink: F,
}

impl<P, F> Walker<'_, P, F>
where
    P: AccessibilityProvider,
    F: FnMut(Target<P::Element>) -> bool,
{
    fn emit(&mut self, target: Target<P::Element>) -> ControlFlow<()> {
        if self.stats.targets_emitted >= self.config.max_items {
            self.stats.truncated = true;
            return ControlFlow::Break(());
        }
        if !self.dedup.accept(&target) {
            self.stats.duplicates_dropped += 1;
            return ControlFlow::Continue(());
        }
        trace!(title = %target.title, role = %target.role, "target");
        self.stats.targets_emitted += 1;
        if !(self.sink)(target) {
            debug!("discovery sink closed, stopping");
            self.stats.cancelled = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    /// Close, minimize, zoom and full-screen controls are not always in the
    /// window's child list, so they are read from the window's attributes.
    fn emit_window_chrome(&mut self, window: &P::Element) -> ControlFlow<()> {
        const CHROME: [(Attribute, &str); 4] = [
            (Attribute::CloseButton, roles::CLOSE_BUTTON_SUBROLE),
            (Attribute::MinimizeButton, roles::MINIMIZE_BUTTON_SUBROLE),
            (Attribute::ZoomButton, roles::ZOOM_BUTTON_SUBROLE),
            (Attribute::FullScreenButton, roles::FULL_SCREEN_BUTTON_SUBROLE),
        ];
        for (attribute, default_subrole) in CHROME {
            let Ok(Some(button)) = self.provider.element_attribute(window, attribute) else {
                continue;
            };
            let subrole = self
                .provider
                .subrole(&button)
                .unwrap_or_else(|| default_subrole.to_string());
            let Some(title) = roles::window_chrome_title(&subrole) else {
                continue;
            };
            let target = Target {
                id: TargetId::new(),
                title: title.to_string(),
                role: self
                    .provider
                    .role(&button)
                    .unwrap_or_else(|| roles::BUTTON.to_string()),
                subrole: Some(subrole),
                title_depth: title::DEFAULT_DESCENDANT_DEPTH,
                path: Vec::new(),
                is_enabled: self.provider.is_enabled(&button),
                cached_frame: frame::stable_frame(self.provider, &button),
                element: ElementRef::new(button, self.generation),
                profile: Profile::Stable,
                coordinate_system: CoordinateSystem::TopLeftOrigin,
            };
            self.emit(target)?;
        }
        ControlFlow::Continue(())
    }

    fn walk(&mut self, element: &P::Element, visit: &Visit) -> ControlFlow<()> {
        if self.cancel.is_cancelled() {
            self.stats.cancelled = true;
            return ControlFlow::Break(());
        }
        if self.stats.targets_emitted >= self.config.max_items {
            self.stats.truncated = true;
            return ControlFlow::Break(());
        }
        if visit.depth > self.config.max_depth {
            self.stats.truncated = true;
            return ControlFlow::Continue(());
        }
        self.stats.visit(visit.depth);

        let Some(role) = self.provider.role(element) else {
            self.stats.elements_skipped += 1;
            return ControlFlow::Continue(());
        };
        let subrole = self.provider.subrole(element);
        let policy = roles::policy(&role, subrole.as_deref());

        let profile = match self.config.forced_profile {
            Some(forced) => forced,
            None if role == roles::WEB_AREA => {
                if visit.profile != Profile::Volatile {
                    debug!(depth = visit.depth, "entering web content, switching to volatile heuristics");
                }
                Profile::Volatile
            }
            None => visit.profile,
        };

        if is_section_header(self.provider, element, &policy) {
            trace!(%role, "skipping section header");
            self.stats.section_headers += 1;
            return ControlFlow::Continue(());
        }

        let frame = match profile {
            Profile::Stable => frame::stable_frame(self.provider, element),
            Profile::Volatile => {
                frame::volatile_frame(self.provider, element, &visit.placement).map(|(f, _)| f)
            }
        };

        let mut emitted_title = None;
        let nested_row = visit.inside_target && policy.is_row_like();
        if !nested_row && (policy.actionable || profile == Profile::Volatile) {
            let node = NodeInfo {
                actions: self.provider.action_names(element).unwrap_or_default(),
                role,
                policy,
            };
            let actionable = match profile {
                Profile::Stable => StableTree.is_actionable(self.provider, &node, frame),
                Profile::Volatile => VolatileTree.is_actionable(self.provider, &node, frame),
            };
            if actionable {
                let built = match profile {
                    Profile::Stable => self.build_target(&StableTree, element, node, subrole, visit, frame),
                    Profile::Volatile => self.build_target(&VolatileTree, element, node, subrole, visit, frame),
                };
                if let Some(target) = built {
                    emitted_title = Some(target.title.clone());
                    self.emit(target)?;
                }
            }
        }

        // Leaf targets are not descended; rows and cells are, so controls
        // embedded in them stay reachable.
        if emitted_title.is_some() && !policy.is_row_like() {
            return ControlFlow::Continue(());
        }

        let children = match self.provider.children(element) {
            Ok(children) => children,
            Err(e) => {
                trace!("Failed to get children: {}. Proceeding with no children.", e);
                return ControlFlow::Continue(());
            }
        };
        if children.is_empty() {
            return ControlFlow::Continue(());
        }

        let mut path = visit.path.clone();
        if let Some(name) = emitted_title.clone().or_else(|| {
            policy
                .container
                .then(|| container_name(self.provider, element))
                .flatten()
        }) {
            path.push(name);
        }
        let parent_frame = frame.or(visit.placement.parent_frame);
        let count = children.len();
        for (index, child) in children.iter().enumerate() {
            let child_visit = Visit {
                depth: visit.depth + 1,
                profile,
                path: path.clone(),
                placement: Placement {
                    parent_frame,
                    index,
                    siblings: count,
                },
                inside_target: visit.inside_target || emitted_title.is_some(),
            };
            self.walk(child, &child_visit)?;
        }
        ControlFlow::Continue(())
    }

    fn build_target<H: CrawlHeuristics>(
        &mut self,
        heuristics: &H,
        element: &P::Element,
        node: NodeInfo,
        subrole: Option<String>,
        visit: &Visit,
        frame: Option<Rect>,
    ) -> Option<Target<P::Element>> {
        if heuristics.requires_frame() {
            let frame = frame?;
            if self.config.skip_offscreen {
                if let Some(window) = self.window_frame {
                    if !frame.intersects(&window) {
                        self.stats.offscreen_dropped += 1;
                        return None;
                    }
                }
            }
        }

        let Some(title) =
            title::resolve_title_with_depth(self.provider, element, self.config.descendant_title_depth)
        else {
            trace!(role = %node.role, "no title resolved, skipping");
            self.stats.elements_skipped += 1;
            return None;
        };

        Some(Target {
            id: TargetId::new(),
            title,
            role: node.role,
            subrole,
            title_depth: self.config.descendant_title_depth,
            path: visit.path.clone(),
            element: ElementRef::new(element.clone(), self.generation),
            is_enabled: self.provider.is_enabled(element),
            cached_frame: frame,
            profile: heuristics.profile(),
            coordinate_system: heuristics.coordinate_system(),
        })
    }
}

fn container_name<P: AccessibilityProvider>(provider: &P, element: &P::Element) -> Option<String> {
    provider
        .text(element, Attribute::Title)
        .or_else(|| provider.text(element, Attribute::Description))
}

/// A top-level outline row that groups other rows. It is expanded, or it
/// carries a disclosure triangle within two levels.
pub(crate) fn is_section_header<P: AccessibilityProvider>(
    provider: &P,
    element: &P::Element,
    policy: &RolePolicy,
) -> bool {
    if !policy.is_row_like() {
        return false;
    }
    match provider.number(element, Attribute::DisclosureLevel) {
        Some(level) if level == 0.0 => {}
        _ => return false,
    }
    provider.flag(element, Attribute::Expanded) == Some(true)
        || has_disclosure_triangle(provider, element, 2)
}

fn has_disclosure_triangle<P: AccessibilityProvider>(
    provider: &P,
    element: &P::Element,
    depth: usize,
) -> bool {
    if depth == 0 {
        return false;
    }
    provider.children_or_empty(element).iter().any(|child| {
        provider.role(child).as_deref() == Some(roles::DISCLOSURE_TRIANGLE)
            || has_disclosure_triangle(provider, child, depth - 1)
    })
}
