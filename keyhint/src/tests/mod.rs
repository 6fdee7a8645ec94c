mod executor_tests;

use crate::element::{Attribute, ElementRef};
use crate::platforms::memory::{MemoryTree, NodeId, NodeSpec};
use crate::roles::*;
use crate::types::{CoordinateSystem, ProcessId, Profile, Rect, Target, TargetId};

pub const PID: ProcessId = ProcessId(4242);

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_test_writer()
        .try_init();
}

/// Application with one focused, 800x600 window.
pub fn app_with_window(title: &str) -> (MemoryTree, NodeId, NodeId) {
    let tree = MemoryTree::new();
    let app = tree.add_application(PID, NodeSpec::new(APPLICATION).title("Mail"));
    let window = tree.add_child(
        app,
        NodeSpec::new(WINDOW)
            .title(title)
            .frame(Rect::new(0.0, 0.0, 800.0, 600.0)),
    );
    tree.link(app, Attribute::FocusedWindow, window);
    (tree, app, window)
}

pub fn button(title: &str) -> NodeSpec {
    NodeSpec::new(BUTTON).title(title).action(PRESS)
}

pub fn text(value: &str) -> NodeSpec {
    NodeSpec::new(STATIC_TEXT).value_text(value)
}

/// Hand-built target for executor tests.
pub fn target(node: NodeId, title: &str, role: &str, profile: Profile) -> Target<NodeId> {
    Target {
        id: TargetId::new(),
        title: title.to_string(),
        role: role.to_string(),
        subrole: None,
        title_depth: crate::title::DEFAULT_DESCENDANT_DEPTH,
        path: Vec::new(),
        element: ElementRef::new(node, 1),
        is_enabled: true,
        cached_frame: None,
        profile,
        coordinate_system: match profile {
            Profile::Stable => CoordinateSystem::TopLeftOrigin,
            Profile::Volatile => CoordinateSystem::ScreenLocal,
        },
    }
}

pub fn titles(targets: &[Target<NodeId>]) -> Vec<&str> {
    targets.iter().map(|t| t.title.as_str()).collect()
}
