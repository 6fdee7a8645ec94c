//! In-memory accessibility provider.
//!
//! Builds a mutable element tree by hand and records every call made against
//! it. Hosts without a native backend and the test-suite drive the engine
//! through it.

use super::{AccessibilityProvider, ActionOutcome, InputSynthesizer};
use crate::element::{Attribute, AttributeValue};
use crate::errors::ProviderError;
use crate::types::{CoordinateSystem, Point, ProcessId, Rect};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Handle into a [`MemoryTree`]. Identity is the node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// What performing an action does to the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEffect {
    /// Reports success without changing anything.
    Succeed,
    /// Flips the boolean value and reports success.
    ToggleValue,
    /// Adds one to the numeric value and reports success.
    IncrementValue,
    /// Reports the given outcome without changing anything.
    Outcome(ActionOutcome),
}

/// Builder for a node's attributes and behavior.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    attributes: HashMap<Attribute, AttributeValue>,
    actions: Vec<(String, ActionEffect)>,
    writable: HashSet<Attribute>,
    unreadable: HashSet<Attribute>,
}

impl NodeSpec {
    pub fn new(role: &str) -> Self {
        Self::default().attr(Attribute::Role, AttributeValue::Text(role.to_string()))
    }

    pub fn attr(mut self, attribute: Attribute, value: AttributeValue) -> Self {
        self.attributes.insert(attribute, value);
        self
    }

    fn text(self, attribute: Attribute, text: &str) -> Self {
        self.attr(attribute, AttributeValue::Text(text.to_string()))
    }

    pub fn subrole(self, subrole: &str) -> Self {
        self.text(Attribute::Subrole, subrole)
    }

    pub fn title(self, title: &str) -> Self {
        self.text(Attribute::Title, title)
    }

    pub fn description(self, description: &str) -> Self {
        self.text(Attribute::Description, description)
    }

    pub fn value_text(self, value: &str) -> Self {
        self.text(Attribute::Value, value)
    }

    pub fn value_bool(self, value: bool) -> Self {
        self.attr(Attribute::Value, AttributeValue::Bool(value))
    }

    pub fn value_number(self, value: f64) -> Self {
        self.attr(Attribute::Value, AttributeValue::Number(value))
    }

    pub fn placeholder(self, placeholder: &str) -> Self {
        self.text(Attribute::Placeholder, placeholder)
    }

    pub fn help(self, help: &str) -> Self {
        self.text(Attribute::Help, help)
    }

    pub fn url(self, url: &str) -> Self {
        self.attr(Attribute::Url, AttributeValue::Url(url.to_string()))
    }

    /// Geometry through position + size.
    pub fn frame(self, frame: Rect) -> Self {
        self.attr(
            Attribute::Position,
            AttributeValue::Point(Point::new(frame.x, frame.y)),
        )
        .attr(
            Attribute::Size,
            AttributeValue::Size(crate::types::Size::new(frame.width, frame.height)),
        )
    }

    /// Geometry through the explicit frame attribute only.
    pub fn explicit_frame(self, frame: Rect) -> Self {
        self.attr(Attribute::Frame, AttributeValue::Rect(frame))
    }

    pub fn enabled(self, enabled: bool) -> Self {
        self.attr(Attribute::Enabled, AttributeValue::Bool(enabled))
    }

    pub fn expanded(self, expanded: bool) -> Self {
        self.attr(Attribute::Expanded, AttributeValue::Bool(expanded))
    }

    pub fn disclosure_level(self, level: u32) -> Self {
        self.attr(
            Attribute::DisclosureLevel,
            AttributeValue::Number(f64::from(level)),
        )
    }

    pub fn shortcut(self, key: &str, modifiers: u32) -> Self {
        self.text(Attribute::MenuItemCmdChar, key).attr(
            Attribute::MenuItemCmdModifiers,
            AttributeValue::Number(f64::from(modifiers)),
        )
    }

    /// Supported action that reports success and does nothing else.
    pub fn action(self, name: &str) -> Self {
        self.action_with(name, ActionEffect::Succeed)
    }

    pub fn action_with(mut self, name: &str, effect: ActionEffect) -> Self {
        self.actions.push((name.to_string(), effect));
        self
    }

    pub fn writable(mut self, attribute: Attribute) -> Self {
        self.writable.insert(attribute);
        self
    }

    /// Reads of this attribute fail with a platform error.
    pub fn unreadable(mut self, attribute: Attribute) -> Self {
        self.unreadable.insert(attribute);
        self
    }
}

#[derive(Debug)]
struct Node {
    spec: NodeSpec,
    element_attributes: HashMap<Attribute, NodeId>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    alive: bool,
}

#[derive(Debug, Default)]
struct TreeState {
    nodes: HashMap<NodeId, Node>,
    applications: HashMap<ProcessId, NodeId>,
    next_id: u64,
    trusted: bool,
    performed: Vec<(NodeId, String)>,
    writes: Vec<(NodeId, Attribute, AttributeValue)>,
}

/// A hand-built accessibility tree.
#[derive(Debug)]
pub struct MemoryTree {
    state: Mutex<TreeState>,
    calls: AtomicUsize,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TreeState {
                trusted: true,
                ..TreeState::default()
            }),
            calls: AtomicUsize::new(0),
        }
    }

    fn insert(&self, parent: Option<NodeId>, spec: NodeSpec, attach: bool) -> NodeId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = NodeId(state.next_id);
        state.nodes.insert(
            id,
            Node {
                spec,
                element_attributes: HashMap::new(),
                children: Vec::new(),
                parent,
                alive: true,
            },
        );
        if let (Some(parent), true) = (parent, attach) {
            if let Some(node) = state.nodes.get_mut(&parent) {
                node.children.push(id);
            }
        }
        id
    }

    pub fn add_application(&self, pid: ProcessId, spec: NodeSpec) -> NodeId {
        let id = self.insert(None, spec, false);
        self.state.lock().applications.insert(pid, id);
        id
    }

    pub fn add_child(&self, parent: NodeId, spec: NodeSpec) -> NodeId {
        self.insert(Some(parent), spec, true)
    }

    /// Node whose parent is `parent` but which is not listed among its
    /// children, like window chrome buttons.
    pub fn add_detached(&self, parent: NodeId, spec: NodeSpec) -> NodeId {
        self.insert(Some(parent), spec, false)
    }

    pub fn link(&self, owner: NodeId, attribute: Attribute, target: NodeId) {
        if let Some(node) = self.state.lock().nodes.get_mut(&owner) {
            node.element_attributes.insert(attribute, target);
        }
    }

    /// Tears a node and its subtree down; every later call on it reports
    /// the element as gone.
    pub fn remove(&self, id: NodeId) {
        let mut state = self.state.lock();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = state.nodes.get_mut(&current) {
                node.alive = false;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Reads an attribute without counting as a provider call.
    pub fn value(&self, id: NodeId, attribute: Attribute) -> Option<AttributeValue> {
        self.state
            .lock()
            .nodes
            .get(&id)
            .and_then(|node| node.spec.attributes.get(&attribute).cloned())
    }

    pub fn set_trusted(&self, trusted: bool) {
        self.state.lock().trusted = trusted;
    }

    pub fn performed_actions(&self) -> Vec<(NodeId, String)> {
        self.state.lock().performed.clone()
    }

    pub fn writes(&self) -> Vec<(NodeId, Attribute, AttributeValue)> {
        self.state.lock().writes.clone()
    }

    /// Number of provider calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn with_live_node<R>(
        &self,
        id: &NodeId,
        f: impl FnOnce(&Node) -> Result<R, ProviderError>,
    ) -> Result<R, ProviderError> {
        self.touch();
        let state = self.state.lock();
        match state.nodes.get(id) {
            Some(node) if node.alive => f(node),
            _ => Err(ProviderError::ElementGone),
        }
    }
}

impl AccessibilityProvider for MemoryTree {
    type Element = NodeId;

    fn is_trusted(&self) -> bool {
        self.touch();
        self.state.lock().trusted
    }

    fn application(&self, pid: ProcessId) -> Result<NodeId, ProviderError> {
        self.touch();
        let state = self.state.lock();
        if !state.trusted {
            return Err(ProviderError::PermissionDenied);
        }
        state
            .applications
            .get(&pid)
            .copied()
            .ok_or_else(|| ProviderError::Platform(format!("no application for pid {pid}")))
    }

    fn attribute(&self, element: &NodeId, attribute: Attribute) -> Result<AttributeValue, ProviderError> {
        self.with_live_node(element, |node| {
            if node.spec.unreadable.contains(&attribute) {
                return Err(ProviderError::Platform(format!(
                    "{} could not be read",
                    attribute.as_str()
                )));
            }
            node.spec
                .attributes
                .get(&attribute)
                .cloned()
                .ok_or_else(|| ProviderError::Unavailable(attribute.as_str().to_string()))
        })
    }

    fn element_attribute(
        &self,
        element: &NodeId,
        attribute: Attribute,
    ) -> Result<Option<NodeId>, ProviderError> {
        self.with_live_node(element, |node| {
            Ok(node.element_attributes.get(&attribute).copied())
        })
    }

    fn children(&self, element: &NodeId) -> Result<Vec<NodeId>, ProviderError> {
        self.with_live_node(element, |node| Ok(node.children.clone()))
    }

    fn parent(&self, element: &NodeId) -> Result<Option<NodeId>, ProviderError> {
        self.with_live_node(element, |node| Ok(node.parent))
    }

    fn action_names(&self, element: &NodeId) -> Result<Vec<String>, ProviderError> {
        self.with_live_node(element, |node| {
            Ok(node.spec.actions.iter().map(|(name, _)| name.clone()).collect())
        })
    }

    fn perform_action(&self, element: &NodeId, action: &str) -> ActionOutcome {
        self.touch();
        let mut state = self.state.lock();
        let effect = match state.nodes.get(element) {
            Some(node) if node.alive => node
                .spec
                .actions
                .iter()
                .find(|(name, _)| name == action)
                .map(|(_, effect)| effect.clone()),
            _ => return ActionOutcome::ElementGone,
        };
        let Some(effect) = effect else {
            return ActionOutcome::UnsupportedAction;
        };
        state.performed.push((*element, action.to_string()));
        let Some(node) = state.nodes.get_mut(element) else {
            return ActionOutcome::ElementGone;
        };
        match effect {
            ActionEffect::Succeed => ActionOutcome::Success,
            ActionEffect::Outcome(outcome) => outcome,
            ActionEffect::ToggleValue => {
                let current = node
                    .spec
                    .attributes
                    .get(&Attribute::Value)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                node.spec
                    .attributes
                    .insert(Attribute::Value, AttributeValue::Bool(!current));
                ActionOutcome::Success
            }
            ActionEffect::IncrementValue => {
                let current = node
                    .spec
                    .attributes
                    .get(&Attribute::Value)
                    .and_then(|v| v.as_number())
                    .unwrap_or(0.0);
                node.spec
                    .attributes
                    .insert(Attribute::Value, AttributeValue::Number(current + 1.0));
                ActionOutcome::Success
            }
        }
    }

    fn set_attribute(
        &self,
        element: &NodeId,
        attribute: Attribute,
        value: AttributeValue,
    ) -> ActionOutcome {
        self.touch();
        let mut state = self.state.lock();
        let writable = match state.nodes.get(element) {
            Some(node) if node.alive => node.spec.writable.contains(&attribute),
            _ => return ActionOutcome::ElementGone,
        };
        if !writable {
            return ActionOutcome::UnsupportedAction;
        }
        state.writes.push((*element, attribute, value.clone()));
        if let Some(node) = state.nodes.get_mut(element) {
            node.spec.attributes.insert(attribute, value);
        }
        ActionOutcome::Success
    }
}

/// Records synthetic clicks instead of posting them.
#[derive(Debug, Clone, Default)]
pub struct RecordingInput {
    clicks: Arc<Mutex<Vec<(Point, CoordinateSystem)>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clicks(&self) -> Vec<(Point, CoordinateSystem)> {
        self.clicks.lock().clone()
    }

    /// Makes every later click report a platform error.
    pub fn fail_clicks(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

impl InputSynthesizer for RecordingInput {
    fn click_at(&self, point: Point, coordinates: CoordinateSystem) -> Result<(), ProviderError> {
        if *self.fail.lock() {
            return Err(ProviderError::Platform("click rejected".to_string()));
        }
        self.clicks.lock().push((point, coordinates));
        Ok(())
    }
}
