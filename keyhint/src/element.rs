//! Element handles, attribute names and values

use crate::types::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Bound for the provider's opaque element handle.
///
/// Equality must be reference identity in the provider's live tree, not
/// value equality of attributes.
pub trait ElementHandle: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> ElementHandle for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Attribute names understood by the crawler and executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Role,
    Subrole,
    Title,
    Description,
    Value,
    Placeholder,
    Help,
    Url,
    Position,
    Size,
    Frame,
    Enabled,
    Focused,
    Selected,
    Expanded,
    DisclosureLevel,
    MenuItemCmdChar,
    MenuItemCmdModifiers,
    // Element-valued attributes
    FocusedWindow,
    MainWindow,
    MenuBar,
    CloseButton,
    MinimizeButton,
    ZoomButton,
    FullScreenButton,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Role => "AXRole",
            Attribute::Subrole => "AXSubrole",
            Attribute::Title => "AXTitle",
            Attribute::Description => "AXDescription",
            Attribute::Value => "AXValue",
            Attribute::Placeholder => "AXPlaceholderValue",
            Attribute::Help => "AXHelp",
            Attribute::Url => "AXURL",
            Attribute::Position => "AXPosition",
            Attribute::Size => "AXSize",
            Attribute::Frame => "AXFrame",
            Attribute::Enabled => "AXEnabled",
            Attribute::Focused => "AXFocused",
            Attribute::Selected => "AXSelected",
            Attribute::Expanded => "AXExpanded",
            Attribute::DisclosureLevel => "AXDisclosureLevel",
            Attribute::MenuItemCmdChar => "AXMenuItemCmdChar",
            Attribute::MenuItemCmdModifiers => "AXMenuItemCmdModifiers",
            Attribute::FocusedWindow => "AXFocusedWindow",
            Attribute::MainWindow => "AXMainWindow",
            Attribute::MenuBar => "AXMenuBar",
            Attribute::CloseButton => "AXCloseButton",
            Attribute::MinimizeButton => "AXMinimizeButton",
            Attribute::ZoomButton => "AXZoomButton",
            Attribute::FullScreenButton => "AXFullScreenButton",
        }
    }
}

/// Loosely typed attribute value as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Text(String),
    Bool(bool),
    Number(f64),
    Point(Point),
    Size(Size),
    Rect(Rect),
    Url(String),
}

impl AttributeValue {
    /// Non-empty text after trimming. URLs count as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) | AttributeValue::Url(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// Booleans, and numbers used as booleans (`0`/`1` checkbox values).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Number(n) if *n == 0.0 => Some(false),
            AttributeValue::Number(n) if *n == 1.0 => Some(true),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

/// A non-owning handle into the provider's live tree, stamped with the
/// discovery generation that produced it.
///
/// It may go stale at any time. Executors only accept a [`ValidatedElement`],
/// which only [`crate::validator::validate`] can produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef<H> {
    handle: H,
    generation: u64,
}

impl<H: ElementHandle> ElementRef<H> {
    pub fn new(handle: H, generation: u64) -> Self {
        Self { handle, generation }
    }

    /// Raw handle, for reads only.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reference identity, ignoring the generation stamp.
    pub fn same_element(&self, other: &ElementRef<H>) -> bool {
        self.handle == other.handle
    }
}

/// Proof that an element's role and title were re-checked right before use.
#[derive(Debug)]
pub struct ValidatedElement<'a, H> {
    handle: &'a H,
    role: String,
}

impl<'a, H: ElementHandle> ValidatedElement<'a, H> {
    pub(crate) fn new(handle: &'a H, role: String) -> Self {
        Self { handle, role }
    }

    pub fn handle(&self) -> &'a H {
        self.handle
    }

    /// Role observed during validation.
    pub fn role(&self) -> &str {
        &self.role
    }
}
