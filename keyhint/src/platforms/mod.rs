use crate::element::{Attribute, AttributeValue, ElementHandle};
use crate::errors::ProviderError;
use crate::types::{CoordinateSystem, Point, ProcessId, Rect};
use serde::{Deserialize, Serialize};

pub mod memory;

/// Result code of performing an action or writing an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Success,
    UnsupportedAction,
    ElementGone,
    CannotComplete,
    Other(i32),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }
}

/// The accessibility service of the host platform.
///
/// Implementations are only ever called from the UI-affinity thread owned by
/// [`crate::ui_thread::UiThread`], so they need not be `Send` or `Sync`.
pub trait AccessibilityProvider {
    type Element: ElementHandle;

    /// Whether this process has been granted accessibility access.
    fn is_trusted(&self) -> bool;

    /// Application element for a running process.
    fn application(&self, pid: ProcessId) -> Result<Self::Element, ProviderError>;

    fn attribute(
        &self,
        element: &Self::Element,
        attribute: Attribute,
    ) -> Result<AttributeValue, ProviderError>;

    /// Element-valued attribute such as the focused window or a window's
    /// close button. `Ok(None)` when the element has no such attribute value.
    fn element_attribute(
        &self,
        element: &Self::Element,
        attribute: Attribute,
    ) -> Result<Option<Self::Element>, ProviderError>;

    fn children(&self, element: &Self::Element) -> Result<Vec<Self::Element>, ProviderError>;

    fn parent(&self, element: &Self::Element) -> Result<Option<Self::Element>, ProviderError>;

    fn action_names(&self, element: &Self::Element) -> Result<Vec<String>, ProviderError>;

    fn perform_action(&self, element: &Self::Element, action: &str) -> ActionOutcome;

    fn set_attribute(
        &self,
        element: &Self::Element,
        attribute: Attribute,
        value: AttributeValue,
    ) -> ActionOutcome;
}

impl<P: AccessibilityProvider + ?Sized> AccessibilityProvider for std::sync::Arc<P> {
    type Element = P::Element;

    fn is_trusted(&self) -> bool {
        (**self).is_trusted()
    }

    fn application(&self, pid: ProcessId) -> Result<Self::Element, ProviderError> {
        (**self).application(pid)
    }

    fn attribute(
        &self,
        element: &Self::Element,
        attribute: Attribute,
    ) -> Result<AttributeValue, ProviderError> {
        (**self).attribute(element, attribute)
    }

    fn element_attribute(
        &self,
        element: &Self::Element,
        attribute: Attribute,
    ) -> Result<Option<Self::Element>, ProviderError> {
        (**self).element_attribute(element, attribute)
    }

    fn children(&self, element: &Self::Element) -> Result<Vec<Self::Element>, ProviderError> {
        (**self).children(element)
    }

    fn parent(&self, element: &Self::Element) -> Result<Option<Self::Element>, ProviderError> {
        (**self).parent(element)
    }

    fn action_names(&self, element: &Self::Element) -> Result<Vec<String>, ProviderError> {
        (**self).action_names(element)
    }

    fn perform_action(&self, element: &Self::Element, action: &str) -> ActionOutcome {
        (**self).perform_action(element, action)
    }

    fn set_attribute(
        &self,
        element: &Self::Element,
        attribute: Attribute,
        value: AttributeValue,
    ) -> ActionOutcome {
        (**self).set_attribute(element, attribute, value)
    }
}

/// Posts synthetic mouse input. Used as the last rung of the executor ladder.
pub trait InputSynthesizer {
    fn click_at(&self, point: Point, coordinates: CoordinateSystem) -> Result<(), ProviderError>;
}

impl<I: InputSynthesizer + ?Sized> InputSynthesizer for Box<I> {
    fn click_at(&self, point: Point, coordinates: CoordinateSystem) -> Result<(), ProviderError> {
        (**self).click_at(point, coordinates)
    }
}

/// Typed, failure-tolerant reads on top of [`AccessibilityProvider`].
///
/// Every helper maps "unavailable" and "unreadable" to `None`; callers in the
/// crawler treat that as "skip", never as an error.
pub trait ProviderExt: AccessibilityProvider {
    fn text(&self, element: &Self::Element, attribute: Attribute) -> Option<String> {
        self.attribute(element, attribute)
            .ok()
            .and_then(|v| v.as_text().map(str::to_string))
    }

    fn flag(&self, element: &Self::Element, attribute: Attribute) -> Option<bool> {
        self.attribute(element, attribute)
            .ok()
            .and_then(|v| v.as_bool())
    }

    fn number(&self, element: &Self::Element, attribute: Attribute) -> Option<f64> {
        self.attribute(element, attribute)
            .ok()
            .and_then(|v| v.as_number())
    }

    fn role(&self, element: &Self::Element) -> Option<String> {
        self.text(element, Attribute::Role)
    }

    fn subrole(&self, element: &Self::Element) -> Option<String> {
        self.text(element, Attribute::Subrole)
    }

    /// Enabled unless the provider says otherwise.
    fn is_enabled(&self, element: &Self::Element) -> bool {
        self.flag(element, Attribute::Enabled).unwrap_or(true)
    }

    /// Frame from position + size.
    fn position_frame(&self, element: &Self::Element) -> Option<Rect> {
        let origin = match self.attribute(element, Attribute::Position).ok()? {
            AttributeValue::Point(p) => p,
            _ => return None,
        };
        let size = match self.attribute(element, Attribute::Size).ok()? {
            AttributeValue::Size(s) => s,
            _ => return None,
        };
        Some(Rect::from_origin_size(origin, size))
    }

    /// Frame from the explicit frame attribute.
    fn explicit_frame(&self, element: &Self::Element) -> Option<Rect> {
        match self.attribute(element, Attribute::Frame).ok()? {
            AttributeValue::Rect(r) => Some(r),
            _ => None,
        }
    }

    fn has_action(&self, element: &Self::Element, action: &str) -> bool {
        self.action_names(element)
            .map(|actions| actions.iter().any(|a| a == action))
            .unwrap_or(false)
    }

    fn children_or_empty(&self, element: &Self::Element) -> Vec<Self::Element> {
        self.children(element).unwrap_or_default()
    }
}

impl<P: AccessibilityProvider + ?Sized> ProviderExt for P {}
