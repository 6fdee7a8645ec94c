//! Performs the activation a target's role calls for, with fallbacks

use crate::element::{Attribute, AttributeValue, ValidatedElement};
use crate::errors::ExecutionError;
use crate::platforms::{AccessibilityProvider, ActionOutcome, InputSynthesizer, ProviderExt};
use crate::roles;
use crate::types::{CoordinateSystem, Point, Profile, Rect, Target};
use crate::validator::MatchMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

mod stable;
mod volatile;

pub use stable::StableExecutor;
pub use volatile::VolatileExecutor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub match_mode: MatchMode,
    /// Levels searched for a pressable descendant once the target itself
    /// refuses every action.
    pub descendant_press_depth: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Relaxed,
            descendant_press_depth: 3,
        }
    }
}

/// How an execution ended up activating its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMethod {
    /// A named semantic action succeeded on the target.
    Action(String),
    Focus,
    Increment,
    /// Pressing flipped the value.
    Toggle,
    /// Pressing did not flip the value; it was written directly.
    ToggleWrite,
    Select,
    /// A descendant accepted the press.
    DescendantPress(String),
    SyntheticClick,
}

impl fmt::Display for ExecutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMethod::Action(action) => write!(f, "Action ({action})"),
            ExecutionMethod::Focus => f.write_str("Focus"),
            ExecutionMethod::Increment => f.write_str("Increment"),
            ExecutionMethod::Toggle => f.write_str("Toggle"),
            ExecutionMethod::ToggleWrite => f.write_str("Toggle (Value Write)"),
            ExecutionMethod::Select => f.write_str("Select"),
            ExecutionMethod::DescendantPress(role) => write!(f, "Descendant Press ({role})"),
            ExecutionMethod::SyntheticClick => f.write_str("Synthetic Click"),
        }
    }
}

/// What a successful execution did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    pub method: ExecutionMethod,
    pub coordinates: Option<Point>,
    pub details: String,
}

impl ActionReport {
    pub(crate) fn new(method: ExecutionMethod, details: impl Into<String>) -> Self {
        Self {
            method,
            coordinates: None,
            details: details.into(),
        }
    }
}

/// Everything an executor may touch.
pub struct ExecutionContext<'a, P: AccessibilityProvider> {
    pub provider: &'a P,
    pub input: &'a dyn InputSynthesizer,
    pub config: &'a ExecutorConfig,
}

/// Profile-specific activation of a discovered target.
pub trait ActionExecutor<P: AccessibilityProvider> {
    fn execute(
        &self,
        context: &ExecutionContext<'_, P>,
        target: &Target<P::Element>,
    ) -> Result<ActionReport, ExecutionError>;
}

pub struct ExecutorFactory;

impl ExecutorFactory {
    pub fn for_profile<P: AccessibilityProvider + 'static>(
        profile: Profile,
    ) -> Box<dyn ActionExecutor<P>> {
        match profile {
            Profile::Stable => Box::new(StableExecutor),
            Profile::Volatile => Box::new(VolatileExecutor),
        }
    }
}

/// Dispatches `target` to the executor for its profile.
#[instrument(level = "debug", skip(context, target), fields(title = %target.title, role = %target.role))]
pub fn execute<P: AccessibilityProvider + 'static>(
    context: &ExecutionContext<'_, P>,
    target: &Target<P::Element>,
) -> Result<ActionReport, ExecutionError> {
    let report = ExecutorFactory::for_profile::<P>(target.profile).execute(context, target)?;
    debug!(method = %report.method, "executed");
    Ok(report)
}

/// Result of one rung: done, try the next rung, or give up.
enum Step {
    Done(ActionReport),
    Next,
}

fn disabled(target_title: &str) -> ExecutionError {
    ExecutionError::TargetDisabled(format!("'{target_title}' is disabled"))
}

fn gone() -> ExecutionError {
    ExecutionError::ElementInvalid("element disappeared while acting on it".to_string())
}

fn focus<P: AccessibilityProvider>(
    provider: &P,
    element: &ValidatedElement<'_, P::Element>,
) -> Result<Step, ExecutionError> {
    match provider.set_attribute(element.handle(), Attribute::Focused, AttributeValue::Bool(true)) {
        ActionOutcome::Success => Ok(Step::Done(ActionReport::new(
            ExecutionMethod::Focus,
            "Focused by attribute write",
        ))),
        ActionOutcome::ElementGone => Err(gone()),
        _ => Ok(Step::Next),
    }
}

fn select<P: AccessibilityProvider>(
    provider: &P,
    element: &ValidatedElement<'_, P::Element>,
) -> Result<Step, ExecutionError> {
    match provider.set_attribute(element.handle(), Attribute::Selected, AttributeValue::Bool(true)) {
        ActionOutcome::Success => Ok(Step::Done(ActionReport::new(
            ExecutionMethod::Select,
            "Selected by attribute write",
        ))),
        ActionOutcome::ElementGone => Err(gone()),
        _ => Ok(Step::Next),
    }
}

/// Selection write that must read back as selected. Rows that also
/// advertise a press are left to the ladder.
fn verified_select<P: AccessibilityProvider>(
    provider: &P,
    element: &ValidatedElement<'_, P::Element>,
) -> Result<Step, ExecutionError> {
    let Step::Done(report) = select(provider, element)? else {
        return Ok(Step::Next);
    };
    let handle = element.handle();
    if provider.flag(handle, Attribute::Selected) != Some(true) {
        debug!("selection write did not stick, falling back to the ladder");
        return Ok(Step::Next);
    }
    if provider.has_action(handle, roles::PRESS) {
        debug!("selected row also presses, falling back to the ladder");
        return Ok(Step::Next);
    }
    Ok(Step::Done(report))
}

fn increment<P: AccessibilityProvider>(
    provider: &P,
    element: &ValidatedElement<'_, P::Element>,
) -> Result<Step, ExecutionError> {
    match provider.perform_action(element.handle(), roles::INCREMENT) {
        ActionOutcome::Success => Ok(Step::Done(ActionReport::new(
            ExecutionMethod::Increment,
            "Incremented once",
        ))),
        ActionOutcome::ElementGone => Err(gone()),
        _ => Ok(Step::Next),
    }
}

/// Press, then confirm the value flipped. When it did not, write the
/// complement directly and confirm again.
fn toggle<P: AccessibilityProvider>(
    provider: &P,
    element: &ValidatedElement<'_, P::Element>,
) -> Result<ActionReport, ExecutionError> {
    let handle = element.handle();
    let before = provider.flag(handle, Attribute::Value);

    let pressed = provider.perform_action(handle, roles::PRESS);
    if pressed == ActionOutcome::ElementGone {
        return Err(gone());
    }
    let after = provider.flag(handle, Attribute::Value);
    let before = match (before, after) {
        (Some(b), Some(a)) if a != b => {
            return Ok(ActionReport::new(
                ExecutionMethod::Toggle,
                format!("Value changed from {b} to {a}"),
            ))
        }
        (None, Some(a)) => {
            return Ok(ActionReport::new(
                ExecutionMethod::Toggle,
                format!("Value became readable as {a}"),
            ))
        }
        (None, None) => {
            return Err(ExecutionError::ActionFailed(
                "toggle value is unreadable, cannot verify the press".to_string(),
            ))
        }
        (Some(b), _) => b,
    };

    debug!(pressed = ?pressed, "toggle press did not flip the value, writing it");
    match provider.set_attribute(handle, Attribute::Value, AttributeValue::Bool(!before)) {
        ActionOutcome::ElementGone => return Err(gone()),
        ActionOutcome::Success if provider.flag(handle, Attribute::Value) == Some(!before) => {
            return Ok(ActionReport::new(
                ExecutionMethod::ToggleWrite,
                format!("Value written from {before} to {}", !before),
            ))
        }
        _ => {}
    }
    Err(ExecutionError::ActionFailed(
        "toggle did not change the value".to_string(),
    ))
}

/// Tries each semantic action in order. Unsupported actions move on; a
/// vanished element ends the ladder.
fn action_ladder<P: AccessibilityProvider>(
    provider: &P,
    element: &ValidatedElement<'_, P::Element>,
) -> Result<Step, ExecutionError> {
    for action in roles::FALLBACK_LADDER {
        match provider.perform_action(element.handle(), action) {
            ActionOutcome::Success => {
                return Ok(Step::Done(ActionReport::new(
                    ExecutionMethod::Action(action.to_string()),
                    format!("Performed {action}"),
                )))
            }
            ActionOutcome::ElementGone => return Err(gone()),
            ActionOutcome::UnsupportedAction => continue,
            other => debug!(action, ?other, "action did not complete, trying next"),
        }
    }
    Ok(Step::Next)
}

/// Breadth-first search for a descendant that accepts a press. Composite
/// rows often route activation through an inner button.
fn descendant_press<P: AccessibilityProvider>(
    provider: &P,
    element: &ValidatedElement<'_, P::Element>,
    depth: usize,
) -> Step {
    let mut level = provider.children_or_empty(element.handle());
    for _ in 0..depth {
        if level.is_empty() {
            break;
        }
        for child in &level {
            if !provider.has_action(child, roles::PRESS) {
                continue;
            }
            if provider.perform_action(child, roles::PRESS).is_success() {
                let role = provider.role(child).unwrap_or_default();
                return Step::Done(ActionReport::new(
                    ExecutionMethod::DescendantPress(role),
                    "Pressed a descendant",
                ));
            }
        }
        level = level
            .iter()
            .flat_map(|child| provider.children_or_empty(child))
            .collect();
    }
    Step::Next
}

/// Role-driven primary strategy followed by the shared ladder and the
/// descendant search.
fn semantic_activation<P: AccessibilityProvider>(
    context: &ExecutionContext<'_, P>,
    target: &Target<P::Element>,
    element: &ValidatedElement<'_, P::Element>,
) -> Result<Step, ExecutionError> {
    let provider = context.provider;
    let policy = roles::policy(element.role(), target.subrole.as_deref());

    let primary = match policy.primary {
        roles::PrimaryStrategy::Toggle => return toggle(provider, element).map(Step::Done),
        roles::PrimaryStrategy::Focus => focus(provider, element)?,
        roles::PrimaryStrategy::Increment => increment(provider, element)?,
        roles::PrimaryStrategy::Select => verified_select(provider, element)?,
        roles::PrimaryStrategy::Press => Step::Next,
    };
    if let Step::Done(report) = primary {
        return Ok(Step::Done(report));
    }

    if let Step::Done(report) = action_ladder(provider, element)? {
        return Ok(Step::Done(report));
    }
    Ok(descendant_press(
        provider,
        element,
        context.config.descendant_press_depth,
    ))
}

/// Synthetic click at the center of `frame`.
fn click_center(
    input: &dyn InputSynthesizer,
    frame: Option<Rect>,
    coordinates: CoordinateSystem,
) -> Result<ActionReport, ExecutionError> {
    let frame = frame
        .filter(Rect::is_usable)
        .ok_or_else(|| ExecutionError::ActionFailed("no usable frame to click".to_string()))?;
    let point = frame.center();
    debug!("clicking at center point: ({}, {})", point.x, point.y);
    input
        .click_at(point, coordinates)
        .map_err(|e| ExecutionError::ActionFailed(e.to_string()))?;
    Ok(ActionReport {
        method: ExecutionMethod::SyntheticClick,
        coordinates: Some(point),
        details: "Clicked by mouse using the cached frame's center".to_string(),
    })
}
