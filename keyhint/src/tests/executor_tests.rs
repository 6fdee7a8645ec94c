use super::*;
use crate::crawler::{self, CancellationFlag, CrawlConfig};
use crate::element::AttributeValue;
use crate::errors::ExecutionError;
use crate::executor::{self, ExecutionContext, ExecutionMethod, ExecutorConfig};
use crate::platforms::memory::{ActionEffect, MemoryTree, RecordingInput};
use crate::platforms::ActionOutcome;
use crate::types::Point;

struct Harness {
    tree: MemoryTree,
    window: NodeId,
    input: RecordingInput,
    config: ExecutorConfig,
}

impl Harness {
    fn new() -> Self {
        let (tree, _, window) = app_with_window("Main");
        Self {
            tree,
            window,
            input: RecordingInput::new(),
            config: ExecutorConfig::default(),
        }
    }

    fn add(&self, spec: NodeSpec) -> NodeId {
        self.tree.add_child(self.window, spec)
    }

    fn run(&self, target: &Target<NodeId>) -> Result<crate::executor::ActionReport, ExecutionError> {
        let context = ExecutionContext {
            provider: &self.tree,
            input: &self.input,
            config: &self.config,
        };
        executor::execute(&context, target)
    }
}

#[test]
fn disabled_target_fails_without_touching_the_provider() {
    init_tracing();
    let h = Harness::new();
    let node = h.add(button("Send"));
    let mut t = target(node, "Send", BUTTON, Profile::Stable);
    t.is_enabled = false;

    let before = h.tree.call_count();
    let err = h.run(&t).unwrap_err();
    assert!(matches!(err, ExecutionError::TargetDisabled(_)));
    assert_eq!(h.tree.call_count(), before);

    t.profile = Profile::Volatile;
    assert!(matches!(h.run(&t), Err(ExecutionError::TargetDisabled(_))));
    assert_eq!(h.tree.call_count(), before);
}

#[test]
fn button_is_pressed() {
    let h = Harness::new();
    let node = h.add(button("Send"));
    let report = h.run(&target(node, "Send", BUTTON, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Action(PRESS.to_string()));
    assert_eq!(h.tree.performed_actions(), vec![(node, PRESS.to_string())]);
}

#[test]
fn relaxed_title_survives_a_counter_suffix() {
    let h = Harness::new();
    let node = h.add(button("Inbox (3)"));
    assert!(h.run(&target(node, "Inbox", BUTTON, Profile::Stable)).is_ok());

    let renamed = h.add(button("Outbox"));
    let err = h
        .run(&target(renamed, "Inbox", BUTTON, Profile::Stable))
        .unwrap_err();
    assert!(matches!(err, ExecutionError::ElementInvalid(_)));
}

#[test]
fn stale_stable_target_is_invalid() {
    let h = Harness::new();
    let node = h.add(button("Send"));
    h.tree.remove(node);
    let err = h
        .run(&target(node, "Send", BUTTON, Profile::Stable))
        .unwrap_err();
    assert!(matches!(err, ExecutionError::ElementInvalid(_)));
    assert!(h.input.clicks().is_empty());
}

#[test]
fn ladder_skips_unsupported_actions() {
    let h = Harness::new();
    let node = h.add(NodeSpec::new(BUTTON).title("Go").action(CONFIRM));
    let report = h.run(&target(node, "Go", BUTTON, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Action(CONFIRM.to_string()));
    assert_eq!(h.tree.performed_actions(), vec![(node, CONFIRM.to_string())]);
}

#[test]
fn ladder_continues_after_a_failed_action() {
    let h = Harness::new();
    let node = h.add(
        NodeSpec::new(BUTTON)
            .title("Go")
            .action_with(PRESS, ActionEffect::Outcome(ActionOutcome::CannotComplete))
            .action(SELECT),
    );
    let report = h.run(&target(node, "Go", BUTTON, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Action(SELECT.to_string()));
}

#[test]
fn ladder_stops_when_the_element_vanishes() {
    let h = Harness::new();
    let node = h.add(
        NodeSpec::new(BUTTON)
            .title("Go")
            .action_with(PRESS, ActionEffect::Outcome(ActionOutcome::ElementGone))
            .action(SELECT),
    );
    let err = h
        .run(&target(node, "Go", BUTTON, Profile::Stable))
        .unwrap_err();
    assert!(matches!(err, ExecutionError::ElementInvalid(_)));
    assert_eq!(h.tree.performed_actions(), vec![(node, PRESS.to_string())]);
}

#[test]
fn toggle_verifies_the_value_flipped() {
    let h = Harness::new();
    let node = h.add(
        NodeSpec::new(CHECK_BOX)
            .title("Bold")
            .value_bool(false)
            .action_with(PRESS, ActionEffect::ToggleValue),
    );
    let report = h.run(&target(node, "Bold", CHECK_BOX, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Toggle);
    assert_eq!(h.tree.value(node, Attribute::Value), Some(AttributeValue::Bool(true)));
    assert!(h.tree.writes().is_empty());
}

#[test]
fn toggle_writes_the_value_when_press_does_nothing() {
    let h = Harness::new();
    let node = h.add(
        NodeSpec::new(CHECK_BOX)
            .title("Bold")
            .value_bool(false)
            .action(PRESS)
            .writable(Attribute::Value),
    );
    let report = h.run(&target(node, "Bold", CHECK_BOX, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::ToggleWrite);
    assert_eq!(h.tree.value(node, Attribute::Value), Some(AttributeValue::Bool(true)));
}

#[test]
fn toggle_fails_when_nothing_changes_the_value() {
    let h = Harness::new();
    let node = h.add(
        NodeSpec::new(CHECK_BOX)
            .subrole(SWITCH_SUBROLE)
            .title("Wi-Fi")
            .value_bool(true)
            .action(PRESS),
    );
    let mut t = target(node, "Wi-Fi", CHECK_BOX, Profile::Stable);
    t.subrole = Some(SWITCH_SUBROLE.to_string());
    let err = h.run(&t).unwrap_err();
    assert!(matches!(err, ExecutionError::ActionFailed(_)));
    assert_eq!(h.tree.value(node, Attribute::Value), Some(AttributeValue::Bool(true)));
}

#[test]
fn toggle_without_a_readable_value_fails() {
    let h = Harness::new();
    let node = h.add(NodeSpec::new(CHECK_BOX).title("Bold").action(PRESS));
    let err = h
        .run(&target(node, "Bold", CHECK_BOX, Profile::Stable))
        .unwrap_err();
    assert!(matches!(err, ExecutionError::ActionFailed(_)));
    assert_eq!(h.tree.performed_actions(), vec![(node, PRESS.to_string())]);
}

#[test]
fn toggle_value_appearing_after_the_press_counts() {
    let h = Harness::new();
    let node = h.add(
        NodeSpec::new(CHECK_BOX)
            .title("Bold")
            .action_with(PRESS, ActionEffect::ToggleValue),
    );
    let report = h.run(&target(node, "Bold", CHECK_BOX, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Toggle);
    assert_eq!(h.tree.value(node, Attribute::Value), Some(AttributeValue::Bool(true)));
}

#[test]
fn text_field_is_focused() {
    let h = Harness::new();
    let node = h.add(
        NodeSpec::new(TEXT_FIELD)
            .placeholder("Search")
            .writable(Attribute::Focused),
    );
    let report = h.run(&target(node, "Search", TEXT_FIELD, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Focus);
    assert_eq!(
        h.tree.writes(),
        vec![(node, Attribute::Focused, AttributeValue::Bool(true))]
    );
}

#[test]
fn incrementor_steps_once() {
    let h = Harness::new();
    let node = h.add(
        NodeSpec::new(INCREMENTOR)
            .description("Font size")
            .value_number(12.0)
            .action_with(INCREMENT, ActionEffect::IncrementValue),
    );
    let report = h
        .run(&target(node, "Font size", INCREMENTOR, Profile::Stable))
        .unwrap();
    assert_eq!(report.method, ExecutionMethod::Increment);
    assert_eq!(h.tree.value(node, Attribute::Value), Some(AttributeValue::Number(13.0)));
}

#[test]
fn row_is_selected() {
    let h = Harness::new();
    let row = h.add(NodeSpec::new(ROW).writable(Attribute::Selected));
    h.tree.add_child(row, text("Drafts"));
    let report = h.run(&target(row, "Drafts", ROW, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Select);
}

#[test]
fn selectable_row_that_also_presses_is_pressed() {
    let h = Harness::new();
    let row = h.add(
        NodeSpec::new(ROW)
            .title("Drafts")
            .writable(Attribute::Selected)
            .action(PRESS),
    );
    let report = h.run(&target(row, "Drafts", ROW, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Action(PRESS.to_string()));
    assert_eq!(h.tree.performed_actions(), vec![(row, PRESS.to_string())]);
}

#[test]
fn selection_that_cannot_be_read_back_is_not_trusted() {
    let h = Harness::new();
    let row = h.add(
        NodeSpec::new(ROW)
            .title("Drafts")
            .writable(Attribute::Selected)
            .unreadable(Attribute::Selected)
            .action(SELECT),
    );
    let report = h.run(&target(row, "Drafts", ROW, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Action(SELECT.to_string()));
    assert_eq!(h.tree.writes().len(), 1);
}

#[test]
fn descendant_press_is_the_last_semantic_resort() {
    let h = Harness::new();
    let row = h.add(NodeSpec::new(ROW));
    h.tree.add_child(row, text("Meeting"));
    let cell = h.tree.add_child(row, NodeSpec::new(CELL));
    let join = h.tree.add_child(cell, button("Join"));

    let report = h.run(&target(row, "Meeting", ROW, Profile::Stable)).unwrap();
    assert_eq!(report.method, ExecutionMethod::DescendantPress(BUTTON.to_string()));
    assert_eq!(h.tree.performed_actions(), vec![(join, PRESS.to_string())]);
}

#[test]
fn stable_targets_never_click() {
    let h = Harness::new();
    let node = h.add(NodeSpec::new(BUTTON).title("Inert"));
    let mut t = target(node, "Inert", BUTTON, Profile::Stable);
    t.cached_frame = Some(Rect::new(0.0, 0.0, 20.0, 20.0));
    let err = h.run(&t).unwrap_err();
    assert!(matches!(err, ExecutionError::ActionFailed(_)));
    assert!(h.input.clicks().is_empty());
}

#[test]
fn volatile_target_that_changed_is_clicked_at_its_frame() {
    let h = Harness::new();
    let node = h.add(NodeSpec::new(LINK).title("Docs").action(PRESS));
    h.tree.remove(node);
    let mut t = target(node, "Docs", LINK, Profile::Volatile);
    t.cached_frame = Some(Rect::new(100.0, 200.0, 40.0, 20.0));

    let report = h.run(&t).unwrap();
    assert_eq!(report.method, ExecutionMethod::SyntheticClick);
    assert_eq!(report.coordinates, Some(Point::new(120.0, 210.0)));
    assert_eq!(
        h.input.clicks(),
        vec![(Point::new(120.0, 210.0), CoordinateSystem::ScreenLocal)]
    );
}

#[test]
fn volatile_role_drift_is_tolerated() {
    let h = Harness::new();
    // Re-rendered as a group with the same label.
    let node = h.add(NodeSpec::new(GROUP).title("Docs").action(PRESS));
    let report = h.run(&target(node, "Docs", LINK, Profile::Volatile)).unwrap();
    assert_eq!(report.method, ExecutionMethod::Action(PRESS.to_string()));
    assert!(h.input.clicks().is_empty());
}

#[test]
fn volatile_row_falls_back_to_click() {
    let h = Harness::new();
    let row = h.add(NodeSpec::new(ROW).title("Result 1"));
    let mut t = target(row, "Result 1", ROW, Profile::Volatile);
    t.cached_frame = Some(Rect::new(0.0, 0.0, 200.0, 40.0));
    let report = h.run(&t).unwrap();
    assert_eq!(report.method, ExecutionMethod::SyntheticClick);
}

#[test]
fn volatile_row_is_clicked_after_selecting() {
    let h = Harness::new();
    let row = h.add(
        NodeSpec::new(ROW)
            .title("Result 1")
            .writable(Attribute::Selected),
    );
    let mut t = target(row, "Result 1", ROW, Profile::Volatile);
    t.cached_frame = Some(Rect::new(0.0, 0.0, 200.0, 40.0));

    let report = h.run(&t).unwrap();
    assert_eq!(report.method, ExecutionMethod::SyntheticClick);
    assert_eq!(h.tree.value(row, Attribute::Selected), Some(AttributeValue::Bool(true)));
    assert_eq!(
        h.input.clicks(),
        vec![(Point::new(100.0, 20.0), CoordinateSystem::ScreenLocal)]
    );
}

#[test]
fn volatile_row_without_a_frame_keeps_the_selection() {
    let h = Harness::new();
    let row = h.add(
        NodeSpec::new(ROW)
            .title("Result 1")
            .writable(Attribute::Selected),
    );
    let report = h
        .run(&target(row, "Result 1", ROW, Profile::Volatile))
        .unwrap();
    assert_eq!(report.method, ExecutionMethod::Select);
    assert!(h.input.clicks().is_empty());

    let inert = h.add(NodeSpec::new(ROW).title("Result 2"));
    let err = h
        .run(&target(inert, "Result 2", ROW, Profile::Volatile))
        .unwrap_err();
    assert!(matches!(err, ExecutionError::ActionFailed(_)));
}

#[test]
fn volatile_click_failure_is_reported() {
    let h = Harness::new();
    let node = h.add(NodeSpec::new(BUTTON).title("Pay"));
    let mut t = target(node, "Pay", BUTTON, Profile::Volatile);
    t.cached_frame = Some(Rect::new(0.0, 0.0, 50.0, 20.0));
    h.input.fail_clicks(true);
    let err = h.run(&t).unwrap_err();
    assert!(matches!(err, ExecutionError::ActionFailed(_)));
}

#[test]
fn gone_volatile_target_without_frame_is_invalid() {
    let h = Harness::new();
    let node = h.add(NodeSpec::new(LINK).title("Docs"));
    h.tree.remove(node);
    let err = h
        .run(&target(node, "Docs", LINK, Profile::Volatile))
        .unwrap_err();
    assert!(matches!(err, ExecutionError::ElementInvalid(_)));
}

#[test]
fn deep_row_title_validates_at_the_crawl_depth() {
    let h = Harness::new();
    let table = h.add(NodeSpec::new(TABLE));
    let row = h
        .tree
        .add_child(table, NodeSpec::new(ROW).writable(Attribute::Selected));
    let outer = h.tree.add_child(row, NodeSpec::new(GROUP));
    let inner = h.tree.add_child(outer, NodeSpec::new(GROUP));
    h.tree.add_child(inner, text("Quarterly report"));

    let config = CrawlConfig {
        descendant_title_depth: 3,
        ..CrawlConfig::default()
    };
    let targets = crawler::discover(&h.tree, PID, &config, &CancellationFlag::new()).unwrap();
    assert_eq!(titles(&targets), vec!["Quarterly report"]);
    assert_eq!(targets[0].title_depth, 3);

    let report = h.run(&targets[0]).unwrap();
    assert_eq!(report.method, ExecutionMethod::Select);

    let mut shallow = targets[0].clone();
    shallow.title_depth = 2;
    assert!(matches!(h.run(&shallow), Err(ExecutionError::ElementInvalid(_))));
}
