//! Role policy table.
//!
//! Per-role behavior is data: adding a role means adding a row, not a branch
//! in the crawler or the executors.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const APPLICATION: &str = "AXApplication";
pub const WINDOW: &str = "AXWindow";
pub const SHEET: &str = "AXSheet";
pub const BUTTON: &str = "AXButton";
pub const MENU_BUTTON: &str = "AXMenuButton";
pub const POP_UP_BUTTON: &str = "AXPopUpButton";
pub const CHECK_BOX: &str = "AXCheckBox";
pub const RADIO_BUTTON: &str = "AXRadioButton";
pub const LINK: &str = "AXLink";
pub const MENU_BAR: &str = "AXMenuBar";
pub const MENU_BAR_ITEM: &str = "AXMenuBarItem";
pub const MENU: &str = "AXMenu";
pub const MENU_ITEM: &str = "AXMenuItem";
pub const TEXT_FIELD: &str = "AXTextField";
pub const TEXT_AREA: &str = "AXTextArea";
pub const COMBO_BOX: &str = "AXComboBox";
pub const SLIDER: &str = "AXSlider";
pub const INCREMENTOR: &str = "AXIncrementor";
pub const DISCLOSURE_TRIANGLE: &str = "AXDisclosureTriangle";
pub const ROW: &str = "AXRow";
pub const CELL: &str = "AXCell";
pub const LIST: &str = "AXList";
pub const TABLE: &str = "AXTable";
pub const OUTLINE: &str = "AXOutline";
pub const SCROLL_AREA: &str = "AXScrollArea";
pub const TOOLBAR: &str = "AXToolbar";
pub const GROUP: &str = "AXGroup";
pub const SPLIT_GROUP: &str = "AXSplitGroup";
pub const TAB_GROUP: &str = "AXTabGroup";
pub const RADIO_GROUP: &str = "AXRadioGroup";
pub const WEB_AREA: &str = "AXWebArea";
pub const STATIC_TEXT: &str = "AXStaticText";
pub const IMAGE: &str = "AXImage";
pub const COLUMN: &str = "AXColumn";
pub const LAYOUT_AREA: &str = "AXLayoutArea";

pub const SWITCH_SUBROLE: &str = "AXSwitch";
pub const SEARCH_FIELD_SUBROLE: &str = "AXSearchField";
pub const OUTLINE_ROW_SUBROLE: &str = "AXOutlineRow";
pub const TAB_BUTTON_SUBROLE: &str = "AXTabButton";
pub const CLOSE_BUTTON_SUBROLE: &str = "AXCloseButton";
pub const MINIMIZE_BUTTON_SUBROLE: &str = "AXMinimizeButton";
pub const ZOOM_BUTTON_SUBROLE: &str = "AXZoomButton";
pub const FULL_SCREEN_BUTTON_SUBROLE: &str = "AXFullScreenButton";

pub const PRESS: &str = "AXPress";
pub const SELECT: &str = "AXSelect";
pub const CONFIRM: &str = "AXConfirm";
pub const SHOW_DEFAULT_UI: &str = "AXShowDefaultUI";
pub const PICK: &str = "AXPick";
pub const INCREMENT: &str = "AXIncrement";
pub const DECREMENT: &str = "AXDecrement";
pub const RAISE: &str = "AXRaise";

/// Actions that make a stable-tree element worth a hint.
pub const SEMANTIC_ACTIONS: &[&str] = &[
    PRESS,
    SELECT,
    CONFIRM,
    SHOW_DEFAULT_UI,
    PICK,
    INCREMENT,
    DECREMENT,
];

/// Generic fallback ladder, tried in order.
pub const FALLBACK_LADDER: &[&str] = &[PRESS, SELECT, CONFIRM, SHOW_DEFAULT_UI];

/// How a display title is derived for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleStrategy {
    /// Attribute chain only.
    Direct,
    /// Attribute chain, then descendants, then siblings and uncles.
    Composite,
    /// Attribute chain, then a name derived from the URL.
    Link,
    /// No title: the role (or subrole) names the control.
    RoleOnly,
}

/// First strategy the executor tries for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryStrategy {
    Press,
    Focus,
    Increment,
    Toggle,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePolicy {
    pub container: bool,
    pub actionable: bool,
    pub title: TitleStrategy,
    pub primary: PrimaryStrategy,
}

impl RolePolicy {
    const fn container() -> Self {
        Self {
            container: true,
            actionable: false,
            title: TitleStrategy::Direct,
            primary: PrimaryStrategy::Press,
        }
    }

    const fn actionable(title: TitleStrategy, primary: PrimaryStrategy) -> Self {
        Self {
            container: false,
            actionable: true,
            title,
            primary,
        }
    }

    const fn inert() -> Self {
        Self {
            container: false,
            actionable: false,
            title: TitleStrategy::Direct,
            primary: PrimaryStrategy::Press,
        }
    }

    pub fn is_row_like(&self) -> bool {
        self.primary == PrimaryStrategy::Select
    }
}

static ROLE_POLICIES: Lazy<HashMap<&'static str, RolePolicy>> = Lazy::new(|| {
    use PrimaryStrategy as P;
    use TitleStrategy as T;

    let mut table = HashMap::new();
    for role in [
        LIST, TABLE, OUTLINE, SCROLL_AREA, TOOLBAR, MENU, MENU_BAR, GROUP, SPLIT_GROUP,
        TAB_GROUP, RADIO_GROUP, WEB_AREA, WINDOW, SHEET, APPLICATION, COLUMN, LAYOUT_AREA,
    ] {
        table.insert(role, RolePolicy::container());
    }
    for role in [BUTTON, MENU_BUTTON, POP_UP_BUTTON, MENU_ITEM, MENU_BAR_ITEM, DISCLOSURE_TRIANGLE] {
        table.insert(role, RolePolicy::actionable(T::Direct, P::Press));
    }
    table.insert(RADIO_BUTTON, RolePolicy::actionable(T::Composite, P::Press));
    table.insert(LINK, RolePolicy::actionable(T::Link, P::Press));
    table.insert(CHECK_BOX, RolePolicy::actionable(T::Composite, P::Toggle));
    for role in [TEXT_FIELD, TEXT_AREA, COMBO_BOX] {
        table.insert(role, RolePolicy::actionable(T::Direct, P::Focus));
    }
    table.insert(SLIDER, RolePolicy::actionable(T::Composite, P::Focus));
    table.insert(INCREMENTOR, RolePolicy::actionable(T::Composite, P::Increment));
    for role in [ROW, CELL] {
        table.insert(role, RolePolicy::actionable(T::Composite, P::Select));
    }
    for role in [STATIC_TEXT, IMAGE] {
        table.insert(role, RolePolicy::inert());
    }
    table
});

static SUBROLE_POLICIES: Lazy<HashMap<&'static str, RolePolicy>> = Lazy::new(|| {
    use PrimaryStrategy as P;
    use TitleStrategy as T;

    let mut table = HashMap::new();
    table.insert(SWITCH_SUBROLE, RolePolicy::actionable(T::Composite, P::Toggle));
    table.insert(SEARCH_FIELD_SUBROLE, RolePolicy::actionable(T::Direct, P::Focus));
    table.insert(OUTLINE_ROW_SUBROLE, RolePolicy::actionable(T::Composite, P::Select));
    table.insert(TAB_BUTTON_SUBROLE, RolePolicy::actionable(T::Direct, P::Press));
    for subrole in WINDOW_CHROME_SUBROLES {
        table.insert(*subrole, RolePolicy::actionable(T::RoleOnly, P::Press));
    }
    table
});

/// Window title-bar controls. They carry no title.
pub const WINDOW_CHROME_SUBROLES: &[&str] = &[
    CLOSE_BUTTON_SUBROLE,
    MINIMIZE_BUTTON_SUBROLE,
    ZOOM_BUTTON_SUBROLE,
    FULL_SCREEN_BUTTON_SUBROLE,
];

/// Policy for a role, refined by its subrole when the subrole has a row.
/// Unknown roles are neither containers nor actionable.
pub fn policy(role: &str, subrole: Option<&str>) -> RolePolicy {
    subrole
        .and_then(|s| SUBROLE_POLICIES.get(s))
        .or_else(|| ROLE_POLICIES.get(role))
        .copied()
        .unwrap_or_else(RolePolicy::inert)
}

pub fn is_container(role: &str) -> bool {
    ROLE_POLICIES.get(role).is_some_and(|p| p.container)
}

pub fn is_window_chrome(subrole: Option<&str>) -> bool {
    subrole.is_some_and(|s| WINDOW_CHROME_SUBROLES.contains(&s))
}

/// Display name for a title-less window control.
pub fn window_chrome_title(subrole: &str) -> Option<&'static str> {
    match subrole {
        CLOSE_BUTTON_SUBROLE => Some("Close"),
        MINIMIZE_BUTTON_SUBROLE => Some("Minimize"),
        ZOOM_BUTTON_SUBROLE => Some("Zoom"),
        FULL_SCREEN_BUTTON_SUBROLE => Some("Full Screen"),
        _ => None,
    }
}

/// Roles the volatile-tree executor accepts as "still the same control":
/// embedded content routinely re-reports a link as a group or a button.
pub const VOLATILE_EQUIVALENT_ROLES: &[&str] = &[
    BUTTON, LINK, GROUP, STATIC_TEXT, IMAGE, CHECK_BOX, RADIO_BUTTON, MENU_ITEM, POP_UP_BUTTON,
    TEXT_FIELD, TEXT_AREA, COMBO_BOX, ROW, CELL,
];
