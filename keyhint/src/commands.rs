//! Searchable command list: menu items, sidebar rows, toolbar buttons and
//! windows of an application

use crate::crawler::{self, CrawlConfig};
use crate::element::{Attribute, ElementHandle, ElementRef};
use crate::errors::{DiscoveryError, ExecutionError};
use crate::executor::{self, ActionReport, ExecutionContext, ExecutionMethod};
use crate::platforms::{AccessibilityProvider, ActionOutcome, ProviderExt};
use crate::roles;
use crate::title;
use crate::validator::{self, Expectation};
use crate::types::{
    CommandId, CommandItem, CommandKind, CoordinateSystem, ProcessId, Profile, Target, TargetId,
};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// `AXMenuItemCmdModifiers` bits.
const MODIFIER_SHIFT: u32 = 1 << 0;
const MODIFIER_OPTION: u32 = 1 << 1;
const MODIFIER_CONTROL: u32 = 1 << 2;
const MODIFIER_NO_COMMAND: u32 = 1 << 3;

/// Renders a menu shortcut as glyphs in `⌃⌥⇧⌘` order followed by the key.
pub fn format_shortcut(key: &str, modifiers: u32) -> String {
    let mut hint = String::new();
    if modifiers & MODIFIER_CONTROL != 0 {
        hint.push('⌃');
    }
    if modifiers & MODIFIER_OPTION != 0 {
        hint.push('⌥');
    }
    if modifiers & MODIFIER_SHIFT != 0 {
        hint.push('⇧');
    }
    if modifiers & MODIFIER_NO_COMMAND == 0 {
        hint.push('⌘');
    }
    hint.push_str(&key.to_uppercase());
    hint
}

/// Role an item of `kind` is expected to have when it is executed.
pub fn expected_role(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::Menu => roles::MENU_ITEM,
        CommandKind::Sidebar => roles::ROW,
        CommandKind::Button => roles::BUTTON,
        CommandKind::Window => roles::WINDOW,
    }
}

impl<H: ElementHandle> CommandItem<H> {
    /// Stable-profile target for handing the item to an executor.
    pub fn to_target(&self) -> Target<H> {
        Target {
            id: TargetId::new(),
            title: self.title.clone(),
            role: expected_role(self.kind).to_string(),
            subrole: None,
            title_depth: title::DEFAULT_DESCENDANT_DEPTH,
            path: self.path[..self.path.len().saturating_sub(1)].to_vec(),
            element: self.element.clone(),
            is_enabled: self.is_enabled,
            cached_frame: None,
            profile: Profile::Stable,
            coordinate_system: CoordinateSystem::TopLeftOrigin,
        }
    }
}

struct Collector<H> {
    items: Vec<CommandItem<H>>,
    ordinals: HashMap<(CommandKind, Vec<String>), usize>,
    generation: u64,
}

impl<H: ElementHandle> Collector<H> {
    fn push(
        &mut self,
        kind: CommandKind,
        path: Vec<String>,
        shortcut_hint: Option<String>,
        element: H,
        is_enabled: bool,
    ) {
        let Some(title) = path.last().cloned() else {
            return;
        };
        let ordinal = self.ordinals.entry((kind, path.clone())).or_insert(0);
        let id = CommandId::new(kind, &path, *ordinal);
        *ordinal += 1;
        self.items.push(CommandItem {
            id,
            title,
            path,
            shortcut_hint,
            element: ElementRef::new(element, self.generation),
            is_enabled,
            kind,
        });
    }
}

/// Collects every command item of `pid`'s application.
///
/// Menu items come first in menu-bar order, then sidebar rows and toolbar
/// buttons of the focused window, then the application's windows. A missing
/// window is not an error here: menus are still listed.
#[instrument(level = "debug", skip(provider, config))]
pub fn discover_commands<P: AccessibilityProvider>(
    provider: &P,
    pid: ProcessId,
    config: &CrawlConfig,
) -> Result<Vec<CommandItem<P::Element>>, DiscoveryError> {
    if !provider.is_trusted() {
        return Err(DiscoveryError::PermissionDenied(format!(
            "process is not trusted to inspect pid {pid}"
        )));
    }
    let application = provider.application(pid)?;
    let mut collector = Collector {
        items: Vec::new(),
        ordinals: HashMap::new(),
        generation: crawler::next_generation(),
    };

    if let Ok(Some(menu_bar)) = provider.element_attribute(&application, Attribute::MenuBar) {
        // The first bar item is the system menu.
        for bar_item in provider.children_or_empty(&menu_bar).iter().skip(1) {
            let Some(name) = provider.text(bar_item, Attribute::Title) else {
                continue;
            };
            for menu in provider.children_or_empty(bar_item) {
                collect_menu(provider, &menu, vec![name.clone()], 1, config, &mut collector);
            }
        }
    }

    match crawler::focused_window(provider, pid) {
        Ok((_, window)) => collect_window(provider, &window, 0, false, config, &mut collector),
        Err(e) => debug!("no window for sidebar and toolbar commands: {}", e),
    }

    for window in provider.children_or_empty(&application) {
        if provider.role(&window).as_deref() != Some(roles::WINDOW) {
            continue;
        }
        if let Some(name) = provider.text(&window, Attribute::Title) {
            let enabled = provider.is_enabled(&window);
            collector.push(CommandKind::Window, vec![name], None, window, enabled);
        }
    }

    info!(
        "Command discovery completed for PID: {}. items={}",
        pid,
        collector.items.len()
    );
    Ok(collector.items)
}

fn collect_menu<P: AccessibilityProvider>(
    provider: &P,
    menu: &P::Element,
    path: Vec<String>,
    depth: usize,
    config: &CrawlConfig,
    collector: &mut Collector<P::Element>,
) {
    if depth > config.max_depth {
        return;
    }
    for item in provider.children_or_empty(menu) {
        if provider.role(&item).as_deref() != Some(roles::MENU_ITEM) {
            continue;
        }
        // Separators have no title.
        let Some(name) = provider.text(&item, Attribute::Title) else {
            continue;
        };
        let mut item_path = path.clone();
        item_path.push(name);

        let submenus: Vec<_> = provider
            .children_or_empty(&item)
            .into_iter()
            .filter(|child| provider.role(child).as_deref() == Some(roles::MENU))
            .collect();
        if !submenus.is_empty() {
            for submenu in &submenus {
                collect_menu(provider, submenu, item_path.clone(), depth + 1, config, collector);
            }
            continue;
        }

        let shortcut = provider
            .text(&item, Attribute::MenuItemCmdChar)
            .map(|key| {
                let modifiers = provider
                    .number(&item, Attribute::MenuItemCmdModifiers)
                    .unwrap_or(0.0) as u32;
                format_shortcut(&key, modifiers)
            });
        let enabled = provider.is_enabled(&item);
        collector.push(CommandKind::Menu, item_path, shortcut, item, enabled);
    }
}

fn collect_window<P: AccessibilityProvider>(
    provider: &P,
    element: &P::Element,
    depth: usize,
    in_toolbar: bool,
    config: &CrawlConfig,
    collector: &mut Collector<P::Element>,
) {
    if depth > config.max_depth {
        return;
    }
    for child in provider.children_or_empty(element) {
        let Some(role) = provider.role(&child) else {
            continue;
        };
        let subrole = provider.subrole(&child);
        let policy = roles::policy(&role, subrole.as_deref());

        if role == roles::OUTLINE {
            collect_sidebar(provider, &child, collector);
            continue;
        }
        if in_toolbar && role == roles::BUTTON {
            if let Some(name) = title::resolve_title(provider, &child) {
                let enabled = provider.is_enabled(&child);
                collector.push(CommandKind::Button, vec![name], None, child, enabled);
            }
            continue;
        }
        if policy.container || role == roles::TOOLBAR {
            collect_window(
                provider,
                &child,
                depth + 1,
                in_toolbar || role == roles::TOOLBAR,
                config,
                collector,
            );
        }
    }
}

fn collect_sidebar<P: AccessibilityProvider>(
    provider: &P,
    outline: &P::Element,
    collector: &mut Collector<P::Element>,
) {
    for row in provider.children_or_empty(outline) {
        let Some(role) = provider.role(&row) else {
            continue;
        };
        if role != roles::ROW {
            continue;
        }
        let policy = roles::policy(&role, provider.subrole(&row).as_deref());
        if crawler::is_section_header(provider, &row, &policy) {
            continue;
        }
        if let Some(name) = title::resolve_title(provider, &row) {
            let enabled = provider.is_enabled(&row);
            collector.push(CommandKind::Sidebar, vec![name], None, row, enabled);
        }
    }
}

/// Activates a command item. Windows are raised; every other kind goes
/// through the stable executor.
pub fn execute_command<P: AccessibilityProvider + 'static>(
    context: &ExecutionContext<'_, P>,
    item: &CommandItem<P::Element>,
) -> Result<ActionReport, ExecutionError> {
    let target = item.to_target();
    if item.kind != CommandKind::Window {
        return executor::execute(context, &target);
    }
    if !item.is_enabled {
        return Err(ExecutionError::TargetDisabled(format!("'{}' is disabled", item.title)));
    }
    let expectation = Expectation {
        title: &item.title,
        valid_roles: &[roles::WINDOW],
        validate_title: true,
        mode: context.config.match_mode,
        title_depth: title::DEFAULT_DESCENDANT_DEPTH,
    };
    let Some(window) = validator::validate(context.provider, &item.element, &expectation) else {
        return Err(ExecutionError::ElementInvalid(format!(
            "window '{}' is gone",
            item.title
        )));
    };
    match context.provider.perform_action(window.handle(), roles::RAISE) {
        ActionOutcome::Success => Ok(ActionReport::new(
            ExecutionMethod::Action(roles::RAISE.to_string()),
            format!("Raised window '{}'", item.title),
        )),
        ActionOutcome::ElementGone => Err(ExecutionError::ElementInvalid(format!(
            "window '{}' closed",
            item.title
        ))),
        other => Err(ExecutionError::ActionFailed(format!(
            "raising '{}' failed: {:?}",
            item.title, other
        ))),
    }
}
