//! Best-effort display titles for elements

use crate::element::Attribute;
use crate::platforms::{AccessibilityProvider, ProviderExt};
use crate::roles::{self, TitleStrategy};
use tracing::trace;

/// Attributes tried in order before any structural search.
const TITLE_CHAIN: &[Attribute] = &[
    Attribute::Title,
    Attribute::Description,
    Attribute::Value,
    Attribute::Placeholder,
    Attribute::Help,
];

/// Descendant levels searched for composite rows and cells.
pub const DEFAULT_DESCENDANT_DEPTH: usize = 2;

/// Resolves a display title for `element`, or `None` when nothing resolves.
///
/// Window chrome controls resolve to a fixed name for their subrole.
pub fn resolve_title<P: AccessibilityProvider>(provider: &P, element: &P::Element) -> Option<String> {
    resolve_title_with_depth(provider, element, DEFAULT_DESCENDANT_DEPTH)
}

pub fn resolve_title_with_depth<P: AccessibilityProvider>(
    provider: &P,
    element: &P::Element,
    descendant_depth: usize,
) -> Option<String> {
    let role = provider.role(element).unwrap_or_default();
    let subrole = provider.subrole(element);
    let policy = roles::policy(&role, subrole.as_deref());

    if policy.title == TitleStrategy::RoleOnly {
        return subrole
            .as_deref()
            .and_then(roles::window_chrome_title)
            .map(str::to_string);
    }

    if let Some(title) = attribute_chain(provider, element) {
        return Some(title);
    }

    match policy.title {
        TitleStrategy::Link => provider
            .text(element, Attribute::Url)
            .and_then(|url| name_from_url(&url)),
        TitleStrategy::Composite => descendant_text(provider, element, descendant_depth)
            .or_else(|| neighbor_text(provider, element)),
        TitleStrategy::Direct | TitleStrategy::RoleOnly => None,
    }
}

/// Every distinct title the element currently answers to, most specific
/// first. The validator accepts a match against any of them.
pub fn title_candidates<P: AccessibilityProvider>(
    provider: &P,
    element: &P::Element,
    descendant_depth: usize,
) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    for attribute in TITLE_CHAIN {
        if let Some(text) = provider.text(element, *attribute) {
            if !candidates.contains(&text) {
                candidates.push(text);
            }
        }
    }
    if let Some(resolved) = resolve_title_with_depth(provider, element, descendant_depth) {
        if !candidates.contains(&resolved) {
            candidates.push(resolved);
        }
    }
    candidates
}

fn attribute_chain<P: AccessibilityProvider>(provider: &P, element: &P::Element) -> Option<String> {
    TITLE_CHAIN
        .iter()
        .find_map(|attribute| provider.text(element, *attribute))
}

/// Text that labels a node on its own: its attribute chain.
fn own_text<P: AccessibilityProvider>(provider: &P, element: &P::Element) -> Option<String> {
    attribute_chain(provider, element)
}

/// Breadth-first over descendants, `depth` levels deep.
fn descendant_text<P: AccessibilityProvider>(
    provider: &P,
    element: &P::Element,
    depth: usize,
) -> Option<String> {
    let mut level = provider.children_or_empty(element);
    for _ in 0..depth {
        if level.is_empty() {
            break;
        }
        if let Some(text) = level.iter().find_map(|child| own_text(provider, child)) {
            return Some(text);
        }
        level = level
            .iter()
            .flat_map(|child| provider.children_or_empty(child))
            .collect();
    }
    None
}

/// Siblings, then the parent's siblings ("uncles"): two-column layouts put a
/// control's label in the neighboring cell.
fn neighbor_text<P: AccessibilityProvider>(provider: &P, element: &P::Element) -> Option<String> {
    let parent = provider.parent(element).ok().flatten()?;
    let from_siblings = provider
        .children_or_empty(&parent)
        .iter()
        .filter(|sibling| *sibling != element)
        .find_map(|sibling| own_text(provider, sibling).or_else(|| descendant_text(provider, sibling, 1)));
    if from_siblings.is_some() {
        trace!("title resolved from sibling");
        return from_siblings;
    }

    let grandparent = provider.parent(&parent).ok().flatten()?;
    provider
        .children_or_empty(&grandparent)
        .iter()
        .filter(|uncle| **uncle != parent)
        .find_map(|uncle| own_text(provider, uncle).or_else(|| descendant_text(provider, uncle, 1)))
}

/// Human name for a link from its target URL: the last path segment, else
/// the host without `www.`, with separators turned into spaces.
pub fn name_from_url(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let without_query = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);
    let mut parts = without_query.split('/');
    let host = parts.next().unwrap_or_default();

    let raw = parts
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(|segment| {
            segment
                .rsplit_once('.')
                .filter(|(stem, ext)| !stem.is_empty() && ext.len() <= 4)
                .map_or(segment, |(stem, _)| stem)
        })
        .unwrap_or_else(|| host.strip_prefix("www.").unwrap_or(host));

    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let name = decoded
        .split(['-', '_', '+'])
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!name.trim().is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::memory::{MemoryTree, NodeSpec};
    use crate::roles::*;
    use crate::types::ProcessId;

    #[test]
    fn url_names() {
        assert_eq!(
            name_from_url("https://example.com/docs/getting-started?x=1").as_deref(),
            Some("getting started")
        );
        assert_eq!(
            name_from_url("https://www.example.com/").as_deref(),
            Some("example.com")
        );
        assert_eq!(
            name_from_url("https://example.com/a/release%20notes.html").as_deref(),
            Some("release notes")
        );
        assert_eq!(name_from_url(""), None);
    }

    #[test]
    fn attribute_chain_order() {
        let tree = MemoryTree::new();
        let app = tree.add_application(ProcessId(1), NodeSpec::new(APPLICATION));
        let both = tree.add_child(
            app,
            NodeSpec::new(BUTTON).description("Described").help("Helpful"),
        );
        let help_only = tree.add_child(app, NodeSpec::new(BUTTON).help("Helpful"));
        let placeholder = tree.add_child(
            app,
            NodeSpec::new(TEXT_FIELD).placeholder("Search").help("Type here"),
        );
        let nothing = tree.add_child(app, NodeSpec::new(BUTTON));

        assert_eq!(resolve_title(&tree, &both).as_deref(), Some("Described"));
        assert_eq!(resolve_title(&tree, &help_only).as_deref(), Some("Helpful"));
        assert_eq!(resolve_title(&tree, &placeholder).as_deref(), Some("Search"));
        assert_eq!(resolve_title(&tree, &nothing), None);
    }

    #[test]
    fn link_falls_back_to_url() {
        let tree = MemoryTree::new();
        let app = tree.add_application(ProcessId(1), NodeSpec::new(APPLICATION));
        let link = tree.add_child(app, NodeSpec::new(LINK).url("https://x.org/pricing"));
        assert_eq!(resolve_title(&tree, &link).as_deref(), Some("pricing"));
    }

    #[test]
    fn row_uses_descendant_text() {
        let tree = MemoryTree::new();
        let app = tree.add_application(ProcessId(1), NodeSpec::new(APPLICATION));
        let row = tree.add_child(app, NodeSpec::new(ROW));
        let cell = tree.add_child(row, NodeSpec::new(CELL));
        tree.add_child(cell, NodeSpec::new(STATIC_TEXT).value_text("Drafts"));
        assert_eq!(resolve_title(&tree, &row).as_deref(), Some("Drafts"));
    }

    #[test]
    fn toggle_label_in_sibling_cell() {
        let tree = MemoryTree::new();
        let app = tree.add_application(ProcessId(1), NodeSpec::new(APPLICATION));
        let row = tree.add_child(app, NodeSpec::new(ROW));
        let label_cell = tree.add_child(row, NodeSpec::new(CELL));
        tree.add_child(label_cell, NodeSpec::new(STATIC_TEXT).value_text("Wi-Fi"));
        let toggle_cell = tree.add_child(row, NodeSpec::new(CELL));
        let toggle = tree.add_child(
            toggle_cell,
            NodeSpec::new(CHECK_BOX).subrole(SWITCH_SUBROLE).value_bool(true),
        );

        // The switch's own value is a bool, so the label comes from the uncle cell.
        assert_eq!(resolve_title(&tree, &toggle).as_deref(), Some("Wi-Fi"));
    }

    #[test]
    fn window_chrome_named_by_subrole() {
        let tree = MemoryTree::new();
        let app = tree.add_application(ProcessId(1), NodeSpec::new(APPLICATION));
        let close = tree.add_child(
            app,
            NodeSpec::new(BUTTON).subrole(CLOSE_BUTTON_SUBROLE).title("ignored"),
        );
        assert_eq!(resolve_title(&tree, &close).as_deref(), Some("Close"));
    }

    #[test]
    fn candidates_include_every_attribute() {
        let tree = MemoryTree::new();
        let app = tree.add_application(ProcessId(1), NodeSpec::new(APPLICATION));
        let b = tree.add_child(
            app,
            NodeSpec::new(BUTTON).title("Send").description("Send message"),
        );
        assert_eq!(title_candidates(&tree, &b, DEFAULT_DESCENDANT_DEPTH), vec!["Send", "Send message"]);
    }
}
