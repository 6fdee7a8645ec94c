//! Re-checks a remembered element right before acting on it

use crate::element::{ElementRef, ValidatedElement};
use crate::platforms::{AccessibilityProvider, ProviderExt};
use crate::roles;
use crate::title::title_candidates;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How strictly a current title must equal the remembered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Plain string equality. No case folding, no trimming.
    Exact,
    /// Whitespace- and case-insensitive equality, or a prefix match in either
    /// direction that ends on a word boundary (`"Inbox"` ~ `"Inbox (3)"`).
    #[default]
    Relaxed,
}

/// What the element must still look like to be acted on.
#[derive(Debug, Clone)]
pub struct Expectation<'a> {
    pub title: &'a str,
    pub valid_roles: &'a [&'a str],
    pub validate_title: bool,
    pub mode: MatchMode,
    /// Descendant levels searched for a composite title.
    pub title_depth: usize,
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `short` is a prefix of `long` and the next character of `long` is not
/// alphanumeric.
fn is_boundary_prefix(short: &str, long: &str) -> bool {
    if short.is_empty() || !long.starts_with(short) {
        return false;
    }
    long[short.len()..]
        .chars()
        .next()
        .map_or(true, |next| !next.is_alphanumeric())
}

/// Compares a remembered title with a current one.
pub fn titles_match(expected: &str, actual: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Exact => expected == actual,
        MatchMode::Relaxed => {
            let expected = normalize(expected);
            let actual = normalize(actual);
            expected == actual
                || is_boundary_prefix(&expected, &actual)
                || is_boundary_prefix(&actual, &expected)
        }
    }
}

/// Validates `element` against `expectation`, returning the proof needed by
/// executors on success.
///
/// The role must still be in the valid set. Window chrome controls skip the
/// title check because they have no title.
pub fn validate<'a, P>(
    provider: &P,
    element: &'a ElementRef<P::Element>,
    expectation: &Expectation<'_>,
) -> Option<ValidatedElement<'a, P::Element>>
where
    P: AccessibilityProvider,
{
    let handle = element.handle();
    let Some(role) = provider.role(handle) else {
        debug!(?handle, "validation failed: role unreadable");
        return None;
    };
    if !expectation.valid_roles.iter().any(|r| *r == role) {
        debug!(%role, "validation failed: role changed");
        return None;
    }

    let subrole = provider.subrole(handle);
    if roles::is_window_chrome(subrole.as_deref()) || !expectation.validate_title {
        return Some(ValidatedElement::new(handle, role));
    }

    let candidates = title_candidates(provider, handle, expectation.title_depth);
    let matched = candidates
        .iter()
        .any(|current| titles_match(expectation.title, current, expectation.mode));
    if !matched {
        debug!(
            expected = expectation.title,
            ?candidates,
            "validation failed: title changed"
        );
        return None;
    }
    Some(ValidatedElement::new(handle, role))
}

/// Boolean form of [`validate`].
pub fn is_valid<P>(
    provider: &P,
    element: &ElementRef<P::Element>,
    expectation: &Expectation<'_>,
) -> bool
where
    P: AccessibilityProvider,
{
    validate(provider, element, expectation).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::memory::{MemoryTree, NodeSpec};
    use crate::roles::*;
    use crate::title::DEFAULT_DESCENDANT_DEPTH;
    use crate::types::ProcessId;

    #[test]
    fn relaxed_accepts_dynamic_suffix() {
        assert!(titles_match("Inbox", "Inbox (3)", MatchMode::Relaxed));
        assert!(titles_match("Inbox (3)", "Inbox", MatchMode::Relaxed));
        assert!(titles_match("  inbox ", "INBOX", MatchMode::Relaxed));
        assert!(titles_match("Sent   Items", "sent items", MatchMode::Relaxed));
    }

    #[test]
    fn relaxed_requires_word_boundary() {
        assert!(!titles_match("Inbox", "Inboxer", MatchMode::Relaxed));
        assert!(!titles_match("Menu", "MenuBar", MatchMode::Relaxed));
        assert!(!titles_match("", "Anything", MatchMode::Relaxed));
    }

    #[test]
    fn exact_never_folds_case() {
        assert!(titles_match("Inbox", "Inbox", MatchMode::Exact));
        assert!(!titles_match("Inbox", "inbox", MatchMode::Exact));
        assert!(!titles_match("Inbox", "Inbox (3)", MatchMode::Exact));
    }

    fn fixture() -> (MemoryTree, crate::platforms::memory::NodeId) {
        let tree = MemoryTree::new();
        let app = tree.add_application(ProcessId(9), NodeSpec::new(APPLICATION));
        let button = tree.add_child(app, NodeSpec::new(BUTTON).title("Inbox (4)"));
        (tree, button)
    }

    #[test]
    fn validate_checks_role_and_title() {
        let (tree, button) = fixture();
        let element = ElementRef::new(button, 1);
        let ok = Expectation {
            title: "Inbox",
            valid_roles: &[BUTTON],
            validate_title: true,
            mode: MatchMode::Relaxed,
            title_depth: DEFAULT_DESCENDANT_DEPTH,
        };
        let validated = validate(&tree, &element, &ok).expect("valid");
        assert_eq!(validated.role(), BUTTON);

        let wrong_role = Expectation {
            valid_roles: &[LINK],
            ..ok.clone()
        };
        assert!(!is_valid(&tree, &element, &wrong_role));

        let wrong_title = Expectation {
            title: "Outbox",
            ..ok.clone()
        };
        assert!(!is_valid(&tree, &element, &wrong_title));

        let unchecked_title = Expectation {
            title: "Outbox",
            validate_title: false,
            ..ok
        };
        assert!(is_valid(&tree, &element, &unchecked_title));
    }

    #[test]
    fn window_chrome_skips_title_check() {
        let tree = MemoryTree::new();
        let app = tree.add_application(ProcessId(9), NodeSpec::new(APPLICATION));
        let close = tree.add_child(app, NodeSpec::new(BUTTON).subrole(CLOSE_BUTTON_SUBROLE));
        let element = ElementRef::new(close, 1);
        let expectation = Expectation {
            title: "whatever",
            valid_roles: &[BUTTON],
            validate_title: true,
            mode: MatchMode::Exact,
            title_depth: DEFAULT_DESCENDANT_DEPTH,
        };
        assert!(is_valid(&tree, &element, &expectation));
    }

    #[test]
    fn stale_element_is_invalid() {
        let (tree, button) = fixture();
        let element = ElementRef::new(button, 1);
        tree.remove(button);
        let expectation = Expectation {
            title: "Inbox",
            valid_roles: &[BUTTON],
            validate_title: true,
            mode: MatchMode::Relaxed,
            title_depth: DEFAULT_DESCENDANT_DEPTH,
        };
        assert!(!is_valid(&tree, &element, &expectation));
    }
}
