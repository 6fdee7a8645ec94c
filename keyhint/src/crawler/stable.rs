//! Heuristics for native-style trees, where declared roles are trusted.
//!
//! An element needs a semantic action to become a hint, except for text
//! inputs, sliders, rows and cells, which are activated by attribute writes.

use super::{CrawlHeuristics, NodeInfo};
use crate::platforms::AccessibilityProvider;
use crate::roles::{self, PrimaryStrategy};
use crate::types::{CoordinateSystem, Profile, Rect};

pub struct StableTree;

impl CrawlHeuristics for StableTree {
    fn profile(&self) -> Profile {
        Profile::Stable
    }

    fn coordinate_system(&self) -> CoordinateSystem {
        CoordinateSystem::TopLeftOrigin
    }

    /// Actionable role plus at least one semantic action. Focus and select
    /// strategies work through attribute writes, so those roles qualify
    /// without advertising an action.
    fn is_actionable<P: AccessibilityProvider>(
        &self,
        _provider: &P,
        node: &NodeInfo,
        _frame: Option<Rect>,
    ) -> bool {
        if !node.policy.actionable {
            return false;
        }
        matches!(
            node.policy.primary,
            PrimaryStrategy::Focus | PrimaryStrategy::Select
        ) || node
            .actions
            .iter()
            .any(|action| roles::SEMANTIC_ACTIONS.contains(&action.as_str()))
    }

    fn requires_frame(&self) -> bool {
        false
    }
}
