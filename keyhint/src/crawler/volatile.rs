//! Heuristics for content rendered by an embedded layout engine.
//!
//! Roles there are unreliable, so geometry decides: a node needs a usable
//! frame and must not be a known container.

use super::{CrawlHeuristics, NodeInfo};
use crate::platforms::AccessibilityProvider;
use crate::roles;
use crate::types::{CoordinateSystem, Profile, Rect};

pub struct VolatileTree;

impl CrawlHeuristics for VolatileTree {
    fn profile(&self) -> Profile {
        Profile::Volatile
    }

    fn coordinate_system(&self) -> CoordinateSystem {
        CoordinateSystem::ScreenLocal
    }

    fn is_actionable<P: AccessibilityProvider>(
        &self,
        _provider: &P,
        node: &NodeInfo,
        frame: Option<Rect>,
    ) -> bool {
        if roles::is_container(&node.role) {
            return false;
        }
        if !frame.is_some_and(|f| f.is_usable()) {
            return false;
        }
        node.policy.actionable
            || node
                .actions
                .iter()
                .any(|action| roles::SEMANTIC_ACTIONS.contains(&action.as_str()))
    }

    fn requires_frame(&self) -> bool {
        true
    }
}
