//! Collapses targets that name the same control twice

use crate::element::ElementHandle;
use crate::types::{Profile, Rect, Target};
use std::collections::HashSet;
use tracing::trace;

/// Share of the smaller frame that must be covered before two frames are
/// considered the same control.
pub const OVERLAP_THRESHOLD: f64 = 0.5;

/// Minimum width and height ratio (smaller / larger) between two overlapping
/// frames for them to be considered the same control.
pub const SIZE_SIMILARITY_FLOOR: f64 = 0.7;

fn ratio(a: f64, b: f64) -> f64 {
    let (small, large) = if a < b { (a, b) } else { (b, a) };
    if large <= 0.0 {
        0.0
    } else {
        small / large
    }
}

/// Whether two frames look like one visual control.
pub fn frames_collapse(a: &Rect, b: &Rect) -> bool {
    let smaller_area = a.area().min(b.area());
    if smaller_area <= 0.0 {
        return false;
    }
    a.intersection_area(b) > OVERLAP_THRESHOLD * smaller_area
        && ratio(a.width, b.width) >= SIZE_SIMILARITY_FLOOR
        && ratio(a.height, b.height) >= SIZE_SIMILARITY_FLOOR
}

/// Incremental deduplication, first discovered wins.
///
/// Stage one drops a target whose element is already kept. Stage two drops
/// a volatile-profile target whose frame collapses onto a kept volatile
/// target's frame.
#[derive(Debug)]
pub struct Deduplicator<H> {
    seen: HashSet<H>,
    volatile_frames: Vec<Rect>,
}

impl<H: ElementHandle> Default for Deduplicator<H> {
    fn default() -> Self {
        Self {
            seen: HashSet::new(),
            volatile_frames: Vec::new(),
        }
    }
}

impl<H: ElementHandle> Deduplicator<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records and keeps `target`, or returns `false` if it duplicates one
    /// already kept.
    pub fn accept(&mut self, target: &Target<H>) -> bool {
        let handle = target.element.handle();
        if self.seen.contains(handle) {
            trace!(title = %target.title, "dropping duplicate element");
            return false;
        }

        if target.profile == Profile::Volatile {
            if let Some(frame) = target.cached_frame {
                if self
                    .volatile_frames
                    .iter()
                    .any(|kept| frames_collapse(kept, &frame))
                {
                    trace!(title = %target.title, "dropping overlapping frame");
                    return false;
                }
                self.volatile_frames.push(frame);
            }
        }

        self.seen.insert(handle.clone());
        true
    }
}

/// Batch form of [`Deduplicator`], preserving discovery order.
pub fn dedup<H: ElementHandle>(targets: Vec<Target<H>>) -> Vec<Target<H>> {
    let mut deduplicator = Deduplicator::new();
    targets
        .into_iter()
        .filter(|target| deduplicator.accept(target))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementRef;
    use crate::types::{CoordinateSystem, TargetId};

    fn target(handle: u32, title: &str, frame: Option<Rect>, profile: Profile) -> Target<u32> {
        Target {
            id: TargetId::new(),
            title: title.to_string(),
            role: "AXButton".to_string(),
            subrole: None,
            title_depth: crate::title::DEFAULT_DESCENDANT_DEPTH,
            path: Vec::new(),
            element: ElementRef::new(handle, 1),
            is_enabled: true,
            cached_frame: frame,
            profile,
            coordinate_system: CoordinateSystem::TopLeftOrigin,
        }
    }

    #[test]
    fn identical_elements_collapse() {
        let targets = vec![
            target(1, "Send", None, Profile::Stable),
            target(1, "Send again", None, Profile::Stable),
        ];
        let kept = dedup(targets);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Send");
    }

    #[test]
    fn overlapping_similar_frames_keep_first() {
        let targets = vec![
            target(1, "Docs", Some(Rect::new(0.0, 0.0, 100.0, 20.0)), Profile::Volatile),
            target(2, "Docs icon", Some(Rect::new(4.0, 1.0, 90.0, 18.0)), Profile::Volatile),
        ];
        let kept = dedup(targets);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Docs");
    }

    #[test]
    fn overlapping_frames_of_different_size_survive() {
        let targets = vec![
            target(1, "Card", Some(Rect::new(0.0, 0.0, 100.0, 100.0)), Profile::Volatile),
            target(2, "Like", Some(Rect::new(10.0, 10.0, 20.0, 20.0)), Profile::Volatile),
        ];
        assert_eq!(dedup(targets).len(), 2);
    }

    #[test]
    fn stable_targets_skip_frame_stage() {
        let frame = Some(Rect::new(0.0, 0.0, 50.0, 20.0));
        let targets = vec![
            target(1, "Bold", frame, Profile::Stable),
            target(2, "Bold label", frame, Profile::Stable),
        ];
        assert_eq!(dedup(targets).len(), 2);
    }

    #[test]
    fn barely_touching_frames_survive() {
        let a = Rect::new(0.0, 0.0, 100.0, 20.0);
        let b = Rect::new(60.0, 0.0, 100.0, 20.0);
        assert!(!frames_collapse(&a, &b));
    }
}
