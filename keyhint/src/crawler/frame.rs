//! Frame resolution for crawled elements

use crate::element::Attribute;
use crate::platforms::{AccessibilityProvider, ProviderExt};
use crate::types::Rect;

/// Where a node sits under its parent, for geometry estimation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Placement {
    pub parent_frame: Option<Rect>,
    pub index: usize,
    pub siblings: usize,
}

/// Which rung of the fallback chain produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    Explicit,
    PositionSize,
    Estimated,
}

/// Position + size only; unusable frames are dropped.
pub fn stable_frame<P: AccessibilityProvider>(provider: &P, element: &P::Element) -> Option<Rect> {
    provider.position_frame(element).filter(Rect::is_usable)
}

/// Explicit frame, then position + size, then an estimate from the parent
/// frame when the element reports no geometry at all.
///
/// A reported but degenerate frame is returned as is so the caller can
/// reject it; estimation is only for elements with no geometry.
pub fn volatile_frame<P: AccessibilityProvider>(
    provider: &P,
    element: &P::Element,
    placement: &Placement,
) -> Option<(Rect, FrameSource)> {
    if let Some(frame) = provider.explicit_frame(element) {
        return Some((frame, FrameSource::Explicit));
    }
    if let Some(frame) = provider.position_frame(element) {
        return Some((frame, FrameSource::PositionSize));
    }
    if reports_geometry(provider, element) {
        return None;
    }
    let parent = placement.parent_frame?;
    estimate_from_parent(parent, placement.index, placement.siblings)
        .map(|frame| (frame, FrameSource::Estimated))
}

fn reports_geometry<P: AccessibilityProvider>(provider: &P, element: &P::Element) -> bool {
    [Attribute::Frame, Attribute::Position, Attribute::Size]
        .iter()
        .any(|attribute| provider.attribute(element, *attribute).is_ok())
}

/// Splits the parent into equal horizontal bands, one per sibling, and
/// returns the band at `index`.
pub fn estimate_from_parent(parent: Rect, index: usize, siblings: usize) -> Option<Rect> {
    if !parent.is_usable() || siblings == 0 || index >= siblings {
        return None;
    }
    let band = parent.height / siblings as f64;
    Some(Rect::new(
        parent.x,
        parent.y + band * index as f64,
        parent.width,
        band,
    ))
}
