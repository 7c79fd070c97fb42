#![forbid(unsafe_code)]

//! Pointer position to insertion slot.
//!
//! The slot flips exactly when the pointer crosses an item's midline, not
//! its edge, so a pointer resting near a row boundary cannot flicker
//! between two candidates.

use reorderkit_core::geometry::{Position, Rect};

use super::ReorderHost;

/// Slot in `0..=item_count` the pointer would insert at.
///
/// Returns the index of the first item (in display order) whose vertical
/// midpoint lies strictly below `pointer.y`, or the item count when there is
/// none. Items without bounds, or with empty bounds, are skipped but still
/// counted.
pub fn resolve_target_index<I>(pointer: Position, bounds: I) -> usize
where
    I: IntoIterator<Item = Option<Rect>>,
{
    let mut count = 0;
    for (index, rect) in bounds.into_iter().enumerate() {
        count = index + 1;
        let Some(rect) = rect else { continue };
        if !rect.is_empty() && rect.is_above_midline(pointer.y) {
            return index;
        }
    }
    count
}

/// [`resolve_target_index`] over the host's current layout.
pub fn resolve_with_host<H: ReorderHost + ?Sized>(pointer: Position, host: &H) -> usize {
    resolve_target_index(pointer, (0..host.item_count()).map(|i| host.bounds_of(i)))
}
