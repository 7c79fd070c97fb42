#![forbid(unsafe_code)]

//! Visual displacement of the items around a drag.
//!
//! While an item is dragged the list is not touched; instead every item
//! between the source and the candidate slot is offset by one extent so the
//! list previews the reorder. The source itself is hidden, since the ghost
//! overlay stands in for it.
//!
//! # Invariants
//!
//! 1. Moving down (`source < candidate`): indices in `(source, candidate)`
//!    get `-extent`.
//! 2. Moving up (`candidate < source`): indices in `[candidate, source)` get
//!    `+extent`.
//! 3. The source has offset 0 and opacity 0.
//! 4. Every other index is [`ItemTransform::NEUTRAL`].

use super::ReorderEvent;

/// Visual state applied to one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemTransform {
    /// Vertical offset in cells.
    pub offset: i16,
    /// 0.0 = invisible, 1.0 = fully opaque.
    pub opacity: f32,
}

impl ItemTransform {
    /// Resting state.
    pub const NEUTRAL: Self = Self {
        offset: 0,
        opacity: 1.0,
    };

    /// The dragged item while the ghost stands in for it.
    pub const HIDDEN: Self = Self {
        offset: 0,
        opacity: 0.0,
    };

    /// Fully opaque at `offset`.
    #[must_use]
    pub const fn shifted(offset: i16) -> Self {
        Self {
            offset,
            opacity: 1.0,
        }
    }

    /// Whether this is the resting state.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

impl Default for ItemTransform {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Per-item transforms previewing a drop of `source` at `candidate`.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementPlan {
    source: Option<usize>,
    candidate: Option<usize>,
    extent: i16,
    transforms: Vec<ItemTransform>,
}

impl DisplacementPlan {
    /// Every item at rest.
    #[must_use]
    pub fn neutral(item_count: usize) -> Self {
        Self {
            source: None,
            candidate: None,
            extent: 0,
            transforms: vec![ItemTransform::NEUTRAL; item_count],
        }
    }

    /// Plan for dragging `source` to slot `candidate` in a list of
    /// `item_count` items whose dragged item is `extent` cells tall.
    ///
    /// `candidate` ranges over `0..=item_count`. A `source` outside the list
    /// yields a neutral plan.
    #[must_use]
    pub fn compute(source: usize, candidate: usize, item_count: usize, extent: i16) -> Self {
        if source >= item_count {
            return Self::neutral(item_count);
        }
        let candidate = candidate.min(item_count);

        let transforms = (0..item_count)
            .map(|i| {
                if i == source {
                    ItemTransform::HIDDEN
                } else if source < i && i < candidate {
                    ItemTransform::shifted(-extent)
                } else if candidate <= i && i < source {
                    ItemTransform::shifted(extent)
                } else {
                    ItemTransform::NEUTRAL
                }
            })
            .collect();

        Self {
            source: Some(source),
            candidate: Some(candidate),
            extent,
            transforms,
        }
    }

    /// Dragged index, if this is not a neutral plan.
    #[must_use]
    pub fn source(&self) -> Option<usize> {
        self.source
    }

    /// Candidate slot the plan previews.
    #[must_use]
    pub fn candidate(&self) -> Option<usize> {
        self.candidate
    }

    /// Extent items are displaced by.
    #[must_use]
    pub fn extent(&self) -> i16 {
        self.extent
    }

    /// Number of items covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the plan covers no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Transform for `index`; neutral past the end.
    #[must_use]
    pub fn transform(&self, index: usize) -> ItemTransform {
        self.transforms.get(index).copied().unwrap_or_default()
    }

    /// Offset for `index`.
    #[must_use]
    pub fn offset(&self, index: usize) -> i16 {
        self.transform(index).offset
    }

    /// Opacity for `index`.
    #[must_use]
    pub fn opacity(&self, index: usize) -> f32 {
        self.transform(index).opacity
    }

    /// `(index, transform)` pairs in list order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, ItemTransform)> + '_ {
        self.transforms.iter().copied().enumerate()
    }

    /// Indices whose transform differs from `previous`, with their new value.
    ///
    /// Indices only one of the two plans covers compare against neutral.
    pub fn changed_from<'a>(
        &'a self,
        previous: &'a DisplacementPlan,
    ) -> impl Iterator<Item = (usize, ItemTransform)> + 'a {
        let len = self.len().max(previous.len());
        (0..len).filter_map(move |i| {
            let next = self.transform(i);
            (next != previous.transform(i)).then_some((i, next))
        })
    }

    /// Whether every item is at rest.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.transforms.iter().all(ItemTransform::is_neutral)
    }

    /// Reorder event a drop under this plan would emit.
    #[must_use]
    pub fn drop_event(&self) -> Option<ReorderEvent> {
        ReorderEvent::from_drop(self.source?, self.candidate?)
    }
}

/// Final index of an item moved from `source` and inserted at slot
/// `candidate`.
///
/// Removing the source first shifts every later slot up by one, so slots
/// past the source are pulled back by one.
#[must_use]
pub const fn adjusted_drop_index(source: usize, candidate: usize) -> usize {
    if candidate > source {
        candidate - 1
    } else {
        candidate
    }
}
