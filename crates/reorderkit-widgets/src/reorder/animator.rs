#![forbid(unsafe_code)]

//! Playback for per-item transforms.
//!
//! Hosts without their own animation system can forward
//! [`ReorderHost::apply_transform`](super::ReorderHost::apply_transform) and
//! [`ReorderHost::begin_animation`](super::ReorderHost::begin_animation) here
//! and read [`TransformAnimator::transform`] when painting.

use std::time::Duration;

use reorderkit_core::animation::{Animation, Easing, Fade, Slide};

use super::displacement::ItemTransform;

#[derive(Debug, Clone, Copy)]
struct ItemAnimation {
    offset: Slide,
    opacity_from: f32,
    opacity_to: f32,
    fade: Fade,
}

impl ItemAnimation {
    fn at_rest(transform: ItemTransform) -> Self {
        let mut fade = Fade::new(Duration::ZERO);
        fade.tick(Duration::from_nanos(1));
        Self {
            offset: Slide::settled(transform.offset),
            opacity_from: transform.opacity,
            opacity_to: transform.opacity,
            fade,
        }
    }

    fn current(&self) -> ItemTransform {
        ItemTransform {
            offset: self.offset.position(),
            opacity: self.fade.interpolate(self.opacity_from, self.opacity_to),
        }
    }

    fn is_complete(&self) -> bool {
        self.offset.is_complete() && self.fade.is_complete()
    }
}

/// Animated transforms for a list of items.
#[derive(Debug, Clone, Default)]
pub struct TransformAnimator {
    items: Vec<ItemAnimation>,
}

impl TransformAnimator {
    /// `item_count` items at rest.
    #[must_use]
    pub fn new(item_count: usize) -> Self {
        Self {
            items: vec![ItemAnimation::at_rest(ItemTransform::NEUTRAL); item_count],
        }
    }

    /// Grow or shrink to `item_count`; new items start at rest.
    pub fn resize(&mut self, item_count: usize) {
        self.items
            .resize(item_count, ItemAnimation::at_rest(ItemTransform::NEUTRAL));
    }

    /// Number of tracked items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Jump `index` to `transform` with no animation.
    pub fn set(&mut self, index: usize, transform: ItemTransform) {
        if let Some(item) = self.items.get_mut(index) {
            *item = ItemAnimation::at_rest(transform);
        }
    }

    /// Animate `index` from where it is now to `target`.
    pub fn animate(&mut self, index: usize, target: ItemTransform, duration: Duration, easing: Easing) {
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        let current = item.current();
        let mut offset = item.offset;
        offset.retarget(target.offset, duration);
        *item = ItemAnimation {
            offset: offset.easing(easing.function()),
            opacity_from: current.opacity,
            opacity_to: target.opacity,
            fade: Fade::new(duration).easing(easing.function()),
        };
    }

    /// Advance every running animation by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        for item in &mut self.items {
            if !item.is_complete() {
                item.offset.tick(dt);
                item.fade.tick(dt);
            }
        }
    }

    /// Transform to paint `index` with right now; neutral when untracked.
    #[must_use]
    pub fn transform(&self, index: usize) -> ItemTransform {
        self.items
            .get(index)
            .map_or(ItemTransform::NEUTRAL, ItemAnimation::current)
    }

    /// Whether no animation is running.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.items.iter().all(ItemAnimation::is_complete)
    }

    /// Whether every item is settled at the neutral transform.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.is_settled() && (0..self.len()).all(|i| self.transform(i).is_neutral())
    }
}
