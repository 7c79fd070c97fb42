#![forbid(unsafe_code)]

//! Floating preview of the dragged item.
//!
//! The ghost holds a snapshot taken at drag start, not a live reference to
//! the item, so it keeps rendering while the item itself is hidden. Its
//! origin follows the pointer at the grab offset captured at drag start, so
//! the first move does not make it jump.
//!
//! # Invariants
//!
//! - A ghost is never created from a zero-sized snapshot.
//! - [`GhostOverlay::destroy`] reports `true` exactly once.
//! - A destroyed ghost ignores further moves.

use std::fmt;

use reorderkit_core::geometry::Rect;

/// Visual snapshot of an item, produced by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<I> {
    /// Host-defined image data.
    pub image: I,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl<I> Snapshot<I> {
    /// Create a snapshot.
    pub fn new(image: I, width: u16, height: u16) -> Self {
        Self {
            image,
            width,
            height,
        }
    }
}

/// Ghost overlay creation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostError {
    /// The snapshot has no area.
    EmptySnapshot { width: u16, height: u16 },
}

impl fmt::Display for GhostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySnapshot { width, height } => {
                write!(f, "ghost snapshot has no area ({width}x{height})")
            }
        }
    }
}

impl std::error::Error for GhostError {}

/// Visual configuration for the ghost overlay.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GhostConfig {
    /// Opacity of the ghost (0.0 = invisible, 1.0 = fully opaque).
    /// Default: 0.7.
    pub opacity: f32,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self { opacity: 0.7 }
    }
}

impl GhostConfig {
    /// Set opacity (clamped to 0.0..=1.0).
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

/// Floating snapshot that follows the pointer.
#[derive(Debug, Clone)]
pub struct GhostOverlay<I> {
    snapshot: Snapshot<I>,
    grab: (i32, i32),
    origin: (i32, i32),
    alive: bool,
}

impl<I> GhostOverlay<I> {
    /// Wrap a snapshot in a ghost positioned at the origin.
    pub fn create(snapshot: Snapshot<I>) -> Result<Self, GhostError> {
        if snapshot.width == 0 || snapshot.height == 0 {
            return Err(GhostError::EmptySnapshot {
                width: snapshot.width,
                height: snapshot.height,
            });
        }
        Ok(Self {
            snapshot,
            grab: (0, 0),
            origin: (0, 0),
            alive: true,
        })
    }

    /// Where within the snapshot the pointer holds it.
    pub fn set_grab_offset(&mut self, x: i32, y: i32) {
        self.grab = (x, y);
    }

    /// Grab offset set at drag start.
    #[must_use]
    pub fn grab_offset(&self) -> (i32, i32) {
        self.grab
    }

    /// Move so the grab point sits under `(x, y)`.
    ///
    /// Returns the new top-left origin, or `None` once destroyed.
    pub fn move_to(&mut self, x: i32, y: i32) -> Option<(i32, i32)> {
        if !self.alive {
            return None;
        }
        self.origin = (x - self.grab.0, y - self.grab.1);
        Some(self.origin)
    }

    /// Current top-left origin. May be negative.
    #[must_use]
    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    /// Snapshot this ghost displays.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot<I> {
        &self.snapshot
    }

    /// `(width, height)` in cells.
    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        (self.snapshot.width, self.snapshot.height)
    }

    /// Whether the ghost has not been destroyed yet.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Tear down the ghost.
    ///
    /// Idempotent: returns `true` only on the call that actually destroyed
    /// it, so callers can release the host overlay exactly once.
    pub fn destroy(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }

    /// On-screen area of the ghost clamped into `viewport`.
    ///
    /// Returns `None` when destroyed or when nothing of it is visible.
    #[must_use]
    pub fn clamped_rect(&self, viewport: Rect) -> Option<Rect> {
        if !self.alive {
            return None;
        }
        let left = self.origin.0.max(i32::from(viewport.x));
        let top = self.origin.1.max(i32::from(viewport.y));
        let right = (self.origin.0 + i32::from(self.snapshot.width)).min(i32::from(viewport.right()));
        let bottom =
            (self.origin.1 + i32::from(self.snapshot.height)).min(i32::from(viewport.bottom()));

        if left >= right || top >= bottom {
            return None;
        }
        // Clamped into a u16 viewport, so every edge fits in u16.
        Some(Rect::new(
            left as u16,
            top as u16,
            (right - left) as u16,
            (bottom - top) as u16,
        ))
    }
}
