#![forbid(unsafe_code)]

//! Drag-and-drop protocol for arbitrary elements.
//!
//! Defines [`DragPayload`] for carrying type-tagged data, [`DragSource`] and
//! [`DropTarget`] as attachable behaviors, and the [`DragPlatform`] seam
//! through which a drag source hands its payload to the host's native drag
//! machinery.
//!
//! # Design
//!
//! Every behavior owns its own press/drag state. Two lists on screen each
//! carry their own [`DragSource`], so a press on one can never leak into the
//! other.
//!
//! A drop target only ever looks at the payload's type tag to decide
//! acceptance. The value travels as `Rc<dyn Any>` and is downcast by the
//! command that consumes it.
//!
//! ## Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Tag mismatch on hover | Payload from an unrelated source | `DragEffects::NONE` |
//! | Tag mismatch on drop | Same | `DropResult::Rejected`, command not run |
//! | Predicate refuses | `can_drop_when` returned false | `DropResult::Rejected` |
//! | Platform refuses drag | `begin_drag` returned `Err` | Source resets, no drag |

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use reorderkit_core::geometry::Position;

/// Type tag used when a caller does not pick one.
pub const DEFAULT_DRAG_TAG: &str = "Item";

// ---------------------------------------------------------------------------
// DragPayload
// ---------------------------------------------------------------------------

/// Data carried during a drag operation.
///
/// # Examples
///
/// ```
/// # use reorderkit_widgets::drag::DragPayload;
/// let payload = DragPayload::new("Gear", 42u32).with_display_text("Iron Sword");
/// assert_eq!(payload.drag_type, "Gear");
/// assert_eq!(payload.value::<u32>(), Some(&42));
/// assert!(payload.value::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct DragPayload {
    /// Type tag drop targets match against (e.g. `"Item"`, `"Gear"`).
    pub drag_type: String,
    value: Rc<dyn Any>,
    /// Human-readable preview text shown during drag (optional).
    pub display_text: Option<String>,
}

impl DragPayload {
    /// Create a payload carrying `value` under `drag_type`.
    #[must_use]
    pub fn new<T: Any>(drag_type: impl Into<String>, value: T) -> Self {
        Self {
            drag_type: drag_type.into(),
            value: Rc::new(value),
            display_text: None,
        }
    }

    /// Attach preview text.
    #[must_use]
    pub fn with_display_text(mut self, text: impl Into<String>) -> Self {
        self.display_text = Some(text.into());
        self
    }

    /// Borrow the carried value if it is a `T`.
    #[must_use]
    pub fn value<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns true if the payload tag matches `pattern`.
    ///
    /// `"*"` matches every tag; anything else must match exactly.
    #[must_use]
    pub fn matches_type(&self, pattern: &str) -> bool {
        pattern == "*" || self.drag_type == pattern
    }
}

impl fmt::Debug for DragPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragPayload")
            .field("drag_type", &self.drag_type)
            .field("display_text", &self.display_text)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// DragConfig
// ---------------------------------------------------------------------------

/// Configuration for drag gesture detection.
///
/// Controls how pointer movement is interpreted as a drag versus a click.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DragConfig {
    /// Movement on either axis must exceed this many cells before a drag
    /// starts (default: 1).
    pub threshold_cells: u16,
    /// Whether pressing Escape cancels an active drag (default: true).
    pub cancel_on_escape: bool,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            threshold_cells: 1,
            cancel_on_escape: true,
        }
    }
}

impl DragConfig {
    /// Set the drag threshold.
    #[must_use]
    pub fn with_threshold(mut self, cells: u16) -> Self {
        self.threshold_cells = cells;
        self
    }

    /// Escape no longer cancels drags.
    #[must_use]
    pub fn no_escape_cancel(mut self) -> Self {
        self.cancel_on_escape = false;
        self
    }

    /// Whether moving from `start` to `current` is a drag rather than a
    /// click. Axes are tested independently.
    #[must_use]
    pub fn exceeds_threshold(&self, start: Position, current: Position) -> bool {
        let threshold = u32::from(self.threshold_cells);
        let (dx, dy) = start.delta(current);
        dx.unsigned_abs() > threshold || dy.unsigned_abs() > threshold
    }
}

// ---------------------------------------------------------------------------
// DragEffects / DropResult / DragError
// ---------------------------------------------------------------------------

bitflags! {
    /// Operations a drop target offers for a payload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DragEffects: u8 {
        /// Drop refused.
        const NONE = 0b0000;
        /// Copy the payload into the target.
        const COPY = 0b0001;
        /// Move the payload into the target.
        const MOVE = 0b0010;
        /// Link the payload into the target.
        const LINK = 0b0100;
    }
}

/// Outcome of a drop operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropResult {
    /// Drop was accepted and the command ran.
    Accepted,
    /// Drop was rejected with a reason.
    Rejected {
        /// Human-readable explanation for why the drop was rejected.
        reason: String,
    },
}

impl DropResult {
    /// Create a rejection with the given reason.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns true if the drop was accepted.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Errors reported by a [`DragPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    /// The platform declined to start a drag.
    Refused(String),
    /// No drag machinery is available (headless host, window gone).
    Unavailable,
}

impl fmt::Display for DragError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refused(msg) => write!(f, "drag refused: {msg}"),
            Self::Unavailable => write!(f, "drag not available"),
        }
    }
}

impl std::error::Error for DragError {}

// ---------------------------------------------------------------------------
// DragPlatform
// ---------------------------------------------------------------------------

/// The host's native drag machinery.
///
/// `begin_drag` must return promptly with the effects the platform allows;
/// the drop arrives later through the host's normal event path. Platforms
/// whose native drag runs a modal loop keep feeding pointer positions from
/// inside that loop instead of blocking here (see
/// [`ReorderController::poll`](crate::reorder::ReorderController::poll)).
pub trait DragPlatform {
    /// Start a platform drag carrying `payload`.
    fn begin_drag(&mut self, payload: DragPayload) -> Result<DragEffects, DragError>;
}

// ---------------------------------------------------------------------------
// DragSource
// ---------------------------------------------------------------------------

/// Drag-initiation behavior attachable to any element.
///
/// Records the press position and, once movement passes the threshold,
/// packages the bound value under the configured tag and starts a platform
/// drag. A press starts at most one drag.
#[derive(Debug)]
pub struct DragSource<T> {
    tag: String,
    value: T,
    config: DragConfig,
    pressed_at: Option<Position>,
    dragging: bool,
}

impl<T: Clone + 'static> DragSource<T> {
    /// Bind `value` with the default `"Item"` tag.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            tag: DEFAULT_DRAG_TAG.to_string(),
            value,
            config: DragConfig::default(),
            pressed_at: None,
            dragging: false,
        }
    }

    /// Set the payload type tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the gesture configuration.
    #[must_use]
    pub fn with_config(mut self, config: DragConfig) -> Self {
        self.config = config;
        self
    }

    /// Payload type tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Bound value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Replace the bound value (e.g. when the element is recycled).
    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }

    /// Whether a drag started from this source and has not been released.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Pointer pressed on the element.
    pub fn on_press(&mut self, pos: Position) {
        if !self.dragging {
            self.pressed_at = Some(pos);
        }
    }

    /// Pointer moved while pressed.
    ///
    /// Returns the platform's effects when this move started a drag.
    pub fn on_move(&mut self, pos: Position, platform: &mut impl DragPlatform) -> Option<DragEffects> {
        let start = self.pressed_at?;
        if self.dragging || !self.config.exceeds_threshold(start, pos) {
            return None;
        }

        self.dragging = true;
        let payload = DragPayload::new(self.tag.clone(), self.value.clone());
        reorderkit_core::debug!(tag = %self.tag, "drag source started");
        match platform.begin_drag(payload) {
            Ok(effects) => Some(effects),
            Err(err) => {
                reorderkit_core::warn!(error = %err, tag = %self.tag, "drag source refused");
                self.reset();
                None
            }
        }
    }

    /// Pointer released, or the platform finished the drag.
    pub fn on_release(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.pressed_at = None;
        self.dragging = false;
    }
}

// ---------------------------------------------------------------------------
// DropTarget
// ---------------------------------------------------------------------------

/// Command run on an accepted drop, with the payload and the target context.
pub type DropCommand<C> = Box<dyn FnMut(&DragPayload, &C)>;

/// Gate evaluated before a drop runs its command.
pub type DropPredicate<C> = Box<dyn Fn(&DragPayload, &C) -> bool>;

/// Drop-acceptance behavior attachable to any element.
///
/// # Example
///
/// ```
/// # use std::cell::RefCell;
/// # use std::rc::Rc;
/// # use reorderkit_widgets::drag::{DragEffects, DragPayload, DropTarget};
/// let equipped = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&equipped);
/// let mut slot = DropTarget::new("Gear", "main-hand")
///     .on_drop_command(move |payload, slot: &&str| {
///         if let Some(id) = payload.value::<u32>() {
///             sink.borrow_mut().push((*slot, *id));
///         }
///     });
///
/// let gear = DragPayload::new("Gear", 7u32);
/// assert_eq!(slot.on_drag_over(&gear), DragEffects::MOVE);
/// assert!(slot.on_drop(&gear).is_accepted());
/// assert_eq!(equipped.borrow().as_slice(), &[("main-hand", 7)]);
/// ```
pub struct DropTarget<C> {
    accepted_tag: String,
    context: C,
    effects: DragEffects,
    command: Option<DropCommand<C>>,
    can_drop: Option<DropPredicate<C>>,
    hovered: bool,
}

impl<C: fmt::Debug> fmt::Debug for DropTarget<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropTarget")
            .field("accepted_tag", &self.accepted_tag)
            .field("context", &self.context)
            .field("effects", &self.effects)
            .field("command", &self.command.as_ref().map(|_| ".."))
            .field("can_drop", &self.can_drop.as_ref().map(|_| ".."))
            .field("hovered", &self.hovered)
            .finish()
    }
}

impl<C> DropTarget<C> {
    /// Accept payloads tagged `accepted_tag`, bound to `context`.
    #[must_use]
    pub fn new(accepted_tag: impl Into<String>, context: C) -> Self {
        Self {
            accepted_tag: accepted_tag.into(),
            context,
            effects: DragEffects::MOVE,
            command: None,
            can_drop: None,
            hovered: false,
        }
    }

    /// Command to run on an accepted drop.
    #[must_use]
    pub fn on_drop_command(mut self, command: impl FnMut(&DragPayload, &C) + 'static) -> Self {
        self.command = Some(Box::new(command));
        self
    }

    /// Predicate that must hold for a drop to run its command.
    #[must_use]
    pub fn can_drop_when(mut self, predicate: impl Fn(&DragPayload, &C) -> bool + 'static) -> Self {
        self.can_drop = Some(Box::new(predicate));
        self
    }

    /// Effects offered for matching payloads (default: `MOVE`).
    #[must_use]
    pub fn with_effects(mut self, effects: DragEffects) -> Self {
        self.effects = effects;
        self
    }

    /// Tag this target accepts.
    #[must_use]
    pub fn accepted_tag(&self) -> &str {
        &self.accepted_tag
    }

    /// Bound context value.
    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Whether a matching drag currently hovers this target.
    #[must_use]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// A drag entered the target.
    pub fn on_drag_enter(&mut self, payload: &DragPayload) -> DragEffects {
        self.on_drag_over(payload)
    }

    /// A drag moved over the target. Cheap; called on every move.
    pub fn on_drag_over(&mut self, payload: &DragPayload) -> DragEffects {
        let accepts = payload.matches_type(&self.accepted_tag);
        self.hovered = accepts;
        if accepts { self.effects } else { DragEffects::NONE }
    }

    /// The drag left without dropping.
    pub fn on_drag_leave(&mut self) {
        self.hovered = false;
    }

    /// Handle a drop.
    pub fn on_drop(&mut self, payload: &DragPayload) -> DropResult {
        self.hovered = false;
        if !payload.matches_type(&self.accepted_tag) {
            reorderkit_core::debug!(
                expected = %self.accepted_tag,
                got = %payload.drag_type,
                "drop rejected: tag mismatch"
            );
            return DropResult::rejected(format!(
                "expected `{}` payload, got `{}`",
                self.accepted_tag, payload.drag_type
            ));
        }
        if let Some(can_drop) = &self.can_drop
            && !can_drop(payload, &self.context)
        {
            return DropResult::rejected("drop refused by predicate");
        }
        let Some(command) = self.command.as_mut() else {
            return DropResult::rejected("no drop command bound");
        };
        command(payload, &self.context);
        DropResult::Accepted
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
