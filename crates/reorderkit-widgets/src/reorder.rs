#![forbid(unsafe_code)]

//! Drag-to-reorder controller for ordered lists.
//!
//! [`ReorderController`] turns pointer input over a list into a preview of
//! the reorder (a ghost overlay under the pointer, the other items sliding
//! out of the way) and, on drop, a single [`ReorderEvent`]. The list itself
//! is never touched; the host applies the event to its collection.
//!
//! # State Machine
//!
//! ```text
//! Idle ──press over item──▶ Armed ──move past threshold──▶ Dragging
//!   ▲                         │                              │
//!   │                      release                   drop │ leave/cancel
//!   │                      (click)                        ▼        ▼
//!   └───────────────cleanup──────────────────── Committed   Cancelled
//! ```
//!
//! # Invariants
//!
//! 1. At most one session per controller; presses during a session are
//!    ignored.
//! 2. A [`ReorderEvent`] is emitted at most once per session, only on drop,
//!    and never when the item would land where it started.
//! 3. Every exit from `Dragging` runs the same cleanup, in this order: stop
//!    tracking, destroy the ghost, animate every touched item back to
//!    neutral, clear the indices.
//! 4. Cleanup is idempotent.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Item has no bounds | Not laid out yet | Skipped by the resolver |
//! | Snapshot missing or empty | Host cannot render the item | Drag continues without ghost |
//! | Platform refuses drag | `begin_drag` returned `Err` | Drag continues in-process |
//! | Foreign payload dropped | Tag or source mismatch | Session cancelled, no event |
//! | List shrank under the source | Host mutated mid-drag | Session cancelled, no event |
//! | Released outside the list | Pointer off [`ReorderHost::list_bounds`] | Session cancelled, no event |

pub mod animator;
pub mod displacement;
pub mod ghost;
pub mod resolve;

use std::fmt;
use std::time::Duration;

use reorderkit_core::animation::Easing;
use reorderkit_core::geometry::{Position, Rect};

use crate::drag::{DEFAULT_DRAG_TAG, DragConfig, DragPayload, DragPlatform};

pub use animator::TransformAnimator;
pub use displacement::{DisplacementPlan, ItemTransform, adjusted_drop_index};
pub use ghost::{GhostConfig, GhostError, GhostOverlay, Snapshot};
pub use resolve::{resolve_target_index, resolve_with_host};

// ---------------------------------------------------------------------------
// ReorderEvent
// ---------------------------------------------------------------------------

/// A committed reorder: move the item at `old_index` so it ends up at
/// `new_index`.
///
/// `new_index` already accounts for the removal of the item from its old
/// slot, so `items.remove(old_index)` followed by
/// `items.insert(new_index, item)` applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReorderEvent {
    pub old_index: usize,
    pub new_index: usize,
}

impl ReorderEvent {
    /// Create an event.
    #[must_use]
    pub const fn new(old_index: usize, new_index: usize) -> Self {
        Self {
            old_index,
            new_index,
        }
    }

    /// Event for dropping `source` at slot `candidate`; `None` when the
    /// item would stay where it is.
    #[must_use]
    pub fn from_drop(source: usize, candidate: usize) -> Option<Self> {
        let new_index = adjusted_drop_index(source, candidate);
        (new_index != source).then_some(Self::new(source, new_index))
    }

    /// Apply the event to a slice in place.
    ///
    /// Out-of-range indices leave the slice untouched.
    pub fn apply<T>(&self, items: &mut [T]) {
        let (old, new) = (self.old_index, self.new_index);
        if old >= items.len() || new >= items.len() {
            return;
        }
        if old < new {
            items[old..=new].rotate_left(1);
        } else {
            items[new..=old].rotate_right(1);
        }
    }
}

/// Value carried by the platform drag a reorder starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderPayload {
    /// Index of the dragged item at press time.
    pub source_index: usize,
}

// ---------------------------------------------------------------------------
// ReorderConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`ReorderController`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReorderConfig {
    /// Click versus drag detection.
    pub drag: DragConfig,
    /// Duration of the slide when items make room (default: 200).
    pub displace_duration_ms: u64,
    /// Duration of the slide back to rest after a drag (default: 150).
    pub reset_duration_ms: u64,
    /// Easing for both slides (default: cubic ease-out).
    pub easing: Easing,
    /// Tag of the payload the platform drag carries (default: `"Item"`).
    pub drag_tag: String,
    /// Ghost overlay appearance.
    pub ghost: GhostConfig,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            drag: DragConfig::default(),
            displace_duration_ms: 200,
            reset_duration_ms: 150,
            easing: Easing::EaseOutCubic,
            drag_tag: DEFAULT_DRAG_TAG.to_string(),
            ghost: GhostConfig::default(),
        }
    }
}

impl ReorderConfig {
    /// Set the gesture configuration.
    #[must_use]
    pub fn with_drag(mut self, drag: DragConfig) -> Self {
        self.drag = drag;
        self
    }

    /// Set the displacement slide duration.
    #[must_use]
    pub fn with_displace_duration_ms(mut self, ms: u64) -> Self {
        self.displace_duration_ms = ms;
        self
    }

    /// Set the reset slide duration.
    #[must_use]
    pub fn with_reset_duration_ms(mut self, ms: u64) -> Self {
        self.reset_duration_ms = ms;
        self
    }

    /// Set the easing curve.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the payload tag.
    #[must_use]
    pub fn with_drag_tag(mut self, tag: impl Into<String>) -> Self {
        self.drag_tag = tag.into();
        self
    }

    /// Set the ghost appearance.
    #[must_use]
    pub fn with_ghost(mut self, ghost: GhostConfig) -> Self {
        self.ghost = ghost;
        self
    }

    /// Displacement slide duration.
    #[must_use]
    pub fn displace_duration(&self) -> Duration {
        Duration::from_millis(self.displace_duration_ms)
    }

    /// Reset slide duration.
    #[must_use]
    pub fn reset_duration(&self) -> Duration {
        Duration::from_millis(self.reset_duration_ms)
    }
}

// ---------------------------------------------------------------------------
// ReorderHost
// ---------------------------------------------------------------------------

/// What the controller needs from the list widget hosting it.
///
/// Everything is index-based; the controller never sees the items
/// themselves. Layout queries are asked fresh on every pointer event since
/// the layout may change between them.
pub trait ReorderHost: DragPlatform {
    /// Image type of item snapshots.
    type Image;

    /// Number of items currently displayed.
    fn item_count(&self) -> usize;

    /// Current bounds of item `index`, or `None` if it is not laid out.
    fn bounds_of(&self, index: usize) -> Option<Rect>;

    /// Index of the item under `pos`.
    fn index_at(&self, pos: Position) -> Option<usize>;

    /// Area that accepts a drop.
    ///
    /// Defaults to the union of the measured item bounds. Hosts whose
    /// viewport reaches past the last item should return the viewport.
    fn list_bounds(&self) -> Option<Rect> {
        (0..self.item_count())
            .filter_map(|index| self.bounds_of(index))
            .filter(|rect| !rect.is_empty())
            .reduce(|a, b| a.union(&b))
    }

    /// Render item `index` into a snapshot for the ghost overlay.
    fn snapshot(&self, index: usize) -> Option<Snapshot<Self::Image>>;

    /// Set item `index`'s transform immediately.
    fn apply_transform(&mut self, index: usize, transform: ItemTransform);

    /// Animate item `index` from its current transform to `target`.
    fn begin_animation(
        &mut self,
        index: usize,
        target: ItemTransform,
        duration: Duration,
        easing: Easing,
    );

    /// Show the floating overlay with `snapshot`.
    fn show_overlay(&mut self, snapshot: &Snapshot<Self::Image>, opacity: f32);

    /// Move the overlay's top-left corner to `(x, y)`.
    ///
    /// Called on every pointer update; must bypass layout.
    fn place_overlay(&mut self, x: i32, y: i32);

    /// Remove the overlay. Called exactly once per shown overlay.
    fn remove_overlay(&mut self);

    /// Current pointer position, for platforms whose drag loop swallows
    /// move events. Read by [`ReorderController::poll`].
    fn poll_pointer(&self) -> Option<Position> {
        None
    }

    /// A drop committed a reorder.
    fn on_reordered(&mut self, event: ReorderEvent);
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Lifecycle phase of a drag session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// No pointer is down.
    Idle,
    /// Pressed over an item; not yet past the threshold.
    Armed,
    /// Dragging with the ghost visible.
    Dragging,
    /// Dropped over the list. Seen via [`ReorderController::last_session`].
    Committed,
    /// Abandoned. Seen via [`ReorderController::last_session`].
    Cancelled,
}

/// State of one press-to-release gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    start_position: Position,
    last_position: Position,
    source_index: usize,
    phase: DragPhase,
    candidate_index: Option<usize>,
    extent: i16,
}

impl DragSession {
    fn armed(start_position: Position, source_index: usize) -> Self {
        Self {
            start_position,
            last_position: start_position,
            source_index,
            phase: DragPhase::Armed,
            candidate_index: None,
            extent: 1,
        }
    }

    /// Where the pointer was pressed.
    #[must_use]
    pub fn start_position(&self) -> Position {
        self.start_position
    }

    /// Most recent pointer position fed to the session.
    #[must_use]
    pub fn last_position(&self) -> Position {
        self.last_position
    }

    /// Index of the pressed item.
    #[must_use]
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Slot the item would land in if dropped now; `None` until dragging.
    #[must_use]
    pub fn candidate_index(&self) -> Option<usize> {
        self.candidate_index
    }

    /// Height of the dragged item, the distance displaced items move.
    #[must_use]
    pub fn extent(&self) -> i16 {
        self.extent
    }
}

// ---------------------------------------------------------------------------
// Input / Outcome / Error
// ---------------------------------------------------------------------------

/// Input the host feeds to [`ReorderController::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderInput {
    /// Primary button pressed.
    Press(Position),
    /// Pointer moved (button held, or platform drag-over).
    Move(Position),
    /// Primary button released.
    Release(Position),
    /// Platform drop over the list.
    Drop(Position),
    /// The platform drag left the list.
    DragLeave,
    /// The platform cancelled the drag, or pointer capture was lost.
    Cancel,
    /// Escape pressed.
    Escape,
    /// The window lost focus.
    FocusLost,
    /// Polling tick; reads [`ReorderHost::poll_pointer`].
    Poll,
    /// The application is shutting down.
    Shutdown,
}

/// What a call to the controller did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The input did not apply in the current phase.
    Ignored,
    /// Pressed over `index`; waiting for the threshold.
    Armed { index: usize },
    /// Released without dragging: a plain selection click on `index`.
    Clicked { index: usize },
    /// The drag of `index` started.
    DragStarted { index: usize },
    /// The drag moved; the item would land in slot `candidate`.
    Updated { candidate: usize },
    /// Dropped and reordered.
    Reordered(ReorderEvent),
    /// Dropped where it started; nothing to do.
    Dropped,
    /// The session was cancelled.
    Cancelled,
}

/// Internal failure that aborts a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderError {
    /// The source index no longer exists.
    SourceOutOfRange { index: usize, count: usize },
    /// The list became empty.
    EmptyList,
}

impl fmt::Display for ReorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceOutOfRange { index, count } => {
                write!(f, "source index {index} out of range for {count} items")
            }
            Self::EmptyList => write!(f, "list is empty"),
        }
    }
}

impl std::error::Error for ReorderError {}

// ---------------------------------------------------------------------------
// ReorderController
// ---------------------------------------------------------------------------

/// Drag-to-reorder state machine for one list.
///
/// Generic over the host's snapshot image type `I`.
#[derive(Debug)]
pub struct ReorderController<I> {
    config: ReorderConfig,
    session: Option<DragSession>,
    ended: Option<DragSession>,
    ghost: Option<GhostOverlay<I>>,
    plan: DisplacementPlan,
    tracking: bool,
}

impl<I> Default for ReorderController<I> {
    fn default() -> Self {
        Self::new(ReorderConfig::default())
    }
}

impl<I> ReorderController<I> {
    /// Create an idle controller.
    #[must_use]
    pub fn new(config: ReorderConfig) -> Self {
        Self {
            config,
            session: None,
            ended: None,
            ghost: None,
            plan: DisplacementPlan::neutral(0),
            tracking: false,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ReorderConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next session.
    pub fn set_config(&mut self, config: ReorderConfig) {
        self.config = config;
    }

    /// Current phase; `Idle` when no session is live.
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.session.as_ref().map_or(DragPhase::Idle, |s| s.phase)
    }

    /// Live session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Last session ended by a drop or a cancel, in its final phase
    /// (`Committed` or `Cancelled`). Cleared when the next press arms.
    #[must_use]
    pub fn last_session(&self) -> Option<&DragSession> {
        self.ended.as_ref()
    }

    /// Whether a session (armed or dragging) is live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.phase() == DragPhase::Dragging
    }

    /// Pressed item, if a session is live.
    #[must_use]
    pub fn source_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.source_index)
    }

    /// Slot the item would land in if dropped now.
    #[must_use]
    pub fn candidate_index(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.candidate_index)
    }

    /// Displacement currently previewed.
    #[must_use]
    pub fn plan(&self) -> &DisplacementPlan {
        &self.plan
    }

    /// Ghost overlay, while one is shown.
    #[must_use]
    pub fn ghost(&self) -> Option<&GhostOverlay<I>> {
        self.ghost.as_ref()
    }

    /// Whether pointer tracking (and polling) is live.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Feed one input.
    pub fn handle<H>(&mut self, host: &mut H, input: ReorderInput) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        match input {
            ReorderInput::Press(pos) => self.press(host, pos),
            ReorderInput::Move(pos) => self.pointer_move(host, pos),
            ReorderInput::Release(pos) => self.release(host, pos),
            ReorderInput::Drop(pos) => self.drop_at(host, pos),
            ReorderInput::DragLeave => self.drag_leave(host),
            ReorderInput::Cancel => self.cancel(host),
            ReorderInput::Escape => self.escape(host),
            ReorderInput::FocusLost => self.focus_lost(host),
            ReorderInput::Poll => self.poll(host),
            ReorderInput::Shutdown => self.shutdown(host),
        }
    }

    /// Pointer pressed.
    pub fn press<H>(&mut self, host: &mut H, pos: Position) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        if self.session.is_some() {
            reorderkit_core::trace!(x = pos.x, y = pos.y, "press ignored: session active");
            return ReorderOutcome::Ignored;
        }
        let count = host.item_count();
        let Some(index) = host.index_at(pos).filter(|&i| i < count) else {
            return ReorderOutcome::Ignored;
        };
        reorderkit_core::debug!(index, x = pos.x, y = pos.y, "reorder armed");
        self.session = Some(DragSession::armed(pos, index));
        self.ended = None;
        ReorderOutcome::Armed { index }
    }

    /// Pointer moved.
    pub fn pointer_move<H>(&mut self, host: &mut H, pos: Position) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        let Some(session) = self.session.as_ref() else {
            return ReorderOutcome::Ignored;
        };
        match session.phase {
            DragPhase::Armed => {
                if self
                    .config
                    .drag
                    .exceeds_threshold(session.start_position, pos)
                {
                    self.start_drag(host, pos)
                } else {
                    ReorderOutcome::Ignored
                }
            }
            DragPhase::Dragging => self.update(host, pos),
            _ => ReorderOutcome::Ignored,
        }
    }

    /// Polling tick: pull the pointer position from the host.
    ///
    /// Keeps the ghost and the displacement live while the platform's drag
    /// loop withholds move events.
    pub fn poll<H>(&mut self, host: &mut H) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        if !self.tracking {
            return ReorderOutcome::Ignored;
        }
        let Some(pos) = host.poll_pointer() else {
            return ReorderOutcome::Ignored;
        };
        // Resolve even at the same position: the list may have scrolled.
        self.update(host, pos)
    }

    /// Primary button released.
    ///
    /// Without a drag this is a selection click; during a drag it drops.
    pub fn release<H>(&mut self, host: &mut H, pos: Position) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        match self.phase() {
            DragPhase::Armed => {
                let index = self.source_index().unwrap_or_default();
                self.session = None;
                reorderkit_core::debug!(index, "reorder click");
                ReorderOutcome::Clicked { index }
            }
            DragPhase::Dragging => self.drop_at(host, pos),
            _ => ReorderOutcome::Ignored,
        }
    }

    /// Drop at `pos`. Returns the emitted event, if any.
    pub fn drop<H>(&mut self, host: &mut H, pos: Position) -> Option<ReorderEvent>
    where
        H: ReorderHost<Image = I>,
    {
        match self.drop_at(host, pos) {
            ReorderOutcome::Reordered(event) => Some(event),
            _ => None,
        }
    }

    /// Platform drop carrying `payload`.
    ///
    /// Payloads that did not come from this controller's drag are rejected
    /// and the session cancelled.
    pub fn drop_payload<H>(
        &mut self,
        host: &mut H,
        payload: &DragPayload,
        pos: Position,
    ) -> Option<ReorderEvent>
    where
        H: ReorderHost<Image = I>,
    {
        let ours = payload.drag_type == self.config.drag_tag
            && payload.value::<ReorderPayload>().map(|p| p.source_index) == self.source_index();
        if !ours {
            reorderkit_core::debug!(tag = %payload.drag_type, "reorder drop rejected: foreign payload");
            self.finish(host, DragPhase::Cancelled);
            return None;
        }
        self.drop(host, pos)
    }

    /// The platform drag left the list.
    pub fn drag_leave<H>(&mut self, host: &mut H) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        self.cancel(host)
    }

    /// Escape pressed; cancels only when configured to.
    pub fn escape<H>(&mut self, host: &mut H) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        if self.config.drag.cancel_on_escape {
            self.cancel(host)
        } else {
            ReorderOutcome::Ignored
        }
    }

    /// The window lost focus.
    pub fn focus_lost<H>(&mut self, host: &mut H) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        self.cancel(host)
    }

    /// The application is shutting down.
    pub fn shutdown<H>(&mut self, host: &mut H) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        self.cancel(host)
    }

    /// Abandon the session without emitting an event.
    pub fn cancel<H>(&mut self, host: &mut H) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        if self.session.is_none() {
            return ReorderOutcome::Ignored;
        }
        self.finish(host, DragPhase::Cancelled);
        ReorderOutcome::Cancelled
    }

    // -- internals ----------------------------------------------------------

    fn drop_at<H>(&mut self, host: &mut H, pos: Position) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        match self.phase() {
            DragPhase::Dragging => {}
            DragPhase::Armed => return self.cancel(host),
            _ => return ReorderOutcome::Ignored,
        }

        if let Err(err) = self.try_update(host, pos) {
            return self.abort(host, err);
        }
        if !host.list_bounds().is_some_and(|area| area.contains(pos)) {
            reorderkit_core::debug!(x = pos.x, y = pos.y, "reorder drop outside list");
            self.finish(host, DragPhase::Cancelled);
            return ReorderOutcome::Cancelled;
        }
        let event = self
            .session
            .as_ref()
            .and_then(|s| ReorderEvent::from_drop(s.source_index, s.candidate_index?));

        if let Some(event) = event {
            reorderkit_core::debug!(
                old_index = event.old_index,
                new_index = event.new_index,
                "reorder committed"
            );
            host.on_reordered(event);
        }
        self.finish(host, DragPhase::Committed);
        event.map_or(ReorderOutcome::Dropped, ReorderOutcome::Reordered)
    }

    fn start_drag<H>(&mut self, host: &mut H, pos: Position) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        let Some(session) = self.session.as_mut() else {
            return ReorderOutcome::Ignored;
        };
        let source = session.source_index;
        let span = reorderkit_core::debug_span!("reorder.drag", source);
        let _guard = span.enter();

        let count = host.item_count();
        if source >= count {
            return self.abort(host, ReorderError::SourceOutOfRange { index: source, count });
        }

        let source_bounds = host.bounds_of(source);
        session.phase = DragPhase::Dragging;
        session.extent = source_bounds
            .map_or(1, |r| i16::try_from(r.height.max(1)).unwrap_or(i16::MAX));
        let grab = source_bounds.map_or((0, 0), |r| r.relative(session.start_position));
        self.tracking = true;
        self.plan = DisplacementPlan::neutral(count);

        match host.snapshot(source).map(GhostOverlay::create) {
            Some(Ok(mut ghost)) => {
                ghost.set_grab_offset(grab.0, grab.1);
                host.show_overlay(ghost.snapshot(), self.config.ghost.opacity);
                self.ghost = Some(ghost);
            }
            Some(Err(err)) => {
                reorderkit_core::warn!(error = %err, source, "dragging without ghost");
            }
            None => {
                reorderkit_core::warn!(source, "no snapshot; dragging without ghost");
            }
        }

        let payload = DragPayload::new(
            self.config.drag_tag.clone(),
            ReorderPayload {
                source_index: source,
            },
        );
        if let Err(err) = host.begin_drag(payload) {
            reorderkit_core::warn!(error = %err, source, "platform drag refused; tracking in-process");
        }

        reorderkit_core::debug!(source, count, "reorder drag started");
        match self.update(host, pos) {
            ReorderOutcome::Updated { .. } => ReorderOutcome::DragStarted { index: source },
            other => other,
        }
    }

    fn update<H>(&mut self, host: &mut H, pos: Position) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        match self.try_update(host, pos) {
            Ok(candidate) => ReorderOutcome::Updated { candidate },
            Err(err) => self.abort(host, err),
        }
    }

    fn try_update<H>(&mut self, host: &mut H, pos: Position) -> Result<usize, ReorderError>
    where
        H: ReorderHost<Image = I>,
    {
        let Some(session) = self.session.as_mut() else {
            return Err(ReorderError::EmptyList);
        };
        session.last_position = pos;

        if let Some((x, y)) = self
            .ghost
            .as_mut()
            .and_then(|ghost| ghost.move_to(i32::from(pos.x), i32::from(pos.y)))
        {
            host.place_overlay(x, y);
        }

        let count = host.item_count();
        let source = session.source_index;
        if count == 0 {
            return Err(ReorderError::EmptyList);
        }
        if source >= count {
            return Err(ReorderError::SourceOutOfRange {
                index: source,
                count,
            });
        }

        let candidate = resolve_with_host(pos, &*host);
        if session.candidate_index == Some(candidate) && self.plan.len() == count {
            return Ok(candidate);
        }

        let next = DisplacementPlan::compute(source, candidate, count, session.extent);
        let duration = self.config.displace_duration();
        for (index, transform) in next.changed_from(&self.plan).filter(|&(i, _)| i < count) {
            if index == source {
                host.apply_transform(index, transform);
            } else {
                host.begin_animation(index, transform, duration, self.config.easing);
            }
        }
        reorderkit_core::trace!(source, candidate, "reorder candidate changed");
        self.plan = next;
        session.candidate_index = Some(candidate);
        Ok(candidate)
    }

    fn abort<H>(&mut self, host: &mut H, err: ReorderError) -> ReorderOutcome
    where
        H: ReorderHost<Image = I>,
    {
        reorderkit_core::warn!(error = %err, "reorder aborted");
        self.finish(host, DragPhase::Cancelled);
        ReorderOutcome::Cancelled
    }

    /// Tear down the session, leaving it in `last_session` in its final
    /// phase. No-op when idle.
    fn finish<H>(&mut self, host: &mut H, phase: DragPhase)
    where
        H: ReorderHost<Image = I>,
    {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.phase = phase;
        reorderkit_core::debug!(phase = ?phase, source = session.source_index, "reorder session ended");

        self.tracking = false;

        if self.ghost.take().is_some_and(|mut ghost| ghost.destroy()) {
            host.remove_overlay();
        }

        let count = host.item_count();
        let duration = self.config.reset_duration();
        let plan = std::mem::replace(&mut self.plan, DisplacementPlan::neutral(0));
        for (index, transform) in plan.iter() {
            if index < count && !transform.is_neutral() {
                host.begin_animation(index, ItemTransform::NEUTRAL, duration, self.config.easing);
            }
        }

        self.ended = self.session.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::{DragEffects, DragError};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Apply(usize, ItemTransform),
        Animate(usize, ItemTransform),
        Show,
        Place(i32, i32),
        Remove,
        BeginDrag(String),
        Reordered(ReorderEvent),
    }

    /// Rows of one cell each, stacked from y = 0; logs every host call.
    struct Host {
        count: usize,
        calls: Vec<Call>,
        timings: Vec<(usize, ItemTransform, Duration, Easing)>,
        poll: Option<Position>,
        empty_snapshot: bool,
    }

    impl Host {
        fn new(count: usize) -> Self {
            Self {
                count,
                calls: Vec::new(),
                timings: Vec::new(),
                poll: None,
                empty_snapshot: false,
            }
        }

        fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|c| f(c)).count()
        }
    }

    impl DragPlatform for Host {
        fn begin_drag(&mut self, payload: DragPayload) -> Result<DragEffects, DragError> {
            self.calls.push(Call::BeginDrag(payload.drag_type));
            Ok(DragEffects::MOVE)
        }
    }

    impl ReorderHost for Host {
        type Image = ();

        fn item_count(&self) -> usize {
            self.count
        }

        fn bounds_of(&self, index: usize) -> Option<Rect> {
            (index < self.count).then(|| Rect::new(0, index as u16, 20, 1))
        }

        fn index_at(&self, pos: Position) -> Option<usize> {
            let i = usize::from(pos.y);
            (i < self.count).then_some(i)
        }

        fn snapshot(&self, _index: usize) -> Option<Snapshot<()>> {
            let width = if self.empty_snapshot { 0 } else { 20 };
            Some(Snapshot::new((), width, 1))
        }

        fn apply_transform(&mut self, index: usize, transform: ItemTransform) {
            self.calls.push(Call::Apply(index, transform));
        }

        fn begin_animation(
            &mut self,
            index: usize,
            target: ItemTransform,
            duration: Duration,
            easing: Easing,
        ) {
            self.calls.push(Call::Animate(index, target));
            self.timings.push((index, target, duration, easing));
        }

        fn show_overlay(&mut self, _snapshot: &Snapshot<()>, _opacity: f32) {
            self.calls.push(Call::Show);
        }

        fn place_overlay(&mut self, x: i32, y: i32) {
            self.calls.push(Call::Place(x, y));
        }

        fn remove_overlay(&mut self) {
            self.calls.push(Call::Remove);
        }

        fn poll_pointer(&self) -> Option<Position> {
            self.poll
        }

        fn on_reordered(&mut self, event: ReorderEvent) {
            self.calls.push(Call::Reordered(event));
        }
    }

    fn controller() -> ReorderController<()> {
        ReorderController::default()
    }

    #[test]
    fn reorder_event_from_drop() {
        assert_eq!(ReorderEvent::from_drop(1, 4), Some(ReorderEvent::new(1, 3)));
        assert_eq!(ReorderEvent::from_drop(3, 0), Some(ReorderEvent::new(3, 0)));
        assert_eq!(ReorderEvent::from_drop(2, 2), None);
        assert_eq!(ReorderEvent::from_drop(2, 3), None);
    }

    #[test]
    fn reorder_event_apply() {
        let mut items = ['A', 'B', 'C', 'D', 'E'];
        ReorderEvent::new(1, 3).apply(&mut items);
        assert_eq!(items, ['A', 'C', 'D', 'B', 'E']);
        ReorderEvent::new(3, 0).apply(&mut items);
        assert_eq!(items, ['B', 'A', 'C', 'D', 'E']);
        ReorderEvent::new(0, 9).apply(&mut items);
        assert_eq!(items, ['B', 'A', 'C', 'D', 'E']);
    }

    #[test]
    fn config_defaults() {
        let cfg = ReorderConfig::default();
        assert_eq!(cfg.displace_duration(), Duration::from_millis(200));
        assert_eq!(cfg.reset_duration(), Duration::from_millis(150));
        assert_eq!(cfg.easing, Easing::EaseOutCubic);
        assert_eq!(cfg.drag_tag, "Item");
    }

    #[test]
    fn press_over_nothing_stays_idle() {
        let mut host = Host::new(3);
        let mut c = controller();
        assert_eq!(c.press(&mut host, Position::new(0, 10)), ReorderOutcome::Ignored);
        assert_eq!(c.phase(), DragPhase::Idle);
        assert_eq!(c.source_index(), None);
    }

    #[test]
    fn press_arms_without_visuals() {
        let mut host = Host::new(3);
        let mut c = controller();
        assert_eq!(
            c.press(&mut host, Position::new(2, 1)),
            ReorderOutcome::Armed { index: 1 }
        );
        assert_eq!(c.phase(), DragPhase::Armed);
        assert_eq!(c.candidate_index(), None);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn small_move_then_release_is_a_click() {
        let mut host = Host::new(3);
        let mut c = controller();
        c.press(&mut host, Position::new(2, 1));
        assert_eq!(c.pointer_move(&mut host, Position::new(3, 2)), ReorderOutcome::Ignored);
        assert_eq!(
            c.release(&mut host, Position::new(3, 2)),
            ReorderOutcome::Clicked { index: 1 }
        );
        assert_eq!(c.phase(), DragPhase::Idle);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn second_press_during_session_is_ignored() {
        let mut host = Host::new(3);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        assert_eq!(c.press(&mut host, Position::new(0, 2)), ReorderOutcome::Ignored);
        assert_eq!(c.source_index(), Some(0));
    }

    #[test]
    fn drag_start_sequence() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(4, 2));
        assert_eq!(
            c.pointer_move(&mut host, Position::new(4, 4)),
            ReorderOutcome::DragStarted { index: 2 }
        );
        assert!(c.is_dragging());
        assert!(c.is_tracking());
        assert_eq!(c.candidate_index(), Some(4));
        assert_eq!(
            host.calls[..3],
            [
                Call::Show,
                Call::BeginDrag("Item".into()),
                Call::Place(0, 4),
            ]
        );
        assert!(host.calls.contains(&Call::Apply(2, ItemTransform::HIDDEN)));
        assert!(host.calls.contains(&Call::Animate(3, ItemTransform::shifted(-1))));
        assert!(!host.calls.iter().any(|c| matches!(c, Call::Animate(4, _))));
    }

    #[test]
    fn unchanged_candidate_only_moves_ghost() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 2));
        let before = host.calls.len();
        c.pointer_move(&mut host, Position::new(5, 2));
        assert_eq!(host.calls[before..], [Call::Place(5, 2)]);
    }

    #[test]
    fn drop_emits_once_and_cleans_up() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 1));
        c.pointer_move(&mut host, Position::new(0, 3));
        let event = c.drop(&mut host, Position::new(0, 3));
        assert_eq!(event, Some(ReorderEvent::new(1, 2)));
        assert_eq!(host.count(|c| matches!(c, Call::Reordered(_))), 1);
        assert_eq!(host.count(|c| *c == Call::Remove), 1);
        assert_eq!(c.phase(), DragPhase::Idle);
        assert!(!c.is_tracking());
        assert!(c.ghost().is_none());
        assert!(c.plan().is_empty());
        // Source fades back in.
        assert!(host.calls.contains(&Call::Animate(1, ItemTransform::NEUTRAL)));
    }

    #[test]
    fn drop_in_place_is_silent() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 2));
        c.pointer_move(&mut host, Position::new(5, 2));
        assert_eq!(c.candidate_index(), Some(2));
        assert_eq!(
            c.release(&mut host, Position::new(5, 2)),
            ReorderOutcome::Dropped
        );
        assert_eq!(host.count(|c| matches!(c, Call::Reordered(_))), 0);
        assert_eq!(host.count(|c| *c == Call::Remove), 1);
    }

    #[test]
    fn cancel_twice_is_harmless() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 4));
        assert_eq!(c.drag_leave(&mut host), ReorderOutcome::Cancelled);
        let after_first = host.calls.len();
        assert_eq!(c.cancel(&mut host), ReorderOutcome::Ignored);
        assert_eq!(host.calls.len(), after_first);
        assert_eq!(host.count(|c| matches!(c, Call::Reordered(_))), 0);
    }

    #[test]
    fn escape_respects_config() {
        let mut host = Host::new(3);
        let mut c = ReorderController::new(
            ReorderConfig::default().with_drag(DragConfig::default().no_escape_cancel()),
        );
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 2));
        assert_eq!(c.escape(&mut host), ReorderOutcome::Ignored);
        assert!(c.is_dragging());

        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 2));
        assert_eq!(c.escape(&mut host), ReorderOutcome::Cancelled);
    }

    #[test]
    fn empty_snapshot_drags_without_ghost() {
        let mut host = Host::new(3);
        host.empty_snapshot = true;
        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        assert_eq!(
            c.pointer_move(&mut host, Position::new(0, 2)),
            ReorderOutcome::DragStarted { index: 0 }
        );
        assert!(c.ghost().is_none());
        c.cancel(&mut host);
        assert_eq!(host.count(|c| matches!(c, Call::Show | Call::Place(..) | Call::Remove)), 0);
    }

    #[test]
    fn shrinking_list_aborts_drag() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 4));
        c.pointer_move(&mut host, Position::new(0, 1));
        host.count = 3;
        assert_eq!(
            c.pointer_move(&mut host, Position::new(0, 0)),
            ReorderOutcome::Cancelled
        );
        assert_eq!(c.phase(), DragPhase::Idle);
        assert_eq!(host.count(|c| *c == Call::Remove), 1);
        assert_eq!(host.count(|c| matches!(c, Call::Reordered(_))), 0);
    }

    #[test]
    fn poll_drives_updates_while_tracking() {
        let mut host = Host::new(5);
        let mut c = controller();
        assert_eq!(c.poll(&mut host), ReorderOutcome::Ignored);

        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 2));
        host.poll = Some(Position::new(0, 3));
        assert_eq!(c.poll(&mut host), ReorderOutcome::Updated { candidate: 3 });
        // Same position again still resolves, but nothing was displaced anew.
        let before = host.calls.len();
        assert_eq!(c.poll(&mut host), ReorderOutcome::Updated { candidate: 3 });
        assert_eq!(host.calls[before..], [Call::Place(0, 3)]);
    }

    #[test]
    fn slides_use_configured_timing() {
        let mut host = Host::new(5);
        let mut c = ReorderController::new(
            ReorderConfig::default()
                .with_displace_duration_ms(120)
                .with_reset_duration_ms(40)
                .with_easing(Easing::Linear),
        );
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 2));
        assert_eq!(
            host.timings,
            [(1, ItemTransform::shifted(-1), Duration::from_millis(120), Easing::Linear)]
        );

        c.cancel(&mut host);
        assert_eq!(
            host.timings[1..],
            [
                (0, ItemTransform::NEUTRAL, Duration::from_millis(40), Easing::Linear),
                (1, ItemTransform::NEUTRAL, Duration::from_millis(40), Easing::Linear),
            ]
        );
    }

    #[test]
    fn ghost_is_removed_before_items_reset() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 3));
        let before = host.calls.len();
        c.cancel(&mut host);
        assert_eq!(
            host.calls[before..],
            [
                Call::Remove,
                Call::Animate(0, ItemTransform::NEUTRAL),
                Call::Animate(1, ItemTransform::NEUTRAL),
                Call::Animate(2, ItemTransform::NEUTRAL),
            ]
        );
        assert!(!c.is_tracking());
        assert!(c.session().is_none());
    }

    #[test]
    fn last_session_reports_final_phase() {
        let mut host = Host::new(5);
        let mut c = controller();
        assert!(c.last_session().is_none());

        c.press(&mut host, Position::new(0, 1));
        c.pointer_move(&mut host, Position::new(0, 3));
        c.drop(&mut host, Position::new(0, 3));
        let ended = c.last_session().expect("dropped session");
        assert_eq!(ended.phase(), DragPhase::Committed);
        assert_eq!(ended.source_index(), 1);
        assert_eq!(ended.candidate_index(), Some(3));

        c.press(&mut host, Position::new(0, 2));
        assert!(c.last_session().is_none());
        c.pointer_move(&mut host, Position::new(0, 4));
        c.escape(&mut host);
        let ended = c.last_session().expect("cancelled session");
        assert_eq!(ended.phase(), DragPhase::Cancelled);
        assert_eq!(ended.source_index(), 2);
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn release_beside_the_list_cancels() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 3));
        assert_eq!(
            c.release(&mut host, Position::new(30, 3)),
            ReorderOutcome::Cancelled
        );
        assert_eq!(host.count(|c| matches!(c, Call::Reordered(_))), 0);
        assert_eq!(host.count(|c| *c == Call::Remove), 1);
        assert_eq!(
            c.last_session().map(DragSession::phase),
            Some(DragPhase::Cancelled)
        );
    }

    #[test]
    fn release_below_the_list_cancels() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 3));
        assert_eq!(c.drop(&mut host, Position::new(0, 9)), None);
        assert_eq!(host.count(|c| matches!(c, Call::Reordered(_))), 0);
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn foreign_payload_cancels() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 3));
        let foreign = DragPayload::new("Gear", 7u32);
        assert_eq!(c.drop_payload(&mut host, &foreign, Position::new(0, 3)), None);
        assert_eq!(c.phase(), DragPhase::Idle);
        assert_eq!(host.count(|c| matches!(c, Call::Reordered(_))), 0);
    }

    #[test]
    fn own_payload_commits() {
        let mut host = Host::new(5);
        let mut c = controller();
        c.press(&mut host, Position::new(0, 0));
        c.pointer_move(&mut host, Position::new(0, 3));
        let ours = DragPayload::new("Item", ReorderPayload { source_index: 0 });
        assert_eq!(
            c.drop_payload(&mut host, &ours, Position::new(0, 3)),
            Some(ReorderEvent::new(0, 2))
        );
    }

    #[test]
    fn handle_dispatches() {
        let mut host = Host::new(4);
        let mut c = controller();
        assert_eq!(
            c.handle(&mut host, ReorderInput::Press(Position::new(0, 3))),
            ReorderOutcome::Armed { index: 3 }
        );
        assert_eq!(
            c.handle(&mut host, ReorderInput::Move(Position::new(0, 0))),
            ReorderOutcome::DragStarted { index: 3 }
        );
        assert_eq!(
            c.handle(&mut host, ReorderInput::Drop(Position::new(0, 0))),
            ReorderOutcome::Reordered(ReorderEvent::new(3, 0))
        );
        assert_eq!(c.handle(&mut host, ReorderInput::FocusLost), ReorderOutcome::Ignored);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            ReorderError::SourceOutOfRange { index: 4, count: 3 }.to_string(),
            "source index 4 out of range for 3 items"
        );
        assert_eq!(ReorderError::EmptyList.to_string(), "list is empty");
    }
}
