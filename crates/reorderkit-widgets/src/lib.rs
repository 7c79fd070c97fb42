#![forbid(unsafe_code)]

//! Drag-to-reorder for list widgets, and the drag source / drop target
//! protocol it rides on.

pub mod drag;
pub mod reorder;

pub use drag::{
    DragConfig, DragEffects, DragError, DragPayload, DragPlatform, DragSource, DropResult,
    DropTarget,
};
pub use reorder::{
    DisplacementPlan, DragPhase, DragSession, GhostConfig, GhostOverlay, ItemTransform,
    ReorderConfig, ReorderController, ReorderError, ReorderEvent, ReorderHost, ReorderInput,
    ReorderOutcome, Snapshot, TransformAnimator,
};
