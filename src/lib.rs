//! Overcut is a client-side editing engine for short promotional videos.
//!
//! It covers the two halves of that workflow with no UI and no IO of its
//! own:
//!
//! 1. **Assemble**: order trimmed clips on a [`Timeline`], with a seam
//!    transition between each adjacent pair, and produce the payloads a
//!    compose service consumes.
//! 2. **Overlay**: place timed text/logo/caption [`Layer`]s over a video,
//!    sample their animated state for any playhead position, and walk a
//!    saved document through the render job lifecycle.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Pure edits**: every mutation either applies (clamped to a valid
//!   state) or comes back as an [`EditRejection`] that left nothing
//!   changed.
//! - **No IO in the engine**: sessions hand out [`BackendRequest`] values
//!   and consume [`Completion`]s; the host owns the transport.
//! - **Injectable time**: anything time-driven reads a [`TimeSource`], so
//!   debounce windows and playback are testable without sleeping.
#![forbid(unsafe_code)]

pub mod anim;
pub mod backend;
pub mod clock;
pub mod drag;
pub mod error;
pub mod eval;
pub mod job;
pub mod overlay;
pub mod payload;
pub mod preview;
pub mod session;
pub mod timeline;
pub mod transitions;

pub use anim::{Animation, LayerPose, animation_state};
pub use backend::{
    BackendError, BackendResult, ComposeBackend, InMemoryComposeBackend, InMemoryOverlayBackend,
    OverlayBackend, RequestToken,
};
pub use clock::{ManualClock, PlaybackClock, TimeSource};
pub use drag::{LayerDrag, ReorderDrag, drag_rect, reorder_slot};
pub use error::{EditRejection, EditResult, OvercutError, OvercutResult};
pub use eval::{FrameSample, LayerFrame, sample_frame};
pub use job::{
    BackendRequest, Completion, CosmeticProgress, JobStatus, ProgressOpts, RenderJobController,
};
pub use overlay::{Layer, LayerId, LayerKind, LayerRect, OverlayProject, TextAlign};
pub use payload::{
    ClipPayload, ComposeAck, ComposeRequest, OverlaySavePayload, PreviewQuery, PreviewSummary,
    RenderAck, SaveAck,
};
pub use preview::{PreviewOpts, PreviewRequest, PreviewSummarizer};
pub use session::{AssemblerSession, OverlaySession};
pub use timeline::{AssetMeta, Clip, ClipId, OutputFormat, Timeline};
pub use transitions::{Transition, TransitionKind};
