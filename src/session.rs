use kurbo::{Point, Size};

use crate::{
    backend::{BackendError, ComposeBackend, OverlayBackend, RequestToken},
    clock::TimeSource,
    drag::{LayerDrag, ReorderDrag},
    error::{EditRejection, EditResult, OvercutResult},
    eval::{FrameSample, sample_frame},
    job::{BackendRequest, Completion, CosmeticProgress, JobStatus, RenderJobController},
    overlay::{LayerId, LayerKind, LayerRect, OverlayProject},
    payload::{ComposeRequest, PreviewSummary, clips_to_payload},
    preview::{PreviewOpts, PreviewRequest, PreviewSummarizer},
    timeline::{AssetMeta, ClipId, OutputFormat, Timeline},
    transitions::TransitionKind,
};

/// Owns one clip timeline end to end: edits, the debounced summary preview,
/// and the reorder drag. Every mutation restarts the preview's quiesce
/// window against the injected clock.
pub struct AssemblerSession<C: TimeSource> {
    timeline: Timeline,
    clock: C,
    preview: PreviewSummarizer,
    reorder: ReorderDrag,
}

impl<C: TimeSource> AssemblerSession<C> {
    pub fn new(clock: C, format: OutputFormat) -> Self {
        Self::with_opts(clock, format, PreviewOpts::default())
    }

    pub fn with_opts(clock: C, format: OutputFormat, opts: PreviewOpts) -> Self {
        Self {
            timeline: Timeline::new(format),
            clock,
            preview: PreviewSummarizer::new(opts),
            reorder: ReorderDrag::new(),
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn touch(&mut self) {
        self.preview.mark_dirty(self.clock.now());
    }

    pub fn add_clip(&mut self, asset: AssetMeta) -> ClipId {
        let id = self.timeline.add_clip(asset);
        self.touch();
        id
    }

    pub fn remove_clip(&mut self, index: usize) -> EditResult<()> {
        if let Some(clip) = self.timeline.clip(index) {
            self.reorder.cancel_if_target(clip.id);
        }
        self.timeline.remove_clip(index)?;
        self.touch();
        Ok(())
    }

    pub fn duplicate_clip(&mut self, index: usize) -> EditResult<ClipId> {
        let id = self.timeline.duplicate_clip(index)?;
        self.touch();
        Ok(id)
    }

    pub fn split_clip(&mut self, index: usize, at: f64) -> EditResult<ClipId> {
        let id = self.timeline.split_clip(index, at)?;
        self.touch();
        Ok(id)
    }

    pub fn reorder_clip(&mut self, from: usize, to: usize) -> EditResult<()> {
        self.timeline.reorder_clip(from, to)?;
        if from != to {
            self.touch();
        }
        Ok(())
    }

    pub fn update_trim_start(&mut self, index: usize, value: f64) -> EditResult<()> {
        self.timeline.update_trim_start(index, value)?;
        self.touch();
        Ok(())
    }

    pub fn update_trim_end(&mut self, index: usize, value: f64) -> EditResult<()> {
        self.timeline.update_trim_end(index, value)?;
        self.touch();
        Ok(())
    }

    pub fn set_transition(&mut self, seam: usize, kind: TransitionKind) -> EditResult<()> {
        self.timeline.set_transition(seam, kind)?;
        self.touch();
        Ok(())
    }

    pub fn set_transition_duration(&mut self, seam: usize, secs: f64) -> EditResult<()> {
        self.timeline.set_transition_duration(seam, secs)?;
        self.touch();
        Ok(())
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.timeline.format = format;
        self.touch();
    }

    /// Picks up a clip tile. A begin while another gesture is active is
    /// ignored.
    pub fn begin_clip_drag(&mut self, index: usize, pointer: Point) -> EditResult<()> {
        let clip = self
            .timeline
            .clip(index)
            .ok_or(EditRejection::IndexOutOfBounds)?;
        self.reorder.begin(clip.id, index, pointer);
        Ok(())
    }

    /// Slot the dragged clip is hovering over.
    pub fn drag_slot(&self, pointer: Point, slot_width: f64) -> Option<usize> {
        self.reorder
            .slot(pointer, slot_width, self.timeline.clip_count())
    }

    /// Drops the tile, committing the reorder. Returns the move that
    /// happened, if any.
    pub fn end_clip_drag(&mut self, pointer: Point, slot_width: f64) -> Option<(usize, usize)> {
        let slot = self.drag_slot(pointer, slot_width);
        let (id, _) = self.reorder.end()?;
        let from = self.timeline.index_of(id)?;
        let to = slot?;
        if from == to {
            return None;
        }
        self.timeline.reorder_clip(from, to).ok()?;
        self.touch();
        Some((from, to))
    }

    pub fn cancel_clip_drag(&mut self) {
        self.reorder.cancel();
    }

    pub fn poll_preview(&mut self) -> Option<PreviewRequest> {
        self.preview.poll(self.clock.now(), &self.timeline)
    }

    pub fn apply_preview(&mut self, token: RequestToken, summary: PreviewSummary) -> bool {
        self.preview.apply(token, summary)
    }

    pub fn latest_preview(&self) -> Option<&PreviewSummary> {
        self.preview.latest()
    }

    /// Polls the debounce and, when due, performs the round-trip against
    /// the backend. Returns whether a fresh summary was applied.
    pub fn pump_preview(
        &mut self,
        backend: &mut dyn ComposeBackend,
    ) -> Result<bool, BackendError> {
        let Some(request) = self.poll_preview() else {
            return Ok(false);
        };
        let summary = backend.preview_summary(&request.query)?;
        Ok(self.apply_preview(request.token, summary))
    }

    /// Final assembly payload for the current timeline.
    pub fn compose_request(&self, save_as_asset: bool) -> EditResult<ComposeRequest> {
        if self.timeline.is_empty() {
            return Err(EditRejection::EmptyTimeline);
        }
        Ok(ComposeRequest {
            clips: clips_to_payload(&self.timeline),
            output: self.timeline.format,
            save_as_asset,
        })
    }
}

/// Owns one overlay project: layer edits, the position drag, playback
/// sampling against the injected clock, and the render job state machine.
pub struct OverlaySession<C: TimeSource> {
    project: OverlayProject,
    clock: C,
    drag: LayerDrag,
    jobs: RenderJobController,
    progress: Option<CosmeticProgress>,
}

impl<C: TimeSource> OverlaySession<C> {
    pub fn new(clock: C, project: OverlayProject) -> Self {
        Self {
            project,
            clock,
            drag: LayerDrag::new(),
            jobs: RenderJobController::new(),
            progress: None,
        }
    }

    pub fn project(&self) -> &OverlayProject {
        &self.project
    }

    /// Direct access for styling edits (text, colors, windows). Structural
    /// edits and removal should go through the session so gestures stay
    /// consistent.
    pub fn project_mut(&mut self) -> &mut OverlayProject {
        &mut self.project
    }

    pub fn jobs(&self) -> &RenderJobController {
        &self.jobs
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn add_layer(&mut self, kind: LayerKind) -> LayerId {
        self.project.add_layer(kind)
    }

    /// Removes a layer, aborting the drag first when it is the target.
    pub fn remove_layer(&mut self, id: LayerId) -> EditResult<()> {
        self.drag.cancel_if_target(id);
        self.project.remove_layer(id)
    }

    pub fn duplicate_layer(&mut self, id: LayerId) -> EditResult<LayerId> {
        self.project.duplicate_layer(id)
    }

    pub fn move_layer_up(&mut self, id: LayerId) -> EditResult<()> {
        self.project.move_layer_up(id)
    }

    pub fn move_layer_down(&mut self, id: LayerId) -> EditResult<()> {
        self.project.move_layer_down(id)
    }

    pub fn select(&mut self, id: Option<LayerId>) -> EditResult<()> {
        self.project.select(id)
    }

    /// Starts dragging a layer, which also selects it. Ignored while
    /// another gesture is active.
    pub fn begin_drag(&mut self, id: LayerId, pointer: Point) -> EditResult<()> {
        let rect = self
            .project
            .layer(id)
            .map(|l| l.rect)
            .ok_or(EditRejection::UnknownLayer)?;
        if self.drag.begin(id, pointer, rect) {
            self.project.select(Some(id))?;
        }
        Ok(())
    }

    /// Moves the dragged layer, applying the clamped geometry to the
    /// project. None when no gesture is active.
    pub fn update_drag(&mut self, pointer: Point, container: Size) -> Option<LayerRect> {
        let (id, rect) = self.drag.update(pointer, container)?;
        self.project.set_layer_rect(id, rect).ok()?;
        Some(rect)
    }

    pub fn end_drag(&mut self) -> Option<LayerId> {
        self.drag.end()
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    /// Overlay state at the clock's current position.
    pub fn sample(&self) -> FrameSample {
        sample_frame(&self.project, self.clock.now())
    }

    pub fn sample_at(&self, t: f64) -> FrameSample {
        sample_frame(&self.project, t)
    }

    pub fn save(&mut self) -> EditResult<BackendRequest> {
        self.jobs.save(&self.project)
    }

    pub fn render(&mut self) -> EditResult<BackendRequest> {
        let request = self.jobs.render(&self.project)?;
        if matches!(request, BackendRequest::Render { .. }) {
            self.progress = Some(CosmeticProgress::new(self.clock.now()));
        }
        Ok(request)
    }

    pub fn request_delete(&mut self) -> EditResult<()> {
        self.jobs.request_delete()
    }

    pub fn cancel_delete(&mut self) {
        self.jobs.cancel_delete();
    }

    pub fn confirm_delete(&mut self) -> EditResult<BackendRequest> {
        self.jobs.confirm_delete()
    }

    /// Feeds a completion into the job controller and keeps the session
    /// state (cosmetic progress, cleared layers after a delete) in step.
    pub fn complete(
        &mut self,
        token: RequestToken,
        completion: Completion,
    ) -> OvercutResult<Option<BackendRequest>> {
        let had_job = self.jobs.job_id().is_some();
        let was_delete = matches!(completion, Completion::Delete(Ok(())));

        let follow = self.jobs.complete(token, completion)?;

        if was_delete && had_job && self.jobs.job_id().is_none() {
            self.project.layers.clear();
            self.project.selected = None;
            self.drag.cancel();
        }
        if let Some(BackendRequest::Render { .. }) = &follow {
            self.progress = Some(CosmeticProgress::new(self.clock.now()));
        }
        if self.jobs.status() != JobStatus::Rendering {
            self.progress = None;
        }
        Ok(follow)
    }

    /// Elapsed-time progress while rendering. Cosmetic, not encoder state.
    pub fn render_progress(&self) -> Option<f64> {
        if self.jobs.status() != JobStatus::Rendering {
            return None;
        }
        self.progress.map(|p| p.percent(self.clock.now()))
    }

    /// Executes a request (and whatever it chains into) against a backend,
    /// synchronously. Hosts with their own transport drive
    /// [`OverlaySession::complete`] directly instead.
    pub fn run(
        &mut self,
        request: BackendRequest,
        backend: &mut dyn OverlayBackend,
    ) -> OvercutResult<()> {
        let mut next = Some(request);
        while let Some(request) = next.take() {
            let (token, completion) = match request {
                BackendRequest::Save { token, payload } => {
                    (token, Completion::Save(backend.save(&payload)))
                }
                BackendRequest::Render { token, job_id } => {
                    (token, Completion::Render(backend.render(&job_id)))
                }
                BackendRequest::Delete { token, job_id } => {
                    (token, Completion::Delete(backend.delete(&job_id)))
                }
            };
            next = self.complete(token, completion)?;
        }
        Ok(())
    }
}
