use crate::{
    job::JobStatus,
    payload::{
        ComposeAck, ComposeRequest, OverlaySavePayload, PreviewQuery, PreviewSummary, RenderAck,
        SaveAck,
    },
};

/// Failure reported by the backend, carrying the server-provided message.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Monotonic identity of one backend round-trip. Completions carry the
/// token they answer; anything but the newest outstanding token is stale
/// and gets dropped, so a superseded request can never overwrite a later
/// result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestToken(pub u64);

/// Compose-side collaborator: preview summaries and final assembly.
/// Encoding itself is opaque; the engine only ships declarative payloads.
pub trait ComposeBackend {
    fn preview_summary(&mut self, query: &PreviewQuery) -> BackendResult<PreviewSummary>;
    fn compose(&mut self, request: &ComposeRequest) -> BackendResult<ComposeAck>;
}

/// Overlay-side collaborator: document persistence and the encode job.
pub trait OverlayBackend {
    fn save(&mut self, payload: &OverlaySavePayload) -> BackendResult<SaveAck>;
    fn render(&mut self, job_id: &str) -> BackendResult<RenderAck>;
    fn delete(&mut self, job_id: &str) -> BackendResult<()>;
}

/// Compose backend that answers from the payload alone. Summaries are
/// computed the same way the server computes them.
#[derive(Debug, Default)]
pub struct InMemoryComposeBackend {
    pub previews_served: u32,
    pub composed: Vec<ComposeRequest>,
    pub fail_next: Option<String>,
}

impl InMemoryComposeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_failure(&mut self) -> BackendResult<()> {
        match self.fail_next.take() {
            Some(message) => Err(BackendError { message }),
            None => Ok(()),
        }
    }
}

impl ComposeBackend for InMemoryComposeBackend {
    fn preview_summary(&mut self, query: &PreviewQuery) -> BackendResult<PreviewSummary> {
        self.take_failure()?;
        self.previews_served += 1;

        let content: f64 = query.clips.iter().map(|c| c.trim_end - c.trim_start).sum();
        let overlap: f64 = query
            .clips
            .iter()
            .skip(1)
            .filter(|c| !c.transition_type.is_cut())
            .map(|c| c.transition_duration)
            .sum();
        Ok(PreviewSummary {
            clip_count: query.clips.len() as u32,
            effective_duration: (content - overlap).max(0.0),
            output_width: query.output.width,
            output_height: query.output.height,
        })
    }

    fn compose(&mut self, request: &ComposeRequest) -> BackendResult<ComposeAck> {
        self.take_failure()?;
        self.composed.push(request.clone());
        Ok(ComposeAck {
            asset_id: format!("asset-{}", self.composed.len()),
            output_path: Some(format!("/renders/compose-{}.mp4", self.composed.len())),
        })
    }
}

/// Overlay backend over a map of saved documents. Failure injection covers
/// the error paths a real server produces.
#[derive(Debug, Default)]
pub struct InMemoryOverlayBackend {
    pub saved: Vec<OverlaySavePayload>,
    pub deleted: Vec<String>,
    pub fail_save: Option<String>,
    pub fail_render: Option<String>,
    pub fail_delete: Option<String>,
    next_id: u32,
}

impl InMemoryOverlayBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_saved(&self) -> Option<&OverlaySavePayload> {
        self.saved.last()
    }
}

impl OverlayBackend for InMemoryOverlayBackend {
    fn save(&mut self, payload: &OverlaySavePayload) -> BackendResult<SaveAck> {
        if let Some(message) = self.fail_save.take() {
            return Err(BackendError { message });
        }
        let id = match &payload.id {
            Some(id) => id.clone(),
            None => {
                self.next_id += 1;
                format!("ov-{}", self.next_id)
            }
        };
        self.saved.push(OverlaySavePayload {
            id: Some(id.clone()),
            ..payload.clone()
        });
        Ok(SaveAck {
            id,
            render_status: JobStatus::Pending,
        })
    }

    fn render(&mut self, job_id: &str) -> BackendResult<RenderAck> {
        if let Some(message) = self.fail_render.take() {
            return Err(BackendError { message });
        }
        Ok(RenderAck {
            render_status: JobStatus::Done,
            output_path: Some(format!("/renders/{job_id}.mp4")),
            error: None,
        })
    }

    fn delete(&mut self, job_id: &str) -> BackendResult<()> {
        if let Some(message) = self.fail_delete.take() {
            return Err(BackendError { message });
        }
        self.deleted.push(job_id.to_string());
        Ok(())
    }
}
