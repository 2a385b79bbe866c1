use crate::{
    backend::{BackendError, RequestToken},
    error::{EditRejection, EditResult, OvercutError, OvercutResult},
    overlay::OverlayProject,
    payload::{OverlaySavePayload, RenderAck, SaveAck},
};

/// Lifecycle of the overlay render job, serialized exactly as the backend
/// stores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Rendering,
    Done,
    Error,
}

/// A backend round-trip the host must perform on the controller's behalf.
/// The answer comes back through [`RenderJobController::complete`] with the
/// same token.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendRequest {
    Save {
        token: RequestToken,
        payload: OverlaySavePayload,
    },
    Render {
        token: RequestToken,
        job_id: String,
    },
    Delete {
        token: RequestToken,
        job_id: String,
    },
}

impl BackendRequest {
    pub fn token(&self) -> RequestToken {
        match self {
            Self::Save { token, .. } | Self::Render { token, .. } | Self::Delete { token, .. } => {
                *token
            }
        }
    }
}

/// Outcome of one performed [`BackendRequest`], same order of variants.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    Save(Result<SaveAck, BackendError>),
    Render(Result<RenderAck, BackendError>),
    Delete(Result<(), BackendError>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InflightKind {
    Save,
    Render,
    Delete,
}

/// Drives pending → rendering → done/error without doing any IO itself.
///
/// Intents (`save`, `render`, `confirm_delete`) hand back a
/// [`BackendRequest`]; at most one may be outstanding, further intents are
/// rejected as [`EditRejection::Busy`] until the completion lands. Stale
/// completions (any token but the outstanding one) are dropped, which keeps
/// a superseded request from overwriting a later result.
#[derive(Clone, Debug)]
pub struct RenderJobController {
    status: JobStatus,
    job_id: Option<String>,
    output: Option<String>,
    error: Option<String>,
    next_token: u64,
    inflight: Option<(RequestToken, InflightKind)>,
    render_after_save: bool,
    delete_armed: bool,
}

impl Default for RenderJobController {
    fn default() -> Self {
        Self {
            status: JobStatus::Pending,
            job_id: None,
            output: None,
            error: None,
            next_token: 0,
            inflight: None,
            render_after_save: false,
            delete_armed: false,
        }
    }
}

impl RenderJobController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Rendered file, only while the job is done.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.inflight.is_some()
    }

    pub fn is_delete_armed(&self) -> bool {
        self.delete_armed
    }

    fn issue(&mut self, kind: InflightKind) -> RequestToken {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.inflight = Some((token, kind));
        token
    }

    /// Persists the project: create on first save, update-in-place after.
    pub fn save(&mut self, project: &OverlayProject) -> EditResult<BackendRequest> {
        if self.is_busy() {
            return Err(EditRejection::Busy);
        }
        let token = self.issue(InflightKind::Save);
        Ok(BackendRequest::Save {
            token,
            payload: OverlaySavePayload::from_project(project, self.job_id.clone()),
        })
    }

    /// Starts the encode. An unsaved project is saved first; the render
    /// request follows from that save's completion, so the job id is always
    /// known by the time the encode is requested.
    #[tracing::instrument(skip(self, project))]
    pub fn render(&mut self, project: &OverlayProject) -> EditResult<BackendRequest> {
        if self.is_busy() {
            return Err(EditRejection::Busy);
        }
        match self.job_id.clone() {
            Some(job_id) => {
                let token = self.issue(InflightKind::Render);
                self.status = JobStatus::Rendering;
                self.error = None;
                Ok(BackendRequest::Render { token, job_id })
            }
            None => {
                self.render_after_save = true;
                let token = self.issue(InflightKind::Save);
                Ok(BackendRequest::Save {
                    token,
                    payload: OverlaySavePayload::from_project(project, None),
                })
            }
        }
    }

    /// First step of the two-step delete. The request is only emitted by
    /// [`RenderJobController::confirm_delete`].
    pub fn request_delete(&mut self) -> EditResult<()> {
        if self.job_id.is_none() {
            return Err(EditRejection::NotSaved);
        }
        self.delete_armed = true;
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.delete_armed = false;
    }

    pub fn confirm_delete(&mut self) -> EditResult<BackendRequest> {
        if !self.delete_armed {
            return Err(EditRejection::ConfirmationRequired);
        }
        if self.is_busy() {
            return Err(EditRejection::Busy);
        }
        let job_id = self.job_id.clone().ok_or(EditRejection::NotSaved)?;
        let token = self.issue(InflightKind::Delete);
        Ok(BackendRequest::Delete { token, job_id })
    }

    /// Feeds a completion back. Returns the follow-up request when a save
    /// was chaining into a render. Stale tokens are ignored; a completion
    /// of the wrong kind for the outstanding request is a host bug.
    #[tracing::instrument(skip(self, completion))]
    pub fn complete(
        &mut self,
        token: RequestToken,
        completion: Completion,
    ) -> OvercutResult<Option<BackendRequest>> {
        let Some((expected, kind)) = self.inflight else {
            return Ok(None);
        };
        if token != expected {
            return Ok(None);
        }
        self.inflight = None;

        match (kind, completion) {
            (InflightKind::Save, Completion::Save(Ok(ack))) => {
                self.job_id = Some(ack.id.clone());
                if self.render_after_save {
                    self.render_after_save = false;
                    let token = self.issue(InflightKind::Render);
                    self.status = JobStatus::Rendering;
                    self.error = None;
                    Ok(Some(BackendRequest::Render {
                        token,
                        job_id: ack.id,
                    }))
                } else {
                    self.status = ack.render_status;
                    Ok(None)
                }
            }
            (InflightKind::Save, Completion::Save(Err(e))) => {
                self.render_after_save = false;
                self.error = Some(e.message);
                Ok(None)
            }
            (InflightKind::Render, Completion::Render(Ok(ack))) => {
                self.status = ack.render_status;
                match ack.render_status {
                    JobStatus::Done => {
                        self.output = ack.output_path;
                        self.error = None;
                    }
                    JobStatus::Error => {
                        self.error = ack.error.or_else(|| Some("render failed".to_string()));
                        self.output = None;
                    }
                    JobStatus::Pending | JobStatus::Rendering => {}
                }
                Ok(None)
            }
            (InflightKind::Render, Completion::Render(Err(e))) => {
                self.status = JobStatus::Error;
                self.error = Some(e.message);
                self.output = None;
                Ok(None)
            }
            (InflightKind::Delete, Completion::Delete(Ok(()))) => {
                self.job_id = None;
                self.status = JobStatus::Pending;
                self.output = None;
                self.error = None;
                self.delete_armed = false;
                Ok(None)
            }
            (InflightKind::Delete, Completion::Delete(Err(e))) => {
                self.error = Some(e.message);
                self.delete_armed = false;
                Ok(None)
            }
            (_, _) => Err(OvercutError::job(
                "completion does not match the outstanding request",
            )),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ProgressOpts {
    /// Seconds to reach roughly two thirds of the bar.
    pub ramp_secs: f64,
}

impl Default for ProgressOpts {
    fn default() -> Self {
        Self { ramp_secs: 6.0 }
    }
}

/// Elapsed-time progress shown while a render is outstanding.
///
/// Cosmetic: it carries no information about the encoder's real progress
/// and approaches (never reaches) 100%.
#[derive(Clone, Copy, Debug)]
pub struct CosmeticProgress {
    started: f64,
    opts: ProgressOpts,
}

impl CosmeticProgress {
    pub fn new(started: f64) -> Self {
        Self {
            started,
            opts: ProgressOpts::default(),
        }
    }

    pub fn with_opts(started: f64, opts: ProgressOpts) -> Self {
        Self { started, opts }
    }

    pub fn percent(&self, now: f64) -> f64 {
        let elapsed = (now - self.started).max(0.0);
        let pct = 100.0 * (1.0 - (-elapsed / self.opts.ramp_secs).exp());
        pct.min(99.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{overlay::OverlayProject, timeline::AssetMeta};

    fn project() -> OverlayProject {
        OverlayProject::new(
            "Kickoff",
            AssetMeta {
                id: "v1".to_string(),
                duration: 30.0,
                width: 1080,
                height: 1920,
                path: "/media/v1.mp4".to_string(),
                thumbnail: None,
            },
        )
    }

    fn save_ok(id: &str) -> Completion {
        Completion::Save(Ok(SaveAck {
            id: id.to_string(),
            render_status: JobStatus::Pending,
        }))
    }

    fn render_done(path: &str) -> Completion {
        Completion::Render(Ok(RenderAck {
            render_status: JobStatus::Done,
            output_path: Some(path.to_string()),
            error: None,
        }))
    }

    #[test]
    fn render_on_unsaved_project_saves_first() {
        let mut jobs = RenderJobController::new();
        let p = project();

        let req = jobs.render(&p).unwrap();
        let BackendRequest::Save { token, payload } = req else {
            panic!("unsaved render must start with a save");
        };
        assert_eq!(payload.id, None);
        assert_eq!(jobs.status(), JobStatus::Pending);

        let follow = jobs.complete(token, save_ok("ov-1")).unwrap();
        let Some(BackendRequest::Render { token, job_id }) = follow else {
            panic!("save completion must chain into the render");
        };
        assert_eq!(job_id, "ov-1");
        assert_eq!(jobs.job_id(), Some("ov-1"));
        assert_eq!(jobs.status(), JobStatus::Rendering);

        let follow = jobs
            .complete(token, render_done("/renders/ov-1.mp4"))
            .unwrap();
        assert!(follow.is_none());
        assert_eq!(jobs.status(), JobStatus::Done);
        assert_eq!(jobs.output(), Some("/renders/ov-1.mp4"));
    }

    #[test]
    fn saved_project_renders_directly() {
        let mut jobs = RenderJobController::new();
        let p = project();

        let token = jobs.save(&p).unwrap().token();
        jobs.complete(token, save_ok("ov-2")).unwrap();
        assert_eq!(jobs.status(), JobStatus::Pending);

        let req = jobs.render(&p).unwrap();
        assert!(matches!(req, BackendRequest::Render { ref job_id, .. } if job_id == "ov-2"));
    }

    #[test]
    fn second_intent_is_rejected_while_in_flight() {
        let mut jobs = RenderJobController::new();
        let p = project();

        let _req = jobs.save(&p).unwrap();
        assert_eq!(jobs.save(&p), Err(EditRejection::Busy));
        assert_eq!(jobs.render(&p), Err(EditRejection::Busy));
    }

    #[test]
    fn stale_completions_are_dropped() {
        let mut jobs = RenderJobController::new();
        let p = project();

        let token = jobs.save(&p).unwrap().token();
        let stale = RequestToken(token.0 + 100);
        assert!(jobs.complete(stale, save_ok("bogus")).unwrap().is_none());
        assert_eq!(jobs.job_id(), None);
        assert!(jobs.is_busy(), "the real request is still outstanding");

        jobs.complete(token, save_ok("ov-3")).unwrap();
        assert_eq!(jobs.job_id(), Some("ov-3"));

        // Nothing outstanding: a late duplicate is ignored too.
        assert!(jobs.complete(token, save_ok("late")).unwrap().is_none());
        assert_eq!(jobs.job_id(), Some("ov-3"));
    }

    #[test]
    fn mismatched_completion_kind_is_a_protocol_error() {
        let mut jobs = RenderJobController::new();
        let p = project();
        let token = jobs.save(&p).unwrap().token();
        assert!(jobs.complete(token, Completion::Delete(Ok(()))).is_err());
    }

    #[test]
    fn render_failure_is_recorded_and_retryable() {
        let mut jobs = RenderJobController::new();
        let p = project();

        let token = jobs.save(&p).unwrap().token();
        jobs.complete(token, save_ok("ov-4")).unwrap();

        let token = jobs.render(&p).unwrap().token();
        jobs.complete(
            token,
            Completion::Render(Err(BackendError::new("encoder crashed"))),
        )
        .unwrap();
        assert_eq!(jobs.status(), JobStatus::Error);
        assert_eq!(jobs.error_message(), Some("encoder crashed"));
        assert_eq!(jobs.output(), None);

        let token = jobs.render(&p).unwrap().token();
        assert_eq!(jobs.error_message(), None, "retry clears the error");
        jobs.complete(token, render_done("/renders/ov-4.mp4")).unwrap();
        assert_eq!(jobs.status(), JobStatus::Done);
        assert_eq!(jobs.output(), Some("/renders/ov-4.mp4"));
    }

    #[test]
    fn delete_requires_explicit_confirmation() {
        let mut jobs = RenderJobController::new();
        let p = project();

        assert_eq!(jobs.request_delete(), Err(EditRejection::NotSaved));
        assert_eq!(
            jobs.confirm_delete(),
            Err(EditRejection::ConfirmationRequired)
        );

        let token = jobs.save(&p).unwrap().token();
        jobs.complete(token, save_ok("ov-5")).unwrap();
        let token = jobs.render(&p).unwrap().token();
        jobs.complete(token, render_done("/renders/ov-5.mp4")).unwrap();

        jobs.request_delete().unwrap();
        let req = jobs.confirm_delete().unwrap();
        let BackendRequest::Delete { token, job_id } = req else {
            panic!("confirmation must emit the delete");
        };
        assert_eq!(job_id, "ov-5");

        jobs.complete(token, Completion::Delete(Ok(()))).unwrap();
        assert_eq!(jobs.job_id(), None);
        assert_eq!(jobs.status(), JobStatus::Pending);
        assert_eq!(jobs.output(), None);
        assert!(!jobs.is_delete_armed());
    }

    #[test]
    fn failed_save_keeps_the_project_unsaved() {
        let mut jobs = RenderJobController::new();
        let p = project();

        let token = jobs.render(&p).unwrap().token();
        let follow = jobs
            .complete(token, Completion::Save(Err(BackendError::new("503"))))
            .unwrap();
        assert!(follow.is_none(), "a failed save must not chain a render");
        assert_eq!(jobs.job_id(), None);
        assert_eq!(jobs.status(), JobStatus::Pending);
        assert_eq!(jobs.error_message(), Some("503"));
        assert!(!jobs.is_busy());
    }

    #[test]
    fn cosmetic_progress_rises_and_stays_under_full() {
        let progress = CosmeticProgress::new(100.0);
        assert_eq!(progress.percent(100.0), 0.0);
        let early = progress.percent(101.0);
        let late = progress.percent(120.0);
        assert!(early > 0.0 && early < late);
        assert!(late < 100.0);
        assert!(progress.percent(100_000.0) <= 99.0);
        assert_eq!(progress.percent(99.0), 0.0, "clock skew reads as zero");
    }

    #[test]
    fn progress_ramp_is_configurable() {
        let brisk = CosmeticProgress::with_opts(0.0, ProgressOpts { ramp_secs: 1.0 });
        let lazy = CosmeticProgress::new(0.0);
        assert!(brisk.percent(2.0) > lazy.percent(2.0));
        assert!(brisk.percent(100.0) <= 99.0);
    }
}
