use crate::{
    backend::RequestToken,
    payload::{PreviewQuery, PreviewSummary},
    timeline::Timeline,
};

#[derive(Clone, Copy, Debug)]
pub struct PreviewOpts {
    /// Quiet period after the last edit before a recompute is issued.
    pub quiesce_secs: f64,
}

impl Default for PreviewOpts {
    fn default() -> Self {
        Self { quiesce_secs: 0.6 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreviewRequest {
    pub token: RequestToken,
    pub query: PreviewQuery,
}

/// Debounces timeline edits into advisory summary recomputes.
///
/// Every mutation calls [`PreviewSummarizer::mark_dirty`]; once edits stop
/// for the quiesce window, [`PreviewSummarizer::poll`] yields one tokened
/// request. Only the answer to the newest issued token is applied, so
/// summaries can never regress during a burst of edits. Never touches the
/// timeline itself.
#[derive(Clone, Debug, Default)]
pub struct PreviewSummarizer {
    opts: PreviewOpts,
    dirty_at: Option<f64>,
    next_token: u64,
    issued: Option<RequestToken>,
    latest: Option<PreviewSummary>,
}

impl PreviewSummarizer {
    pub fn new(opts: PreviewOpts) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    pub fn latest(&self) -> Option<&PreviewSummary> {
        self.latest.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_at.is_some()
    }

    /// Records an edit at `now`. Edits inside the quiesce window restart it.
    pub fn mark_dirty(&mut self, now: f64) {
        self.dirty_at = Some(now);
    }

    /// Issues a recompute request once the timeline has been quiet long
    /// enough, at most once per dirty period.
    pub fn poll(&mut self, now: f64, timeline: &Timeline) -> Option<PreviewRequest> {
        let dirty_at = self.dirty_at?;
        if now - dirty_at < self.opts.quiesce_secs {
            return None;
        }
        self.dirty_at = None;
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.issued = Some(token);
        Some(PreviewRequest {
            token,
            query: PreviewQuery::from_timeline(timeline),
        })
    }

    /// Applies a summary if it answers the newest issued request. Stale
    /// answers are dropped and false is returned.
    pub fn apply(&mut self, token: RequestToken, summary: PreviewSummary) -> bool {
        if self.issued != Some(token) {
            return false;
        }
        self.latest = Some(summary);
        true
    }
}
