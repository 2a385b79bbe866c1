use crate::error::{OvercutError, OvercutResult};

pub const MIN_TRANSITION_SECS: f64 = 0.1;
pub const MAX_TRANSITION_SECS: f64 = 3.0;

/// Duration a transition gets when switching to a non-cut kind without a
/// usable previous value.
pub const DEFAULT_TRANSITION_SECS: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Cut,
    Fade,
    CrossDissolve,
}

impl TransitionKind {
    pub fn is_cut(self) -> bool {
        matches!(self, Self::Cut)
    }

    pub fn parse(s: &str) -> OvercutResult<Self> {
        let kind = s.trim().to_ascii_lowercase();
        match kind.as_str() {
            "cut" | "none" => Ok(Self::Cut),
            "fade" | "fade_to_black" => Ok(Self::Fade),
            "crossdissolve" | "cross_dissolve" | "dissolve" => Ok(Self::CrossDissolve),
            _ => Err(OvercutError::validation(format!(
                "unknown transition kind '{kind}'"
            ))),
        }
    }
}

pub fn duration_in_range(secs: f64) -> bool {
    secs.is_finite() && (MIN_TRANSITION_SECS..=MAX_TRANSITION_SECS).contains(&secs)
}

/// One seam edge between an ordered pair of clips.
///
/// A timeline with `n` clips carries exactly `n - 1` of these; seam `j` sits
/// between clips `j` and `j + 1`. Reordering clips moves clips only, the
/// transition at a seam keeps playing at that seam.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transition {
    pub kind: TransitionKind,
    pub duration: f64, // seconds; 0 and ignored for cuts
}

impl Transition {
    pub fn cut() -> Self {
        Self {
            kind: TransitionKind::Cut,
            duration: 0.0,
        }
    }

    pub fn new(kind: TransitionKind, duration: f64) -> OvercutResult<Self> {
        let tr = Self { kind, duration };
        tr.validate()?;
        Ok(tr)
    }

    /// Seconds this seam overlaps its neighbors. Cuts consume no time.
    pub fn overlap_secs(&self) -> f64 {
        if self.kind.is_cut() {
            0.0
        } else {
            self.duration
        }
    }

    pub fn validate(&self) -> OvercutResult<()> {
        if self.kind.is_cut() {
            return Ok(());
        }
        if !duration_in_range(self.duration) {
            return Err(OvercutError::validation(format!(
                "transition duration {}s is outside {MIN_TRANSITION_SECS}..={MAX_TRANSITION_SECS}",
                self.duration
            )));
        }
        Ok(())
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::cut()
    }
}
