use crate::{
    error::{EditRejection, EditResult, OvercutError, OvercutResult},
    transitions::{DEFAULT_TRANSITION_SECS, Transition, TransitionKind, duration_in_range},
};

/// Shortest trim window a clip may keep, in seconds.
pub const MIN_CLIP_SECS: f64 = 0.1;

// Float slack so a window of exactly the minimum passes.
const TRIM_EPS: f64 = 1e-9;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ClipId(pub u64);

/// Backend-provided description of a source video.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetMeta {
    pub id: String,
    pub duration: f64, // seconds
    pub width: u32,
    pub height: u32,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// A trim window over one source asset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub asset: AssetMeta,
    pub trim_start: f64, // seconds into the source
    pub trim_end: f64,   // seconds into the source, exclusive end of the window
}

impl Clip {
    pub fn duration(&self) -> f64 {
        self.trim_end - self.trim_start
    }
}

/// Target resolution of the assembled video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputFormat {
    pub width: u32,
    pub height: u32,
}

impl OutputFormat {
    pub const fn vertical() -> Self {
        Self {
            width: 1080,
            height: 1920,
        }
    }

    pub const fn square() -> Self {
        Self {
            width: 1080,
            height: 1080,
        }
    }

    pub const fn landscape() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }

    pub fn parse(s: &str) -> OvercutResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertical" | "story" | "9:16" => Ok(Self::vertical()),
            "square" | "1:1" => Ok(Self::square()),
            "landscape" | "16:9" => Ok(Self::landscape()),
            other => Err(OvercutError::validation(format!(
                "unknown output format '{other}'"
            ))),
        }
    }

    pub fn validate(&self) -> OvercutResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(OvercutError::validation(
                "output width/height must be > 0",
            ));
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::vertical()
    }
}

/// Ordered clips plus the seam edges between them.
///
/// The structural invariant `seams.len() == clips.len() - 1` (0 when empty)
/// is maintained by every operation here and checked by [`Timeline::validate`]
/// on loaded data.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    pub clips: Vec<Clip>,
    pub seams: Vec<Transition>,
    pub format: OutputFormat,
}

impl Timeline {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            clips: Vec::new(),
            seams: Vec::new(),
            format,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn clip(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    pub fn seam(&self, index: usize) -> Option<&Transition> {
        self.seams.get(index)
    }

    pub fn index_of(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    fn alloc_clip_id(&self) -> ClipId {
        ClipId(self.clips.iter().map(|c| c.id.0).max().map_or(0, |m| m + 1))
    }

    /// Appends a clip spanning the full source. The seam to the previous
    /// clip starts as a cut.
    pub fn add_clip(&mut self, asset: AssetMeta) -> ClipId {
        let id = self.alloc_clip_id();
        let clip = Clip {
            id,
            trim_start: 0.0,
            trim_end: asset.duration,
            asset,
        };
        if !self.clips.is_empty() {
            self.seams.push(Transition::cut());
        }
        self.clips.push(clip);
        id
    }

    /// Removes the clip and the seam it shared with its left neighbor
    /// (the right neighbor's seam for the first clip).
    pub fn remove_clip(&mut self, index: usize) -> EditResult<()> {
        if index >= self.clips.len() {
            return Err(EditRejection::IndexOutOfBounds);
        }
        self.clips.remove(index);
        if !self.seams.is_empty() {
            let seam = index.saturating_sub(1);
            self.seams.remove(seam);
        }
        Ok(())
    }

    /// Inserts an identical copy (fresh id) right after the original, with a
    /// cut seam between the two.
    pub fn duplicate_clip(&mut self, index: usize) -> EditResult<ClipId> {
        if index >= self.clips.len() {
            return Err(EditRejection::IndexOutOfBounds);
        }
        let mut copy = self.clips[index].clone();
        copy.id = self.alloc_clip_id();
        let id = copy.id;
        self.clips.insert(index + 1, copy);
        self.seams.insert(index, Transition::cut());
        Ok(id)
    }

    /// Moves a clip to a new position. Seams are positional and stay put.
    pub fn reorder_clip(&mut self, from: usize, to: usize) -> EditResult<()> {
        if from >= self.clips.len() || to >= self.clips.len() {
            return Err(EditRejection::IndexOutOfBounds);
        }
        if from == to {
            return Ok(());
        }
        let clip = self.clips.remove(from);
        self.clips.insert(to, clip);
        Ok(())
    }

    /// Splits the clip `at` seconds into its trim window. Both halves must
    /// keep the minimum length; a cut seam separates them.
    pub fn split_clip(&mut self, index: usize, at: f64) -> EditResult<ClipId> {
        let clip = self
            .clips
            .get(index)
            .ok_or(EditRejection::IndexOutOfBounds)?;
        if !at.is_finite() || at <= 0.0 || at >= clip.duration() {
            return Err(EditRejection::TrimOutOfBounds);
        }
        if at < MIN_CLIP_SECS - TRIM_EPS || clip.duration() - at < MIN_CLIP_SECS - TRIM_EPS {
            return Err(EditRejection::ClipTooShort);
        }

        let split = clip.trim_start + at;
        let mut right = clip.clone();
        right.id = self.alloc_clip_id();
        right.trim_start = split;
        let id = right.id;

        self.clips[index].trim_end = split;
        self.clips.insert(index + 1, right);
        self.seams.insert(index, Transition::cut());
        Ok(id)
    }

    /// Accepted only inside the source and while the window keeps
    /// [`MIN_CLIP_SECS`]. A rejected value leaves the clip untouched.
    pub fn update_trim_start(&mut self, index: usize, value: f64) -> EditResult<()> {
        let clip = self
            .clips
            .get(index)
            .ok_or(EditRejection::IndexOutOfBounds)?;
        if !value.is_finite() || value < 0.0 || value > clip.asset.duration {
            return Err(EditRejection::TrimOutOfBounds);
        }
        if clip.trim_end - value < MIN_CLIP_SECS - TRIM_EPS {
            return Err(EditRejection::ClipTooShort);
        }
        self.clips[index].trim_start = value;
        Ok(())
    }

    pub fn update_trim_end(&mut self, index: usize, value: f64) -> EditResult<()> {
        let clip = self
            .clips
            .get(index)
            .ok_or(EditRejection::IndexOutOfBounds)?;
        if !value.is_finite() || value < 0.0 || value > clip.asset.duration {
            return Err(EditRejection::TrimOutOfBounds);
        }
        if value - clip.trim_start < MIN_CLIP_SECS - TRIM_EPS {
            return Err(EditRejection::ClipTooShort);
        }
        self.clips[index].trim_end = value;
        Ok(())
    }

    /// Changes the kind at a seam. Switching away from a cut installs the
    /// default duration when the stored one is unusable.
    pub fn set_transition(&mut self, seam: usize, kind: TransitionKind) -> EditResult<()> {
        let tr = self
            .seams
            .get_mut(seam)
            .ok_or(EditRejection::IndexOutOfBounds)?;
        tr.kind = kind;
        if !kind.is_cut() && !duration_in_range(tr.duration) {
            tr.duration = DEFAULT_TRANSITION_SECS;
        }
        Ok(())
    }

    pub fn set_transition_duration(&mut self, seam: usize, secs: f64) -> EditResult<()> {
        let tr = self
            .seams
            .get_mut(seam)
            .ok_or(EditRejection::IndexOutOfBounds)?;
        if !duration_in_range(secs) {
            return Err(EditRejection::TransitionDurationOutOfRange);
        }
        tr.duration = secs;
        Ok(())
    }

    /// Program length in seconds: the sum of trim windows minus the overlap
    /// consumed by non-cut seams, floored at zero.
    pub fn effective_duration(&self) -> f64 {
        let content: f64 = self.clips.iter().map(Clip::duration).sum();
        let overlap: f64 = self.seams.iter().map(Transition::overlap_secs).sum();
        (content - overlap).max(0.0)
    }

    pub fn validate(&self) -> OvercutResult<()> {
        self.format.validate()?;

        if self.seams.len() != self.clips.len().saturating_sub(1) {
            return Err(OvercutError::validation(format!(
                "{} clips require {} seams, found {}",
                self.clips.len(),
                self.clips.len().saturating_sub(1),
                self.seams.len()
            )));
        }

        for (i, clip) in self.clips.iter().enumerate() {
            if self.clips.iter().filter(|c| c.id == clip.id).count() > 1 {
                return Err(OvercutError::validation(format!(
                    "duplicate clip id {:?}",
                    clip.id
                )));
            }
            if !(clip.asset.duration.is_finite() && clip.asset.duration > 0.0) {
                return Err(OvercutError::validation(format!(
                    "clip {i} has a source with non-positive duration"
                )));
            }
            if !clip.trim_start.is_finite() || !clip.trim_end.is_finite() {
                return Err(OvercutError::validation(format!(
                    "clip {i} has a non-finite trim"
                )));
            }
            if clip.trim_start < 0.0 || clip.trim_end > clip.asset.duration {
                return Err(OvercutError::validation(format!(
                    "clip {i} trim window leaves the source"
                )));
            }
            if clip.duration() < MIN_CLIP_SECS - TRIM_EPS {
                return Err(OvercutError::validation(format!(
                    "clip {i} is shorter than {MIN_CLIP_SECS}s"
                )));
            }
        }

        for tr in &self.seams {
            tr.validate()?;
        }

        Ok(())
    }
}
