use crate::{
    anim::Animation,
    error::{EditRejection, EditResult, OvercutError, OvercutResult},
    timeline::AssetMeta,
};

/// Smallest layer edge, in percent of the frame.
pub const MIN_LAYER_SIZE_PCT: f64 = 1.0;

/// Vertical nudge applied to a duplicated layer so the copy is visible.
const DUPLICATE_OFFSET_PCT: f64 = 5.0;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub u64);

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Layer geometry in percent of the video frame, any provenance.
///
/// [`LayerRect::clamped`] is the single normalization rule: sizes land in
/// `[MIN_LAYER_SIZE_PCT, 100]`, positions in `[0, 100 - size]`, everything
/// rounded to one decimal. After it, `x + width <= 100` and
/// `y + height <= 100` hold.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayerRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        let sanitize = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };

        let width = round1(sanitize(self.width, 100.0).clamp(MIN_LAYER_SIZE_PCT, 100.0));
        let height = round1(sanitize(self.height, 100.0).clamp(MIN_LAYER_SIZE_PCT, 100.0));
        let x = round1(sanitize(self.x, 0.0).clamp(0.0, 100.0 - width));
        let y = round1(sanitize(self.y, 0.0).clamp(0.0, 100.0 - height));
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn in_frame(&self) -> bool {
        // Slack for sums of 0.1-rounded floats.
        const FRAME_EPS: f64 = 1e-9;
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= 100.0 + FRAME_EPS
            && self.y + self.height <= 100.0 + FRAME_EPS
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Text,
    Logo,
    Subtitle,
    Hashtag,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One timed, styled overlay box.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub kind: LayerKind,
    pub text: String,
    #[serde(flatten)]
    pub rect: LayerRect,
    pub font_size: f64, // percent of frame height
    pub color: String,  // hex, e.g. "#ffffff"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    pub opacity: f64, // 0..1
    #[serde(rename = "start_time")]
    pub start: f64, // seconds
    #[serde(rename = "end_time", with = "end_time_sentinel")]
    pub end: Option<f64>, // None = until the end of the video
    pub animation: Animation,
    pub bold: bool,
    pub italic: bool,
    pub text_align: TextAlign,
    pub font_family: String,
}

/// On the wire "until the end of the video" is the `-1` sentinel.
mod end_time_sentinel {
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(v.unwrap_or(-1.0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let raw = f64::deserialize(d)?;
        Ok(if raw < 0.0 { None } else { Some(raw) })
    }
}

impl Layer {
    /// Preset-initialized layer for one of the four overlay tools.
    pub fn preset(kind: LayerKind, id: LayerId) -> Self {
        let base = Self {
            id,
            kind,
            text: String::new(),
            rect: LayerRect::new(10.0, 40.0, 80.0, 12.0),
            font_size: 6.0,
            color: "#ffffff".to_string(),
            bg_color: None,
            opacity: 1.0,
            start: 0.0,
            end: None,
            animation: Animation::FadeIn,
            bold: false,
            italic: false,
            text_align: TextAlign::Center,
            font_family: "Inter".to_string(),
        };
        match kind {
            LayerKind::Text => Self {
                text: "Your text".to_string(),
                bold: true,
                ..base
            },
            LayerKind::Logo => Self {
                text: "Your brand".to_string(),
                rect: LayerRect::new(74.0, 4.0, 22.0, 8.0),
                font_size: 3.5,
                bg_color: Some("#00000080".to_string()),
                opacity: 0.9,
                animation: Animation::None,
                ..base
            },
            LayerKind::Subtitle => Self {
                text: "Subtitles here".to_string(),
                rect: LayerRect::new(5.0, 82.0, 90.0, 10.0),
                font_size: 4.0,
                bg_color: Some("#000000b3".to_string()),
                animation: Animation::SlideInBottom,
                ..base
            },
            LayerKind::Hashtag => Self {
                text: "#trending".to_string(),
                rect: LayerRect::new(10.0, 70.0, 50.0, 7.0),
                font_size: 4.0,
                color: "#4dd0e1".to_string(),
                bold: true,
                animation: Animation::PopIn,
                text_align: TextAlign::Left,
                ..base
            },
        }
    }

    /// Visibility window test against the sampled playback time.
    pub fn is_visible_at(&self, t: f64, video_duration: f64) -> bool {
        t >= self.start && t <= self.end.unwrap_or(video_duration)
    }

    pub fn validate(&self) -> OvercutResult<()> {
        if !self.rect.in_frame() {
            return Err(OvercutError::validation(format!(
                "layer {:?} leaves the frame",
                self.id
            )));
        }
        if !(self.opacity.is_finite() && (0.0..=1.0).contains(&self.opacity)) {
            return Err(OvercutError::validation(format!(
                "layer {:?} opacity must be within 0..=1",
                self.id
            )));
        }
        if !(self.start.is_finite() && self.start >= 0.0) {
            return Err(OvercutError::validation(format!(
                "layer {:?} start time must be >= 0",
                self.id
            )));
        }
        if let Some(end) = self.end
            && end < self.start
        {
            return Err(OvercutError::validation(format!(
                "layer {:?} ends before it starts",
                self.id
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(OvercutError::validation(format!(
                "layer {:?} font size must be > 0",
                self.id
            )));
        }
        Ok(())
    }
}

/// Overlay document for one video: ordered layers, later entries paint on
/// top.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayProject {
    pub name: String,
    pub video: AssetMeta,
    pub layers: Vec<Layer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<LayerId>,
}

impl OverlayProject {
    pub fn new(name: impl Into<String>, video: AssetMeta) -> Self {
        Self {
            name: name.into(),
            video,
            layers: Vec::new(),
            selected: None,
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    fn alloc_layer_id(&self) -> LayerId {
        LayerId(self.layers.iter().map(|l| l.id.0).max().map_or(0, |m| m + 1))
    }

    /// Adds a preset layer on top of the stack and selects it.
    pub fn add_layer(&mut self, kind: LayerKind) -> LayerId {
        let id = self.alloc_layer_id();
        self.layers.push(Layer::preset(kind, id));
        self.selected = Some(id);
        id
    }

    pub fn remove_layer(&mut self, id: LayerId) -> EditResult<()> {
        let index = self.index_of(id).ok_or(EditRejection::UnknownLayer)?;
        self.layers.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Copies a layer right above the original, nudged down so both stay
    /// visible, and selects the copy.
    pub fn duplicate_layer(&mut self, id: LayerId) -> EditResult<LayerId> {
        let index = self.index_of(id).ok_or(EditRejection::UnknownLayer)?;
        let mut copy = self.layers[index].clone();
        copy.id = self.alloc_layer_id();
        copy.rect.y = (copy.rect.y + DUPLICATE_OFFSET_PCT).min(95.0);
        copy.rect = copy.rect.clamped();
        let copy_id = copy.id;
        self.layers.insert(index + 1, copy);
        self.selected = Some(copy_id);
        Ok(copy_id)
    }

    /// Swaps the layer with the one painted above it. No-op at the top.
    pub fn move_layer_up(&mut self, id: LayerId) -> EditResult<()> {
        let index = self.index_of(id).ok_or(EditRejection::UnknownLayer)?;
        if index + 1 < self.layers.len() {
            self.layers.swap(index, index + 1);
        }
        Ok(())
    }

    /// Swaps the layer with the one painted below it. No-op at the bottom.
    pub fn move_layer_down(&mut self, id: LayerId) -> EditResult<()> {
        let index = self.index_of(id).ok_or(EditRejection::UnknownLayer)?;
        if index > 0 {
            self.layers.swap(index, index - 1);
        }
        Ok(())
    }

    /// Applies geometry through the clamp rule, drag and numeric entry
    /// alike.
    pub fn set_layer_rect(&mut self, id: LayerId, rect: LayerRect) -> EditResult<()> {
        let layer = self.layer_mut(id).ok_or(EditRejection::UnknownLayer)?;
        layer.rect = rect.clamped();
        Ok(())
    }

    pub fn set_layer_position(&mut self, id: LayerId, x: f64, y: f64) -> EditResult<()> {
        let layer = self.layer_mut(id).ok_or(EditRejection::UnknownLayer)?;
        layer.rect = LayerRect { x, y, ..layer.rect }.clamped();
        Ok(())
    }

    pub fn select(&mut self, id: Option<LayerId>) -> EditResult<()> {
        if let Some(id) = id
            && self.layer(id).is_none()
        {
            return Err(EditRejection::UnknownLayer);
        }
        self.selected = id;
        Ok(())
    }

    pub fn validate(&self) -> OvercutResult<()> {
        if !(self.video.duration.is_finite() && self.video.duration > 0.0) {
            return Err(OvercutError::validation(
                "project video must have a positive duration",
            ));
        }
        for layer in &self.layers {
            if self.layers.iter().filter(|l| l.id == layer.id).count() > 1 {
                return Err(OvercutError::validation(format!(
                    "duplicate layer id {:?}",
                    layer.id
                )));
            }
            layer.validate()?;
        }
        if let Some(selected) = self.selected
            && self.layer(selected).is_none()
        {
            return Err(OvercutError::validation(
                "selection points at a missing layer",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> AssetMeta {
        AssetMeta {
            id: "v1".to_string(),
            duration: 30.0,
            width: 1080,
            height: 1920,
            path: "/media/v1.mp4".to_string(),
            thumbnail: None,
        }
    }

    fn project_with_text_layer() -> (OverlayProject, LayerId) {
        let mut project = OverlayProject::new("Kickoff", video());
        let id = project.add_layer(LayerKind::Text);
        (project, id)
    }

    #[test]
    fn rect_clamp_keeps_the_box_in_frame() {
        let r = LayerRect::new(95.0, 0.0, 80.0, 12.0);
        assert_eq!(r.x, 20.0);
        assert!(r.in_frame());

        let r = LayerRect::new(-10.0, 120.0, 50.0, 10.0);
        assert_eq!(r.x, 0.0);
        assert_eq!(r.y, 90.0);
        assert!(r.in_frame());
    }

    #[test]
    fn rect_clamp_rounds_to_one_decimal() {
        let r = LayerRect::new(33.333, 10.05, 50.0, 10.0);
        assert_eq!(r.x, 33.3);
        assert_eq!(r.y, 10.1);
    }

    #[test]
    fn rect_clamp_handles_non_finite_input() {
        let r = LayerRect::new(f64::NAN, 5.0, f64::INFINITY, 10.0);
        assert!(r.in_frame());
    }

    #[test]
    fn add_layer_selects_the_new_layer() {
        let (project, id) = project_with_text_layer();
        assert_eq!(project.selected, Some(id));
        assert_eq!(project.layers.len(), 1);
        project.validate().unwrap();
    }

    #[test]
    fn presets_differ_and_stay_in_frame() {
        let mut project = OverlayProject::new("p", video());
        for kind in [
            LayerKind::Text,
            LayerKind::Logo,
            LayerKind::Subtitle,
            LayerKind::Hashtag,
        ] {
            let id = project.add_layer(kind);
            let layer = project.layer(id).unwrap();
            assert!(layer.rect.in_frame());
            assert!(!layer.text.is_empty());
        }
        project.validate().unwrap();
        let subtitle = &project.layers[2];
        assert_eq!(subtitle.animation, Animation::SlideInBottom);
        assert!(subtitle.bg_color.is_some());
    }

    #[test]
    fn remove_layer_clears_selection() {
        let (mut project, id) = project_with_text_layer();
        project.remove_layer(id).unwrap();
        assert!(project.layers.is_empty());
        assert_eq!(project.selected, None);
        assert_eq!(project.remove_layer(id), Err(EditRejection::UnknownLayer));
    }

    #[test]
    fn duplicate_nudges_down_and_respects_the_frame() {
        let (mut project, id) = project_with_text_layer();
        let copy = project.duplicate_layer(id).unwrap();
        let (orig, dup) = (project.layer(id).unwrap(), project.layer(copy).unwrap());
        assert_eq!(dup.rect.y, orig.rect.y + 5.0);
        assert_eq!(project.selected, Some(copy));

        // A layer hugging the bottom cannot be pushed out of frame.
        project.set_layer_position(copy, 10.0, 100.0).unwrap();
        let low = project.duplicate_layer(copy).unwrap();
        assert!(project.layer(low).unwrap().rect.in_frame());
    }

    #[test]
    fn move_up_down_swaps_paint_order() {
        let mut project = OverlayProject::new("p", video());
        let a = project.add_layer(LayerKind::Text);
        let b = project.add_layer(LayerKind::Subtitle);

        project.move_layer_up(a).unwrap();
        assert_eq!(project.layers[1].id, a);
        project.move_layer_up(a).unwrap(); // already on top
        assert_eq!(project.layers[1].id, a);
        project.move_layer_down(a).unwrap();
        assert_eq!(project.layers[0].id, a);
        assert_eq!(project.layers[1].id, b);
    }

    #[test]
    fn visibility_window_with_open_end() {
        let (mut project, id) = project_with_text_layer();
        {
            let layer = project.layer_mut(id).unwrap();
            layer.start = 2.0;
            layer.end = None;
        }
        let layer = project.layer(id).unwrap();
        assert!(!layer.is_visible_at(1.0, 30.0));
        assert!(layer.is_visible_at(5.0, 30.0));
        assert!(layer.is_visible_at(30.0, 30.0));
        assert!(!layer.is_visible_at(30.5, 30.0));
    }

    #[test]
    fn visibility_window_with_explicit_end() {
        let (mut project, id) = project_with_text_layer();
        {
            let layer = project.layer_mut(id).unwrap();
            layer.start = 2.0;
            layer.end = Some(4.0);
        }
        let layer = project.layer(id).unwrap();
        assert!(layer.is_visible_at(2.0, 30.0));
        assert!(layer.is_visible_at(4.0, 30.0));
        assert!(!layer.is_visible_at(4.1, 30.0));
    }

    #[test]
    fn end_time_serializes_as_negative_one() {
        let (project, _) = project_with_text_layer();
        let value = serde_json::to_value(&project.layers[0]).unwrap();
        assert_eq!(value["end_time"], serde_json::json!(-1.0));
        assert!(value["x"].is_number(), "rect fields are flattened");

        let back: Layer = serde_json::from_value(value).unwrap();
        assert_eq!(back.end, None);

        let mut timed = project.layers[0].clone();
        timed.end = Some(4.5);
        let value = serde_json::to_value(&timed).unwrap();
        assert_eq!(value["end_time"], serde_json::json!(4.5));
        let back: Layer = serde_json::from_value(value).unwrap();
        assert_eq!(back.end, Some(4.5));
    }

    #[test]
    fn validate_rejects_bad_windows_and_selection() {
        let (mut project, id) = project_with_text_layer();
        project.layer_mut(id).unwrap().start = -1.0;
        assert!(project.validate().is_err());

        project.layer_mut(id).unwrap().start = 5.0;
        project.layer_mut(id).unwrap().end = Some(4.0);
        assert!(project.validate().is_err());

        project.layer_mut(id).unwrap().end = None;
        project.validate().unwrap();

        project.selected = Some(LayerId(99));
        assert!(project.validate().is_err());
    }
}
