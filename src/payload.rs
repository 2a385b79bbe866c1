use crate::{
    error::{OvercutError, OvercutResult},
    job::JobStatus,
    overlay::{Layer, OverlayProject},
    timeline::{AssetMeta, OutputFormat, Timeline},
    transitions::{Transition, TransitionKind},
};

/// One clip as the backend stores it: the transition rides on the clip that
/// follows it, and the first clip always carries a cut.
///
/// In memory transitions live on seam edges (see [`Timeline`]); this shape
/// exists only at the wire boundary.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipPayload {
    pub asset_id: String,
    pub trim_start: f64,
    pub trim_end: f64,
    pub transition_type: TransitionKind,
    pub transition_duration: f64,
}

/// Maps seam `j` onto clip `j + 1`; clip 0 gets a cut.
pub fn clips_to_payload(timeline: &Timeline) -> Vec<ClipPayload> {
    timeline
        .clips
        .iter()
        .enumerate()
        .map(|(i, clip)| {
            let seam = if i == 0 {
                Transition::cut()
            } else {
                timeline.seams.get(i - 1).copied().unwrap_or_default()
            };
            ClipPayload {
                asset_id: clip.asset.id.clone(),
                trim_start: clip.trim_start,
                trim_end: clip.trim_end,
                transition_type: seam.kind,
                transition_duration: seam.overlap_secs(),
            }
        })
        .collect()
}

/// Rebuilds a timeline from the wire shape, resolving asset ids against the
/// provided metadata. Seams come from clips `1..`; clip 0's transition
/// fields are ignored.
pub fn timeline_from_payload(
    clips: &[ClipPayload],
    assets: &[AssetMeta],
    format: OutputFormat,
) -> OvercutResult<Timeline> {
    let mut timeline = Timeline::new(format);

    for (i, payload) in clips.iter().enumerate() {
        let asset = assets
            .iter()
            .find(|a| a.id == payload.asset_id)
            .ok_or_else(|| {
                OvercutError::validation(format!(
                    "clip {i} references missing asset '{}'",
                    payload.asset_id
                ))
            })?;
        timeline.add_clip(asset.clone());
        let clip = &mut timeline.clips[i];
        clip.trim_start = payload.trim_start;
        clip.trim_end = payload.trim_end;

        if i > 0 {
            timeline.seams[i - 1] = Transition {
                kind: payload.transition_type,
                duration: payload.transition_duration,
            };
        }
    }

    timeline.validate()?;
    Ok(timeline)
}

/// Debounced advisory recompute request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PreviewQuery {
    pub clips: Vec<ClipPayload>,
    pub output: OutputFormat,
}

impl PreviewQuery {
    pub fn from_timeline(timeline: &Timeline) -> Self {
        Self {
            clips: clips_to_payload(timeline),
            output: timeline.format,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PreviewSummary {
    pub clip_count: u32,
    pub effective_duration: f64,
    pub output_width: u32,
    pub output_height: u32,
}

/// Final assembly request. `save_as_asset` asks the backend to file the
/// result into the asset library as well.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComposeRequest {
    pub clips: Vec<ClipPayload>,
    pub output: OutputFormat,
    pub save_as_asset: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComposeAck {
    pub asset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

/// Overlay document as saved to the backend. `id` is absent on first save
/// and set for update-in-place.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlaySavePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub video_asset: String,
    pub layers: Vec<Layer>,
}

impl OverlaySavePayload {
    pub fn from_project(project: &OverlayProject, id: Option<String>) -> Self {
        Self {
            id,
            name: project.name.clone(),
            video_asset: project.video.id.clone(),
            layers: project.layers.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SaveAck {
    pub id: String,
    pub render_status: JobStatus,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderAck {
    pub render_status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str, secs: f64) -> AssetMeta {
        AssetMeta {
            id: id.to_string(),
            duration: secs,
            width: 1080,
            height: 1920,
            path: format!("/media/{id}.mp4"),
            thumbnail: None,
        }
    }

    fn dissolving_timeline() -> Timeline {
        let mut tl = Timeline::new(OutputFormat::vertical());
        tl.add_clip(asset("a", 10.0));
        tl.add_clip(asset("b", 8.0));
        tl.set_transition(0, TransitionKind::CrossDissolve).unwrap();
        tl
    }

    #[test]
    fn seams_ride_on_the_following_clip() {
        let clips = clips_to_payload(&dissolving_timeline());
        assert_eq!(clips[0].transition_type, TransitionKind::Cut);
        assert_eq!(clips[0].transition_duration, 0.0);
        assert_eq!(clips[1].transition_type, TransitionKind::CrossDissolve);
        assert_eq!(clips[1].transition_duration, 1.0);
    }

    #[test]
    fn wire_shape_roundtrips_through_the_seam_model() {
        let tl = dissolving_timeline();
        let clips = clips_to_payload(&tl);
        let assets = [asset("a", 10.0), asset("b", 8.0)];
        let back = timeline_from_payload(&clips, &assets, tl.format).unwrap();
        assert_eq!(back.seams, tl.seams);
        assert_eq!(back.effective_duration(), tl.effective_duration());
    }

    #[test]
    fn missing_asset_fails_the_rebuild() {
        let clips = clips_to_payload(&dissolving_timeline());
        let assets = [asset("a", 10.0)];
        assert!(timeline_from_payload(&clips, &assets, OutputFormat::vertical()).is_err());
    }

    #[test]
    fn payload_fields_are_snake_case() {
        let clips = clips_to_payload(&dissolving_timeline());
        let value = serde_json::to_value(&clips[1]).unwrap();
        assert!(value.get("transition_type").is_some());
        assert!(value.get("trim_start").is_some());
        assert_eq!(value["transition_type"], serde_json::json!("crossdissolve"));
    }

    #[test]
    fn save_payload_carries_the_document_id_only_when_known() {
        let video = asset("v1", 30.0);
        let project = OverlayProject::new("Kickoff", video);

        let fresh = OverlaySavePayload::from_project(&project, None);
        let value = serde_json::to_value(&fresh).unwrap();
        assert!(value.get("id").is_none());

        let update = OverlaySavePayload::from_project(&project, Some("ov-9".to_string()));
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["id"], serde_json::json!("ov-9"));
        assert_eq!(value["video_asset"], serde_json::json!("v1"));
    }

    #[test]
    fn acks_parse_backend_status_strings() {
        let ack: SaveAck =
            serde_json::from_str(r#"{"id":"ov-1","render_status":"pending"}"#).unwrap();
        assert_eq!(ack.render_status, JobStatus::Pending);

        let ack: RenderAck = serde_json::from_str(
            r#"{"render_status":"done","output_path":"/renders/ov-1.mp4"}"#,
        )
        .unwrap();
        assert_eq!(ack.render_status, JobStatus::Done);
        assert_eq!(ack.output_path.as_deref(), Some("/renders/ov-1.mp4"));
    }
}
