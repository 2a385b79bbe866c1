use crate::{
    anim::{LayerPose, animation_state},
    overlay::{LayerId, LayerKind, LayerRect, OverlayProject},
};

/// Everything a preview surface needs to paint one moment of the overlay
/// project.
#[derive(Clone, Debug, serde::Serialize)]
pub struct FrameSample {
    pub t: f64,
    /// Playback position as a fraction of the video, 0..=1.
    pub progress: f64,
    /// Visible layers in paint order, bottom first.
    pub layers: Vec<LayerFrame>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct LayerFrame {
    pub id: LayerId,
    pub kind: LayerKind,
    pub rect: LayerRect,
    pub pose: LayerPose,
}

/// Samples every visible layer at `t`. Layer order in the project is paint
/// order, so no sorting happens here; hidden layers are dropped.
#[tracing::instrument(skip(project))]
pub fn sample_frame(project: &OverlayProject, t: f64) -> FrameSample {
    let duration = project.video.duration;
    let progress = if duration > 0.0 {
        (t / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let layers = project
        .layers
        .iter()
        .filter(|layer| layer.is_visible_at(t, duration))
        .map(|layer| LayerFrame {
            id: layer.id,
            kind: layer.kind,
            rect: layer.rect,
            pose: animation_state(layer, t, duration),
        })
        .collect();

    FrameSample { t, progress, layers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{overlay::LayerKind, timeline::AssetMeta};

    fn project() -> OverlayProject {
        let video = AssetMeta {
            id: "v1".to_string(),
            duration: 20.0,
            width: 1080,
            height: 1920,
            path: "/media/v1.mp4".to_string(),
            thumbnail: None,
        };
        let mut project = OverlayProject::new("p", video);
        let text = project.add_layer(LayerKind::Text);
        let subtitle = project.add_layer(LayerKind::Subtitle);
        project.layer_mut(text).unwrap().start = 0.0;
        let sub = project.layer_mut(subtitle).unwrap();
        sub.start = 5.0;
        sub.end = Some(10.0);
        project
    }

    #[test]
    fn hidden_layers_are_dropped() {
        let p = project();
        assert_eq!(sample_frame(&p, 1.0).layers.len(), 1);
        assert_eq!(sample_frame(&p, 6.0).layers.len(), 2);
        assert_eq!(sample_frame(&p, 11.0).layers.len(), 1);
    }

    #[test]
    fn layers_come_back_in_paint_order() {
        let p = project();
        let sample = sample_frame(&p, 6.0);
        assert_eq!(sample.layers[0].kind, LayerKind::Text);
        assert_eq!(sample.layers[1].kind, LayerKind::Subtitle);
    }

    #[test]
    fn progress_tracks_the_video() {
        let p = project();
        assert_eq!(sample_frame(&p, 0.0).progress, 0.0);
        assert_eq!(sample_frame(&p, 5.0).progress, 0.25);
        assert_eq!(sample_frame(&p, 20.0).progress, 1.0);
        assert_eq!(sample_frame(&p, 25.0).progress, 1.0);
    }

    #[test]
    fn poses_are_mid_animation_when_sampled_early() {
        let p = project();
        let sample = sample_frame(&p, 5.25);
        let sub = &sample.layers[1];
        assert!(sub.pose.visible);
        assert!(sub.pose.translate_pct.y > 0.0);

        let settled = sample_frame(&p, 6.0);
        assert!(settled.layers[1].pose.is_resting());
    }
}
