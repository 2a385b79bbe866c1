use kurbo::Vec2;

use crate::overlay::Layer;

/// Entrance animations run this long after the layer's start time.
pub const ANIM_SECS: f64 = 0.5;

/// Scale a pop-in starts from.
const POP_START_SCALE: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    None,
    FadeIn,
    SlideInLeft,
    SlideInBottom,
    PopIn,
}

/// Resolved presentation of one layer at one sampled time.
///
/// `translate_pct` is in percent of the layer's own size, matching how a
/// compositor offsets a box relative to its resting rect.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct LayerPose {
    pub visible: bool,
    pub opacity: f64,
    pub translate_pct: Vec2,
    pub scale: f64,
}

impl LayerPose {
    pub fn hidden() -> Self {
        Self {
            visible: false,
            opacity: 0.0,
            translate_pct: Vec2::ZERO,
            scale: 1.0,
        }
    }

    pub fn resting(opacity: f64) -> Self {
        Self {
            visible: true,
            opacity,
            translate_pct: Vec2::ZERO,
            scale: 1.0,
        }
    }

    pub fn is_resting(&self) -> bool {
        self.visible && self.translate_pct == Vec2::ZERO && self.scale == 1.0
    }
}

/// Pose of `layer` at time `t`, a pure function re-evaluated every sampled
/// frame. Outside the visibility window the pose is hidden; within the
/// first [`ANIM_SECS`] of the window the entrance animation is in flight;
/// afterwards the layer rests at its own styling.
pub fn animation_state(layer: &Layer, t: f64, video_duration: f64) -> LayerPose {
    if !layer.is_visible_at(t, video_duration) {
        return LayerPose::hidden();
    }

    let opacity = layer.opacity.clamp(0.0, 1.0);
    let elapsed = t - layer.start;
    if elapsed >= ANIM_SECS {
        return LayerPose::resting(opacity);
    }

    let k = (elapsed / ANIM_SECS).clamp(0.0, 1.0);
    match layer.animation {
        Animation::None => LayerPose::resting(opacity),
        Animation::FadeIn => LayerPose {
            opacity: opacity * k,
            ..LayerPose::resting(opacity)
        },
        Animation::SlideInLeft => LayerPose {
            translate_pct: Vec2::new(-100.0 * (1.0 - k), 0.0),
            ..LayerPose::resting(opacity)
        },
        Animation::SlideInBottom => LayerPose {
            translate_pct: Vec2::new(0.0, 100.0 * (1.0 - k)),
            ..LayerPose::resting(opacity)
        },
        Animation::PopIn => LayerPose {
            scale: POP_START_SCALE + (1.0 - POP_START_SCALE) * k,
            ..LayerPose::resting(opacity)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{LayerId, LayerKind};

    fn layer(animation: Animation, start: f64) -> Layer {
        let mut layer = Layer::preset(LayerKind::Text, LayerId(0));
        layer.animation = animation;
        layer.start = start;
        layer
    }

    #[test]
    fn hidden_outside_the_window() {
        let l = layer(Animation::FadeIn, 2.0);
        let pose = animation_state(&l, 1.0, 30.0);
        assert!(!pose.visible);
        assert_eq!(pose.opacity, 0.0);
    }

    #[test]
    fn every_animation_rests_after_half_a_second() {
        for anim in [
            Animation::None,
            Animation::FadeIn,
            Animation::SlideInLeft,
            Animation::SlideInBottom,
            Animation::PopIn,
        ] {
            let l = layer(anim, 2.0);
            assert!(animation_state(&l, 2.5, 30.0).is_resting(), "{anim:?}");
            assert!(animation_state(&l, 10.0, 30.0).is_resting(), "{anim:?}");
        }
    }

    #[test]
    fn none_rests_immediately() {
        let l = layer(Animation::None, 2.0);
        let pose = animation_state(&l, 2.0, 30.0);
        assert!(pose.is_resting());
        assert_eq!(pose.opacity, 1.0);
    }

    #[test]
    fn fade_ramps_opacity_linearly() {
        let l = layer(Animation::FadeIn, 2.0);
        assert_eq!(animation_state(&l, 2.0, 30.0).opacity, 0.0);
        assert_eq!(animation_state(&l, 2.25, 30.0).opacity, 0.5);
        assert_eq!(animation_state(&l, 2.5, 30.0).opacity, 1.0);
    }

    #[test]
    fn fade_scales_with_the_layers_own_opacity() {
        let mut l = layer(Animation::FadeIn, 0.0);
        l.opacity = 0.8;
        assert_eq!(animation_state(&l, 0.25, 30.0).opacity, 0.4);
        assert_eq!(animation_state(&l, 5.0, 30.0).opacity, 0.8);
    }

    #[test]
    fn slides_start_offscreen_and_land_at_rest() {
        let l = layer(Animation::SlideInLeft, 0.0);
        assert_eq!(animation_state(&l, 0.0, 30.0).translate_pct.x, -100.0);
        assert_eq!(animation_state(&l, 0.25, 30.0).translate_pct.x, -50.0);
        assert_eq!(animation_state(&l, 0.5, 30.0).translate_pct.x, 0.0);

        let l = layer(Animation::SlideInBottom, 0.0);
        assert_eq!(animation_state(&l, 0.0, 30.0).translate_pct.y, 100.0);
        assert_eq!(animation_state(&l, 0.5, 30.0).translate_pct.y, 0.0);
    }

    #[test]
    fn pop_grows_from_a_third() {
        let l = layer(Animation::PopIn, 0.0);
        assert_eq!(animation_state(&l, 0.0, 30.0).scale, 0.3);
        let mid = animation_state(&l, 0.25, 30.0).scale;
        assert!(mid > 0.3 && mid < 1.0);
        assert_eq!(animation_state(&l, 0.5, 30.0).scale, 1.0);
    }
}
