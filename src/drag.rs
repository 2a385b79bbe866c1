use kurbo::{Point, Size};

use crate::{
    overlay::{LayerId, LayerRect},
    timeline::ClipId,
};

// Pure percent-space drag helpers (testable without UI).

/// Pointer displacement mapped into the percent coordinate space of the
/// rendered container, then clamped through [`LayerRect::clamped`]. A
/// degenerate container leaves the rect where it was.
pub fn drag_rect(
    orig: LayerRect,
    pointer_start: Point,
    pointer: Point,
    container: Size,
) -> LayerRect {
    let mut rect = orig;
    if container.width > 0.0 {
        rect.x = orig.x + (pointer.x - pointer_start.x) / container.width * 100.0;
    }
    if container.height > 0.0 {
        rect.y = orig.y + (pointer.y - pointer_start.y) / container.height * 100.0;
    }
    rect.clamped()
}

/// Horizontal pointer displacement mapped to a clip slot index.
///
/// `slot_width` is the rendered width of one clip tile in pointer units.
pub fn reorder_slot(
    from: usize,
    pointer_start_x: f64,
    pointer_x: f64,
    slot_width: f64,
    clip_count: usize,
) -> usize {
    if clip_count == 0 {
        return 0;
    }
    if slot_width <= 0.0 {
        return from.min(clip_count - 1);
    }
    let delta = ((pointer_x - pointer_start_x) / slot_width).round() as i64;
    let target = from as i64 + delta;
    target.clamp(0, clip_count as i64 - 1) as usize
}

/// One layer drag gesture: explicit begin/update/end, one target at a time.
///
/// `update` only computes the clamped geometry; applying it to the model is
/// the caller's move. Removing the dragged layer must go through
/// [`LayerDrag::cancel_if_target`] so no gesture outlives its target.
#[derive(Clone, Debug, Default)]
pub struct LayerDrag {
    active: Option<ActiveLayerDrag>,
}

#[derive(Clone, Copy, Debug)]
struct ActiveLayerDrag {
    target: LayerId,
    pointer_start: Point,
    orig: LayerRect,
}

impl LayerDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn target(&self) -> Option<LayerId> {
        self.active.map(|a| a.target)
    }

    /// Starts a gesture. A second begin while one is active is ignored and
    /// returns false.
    pub fn begin(&mut self, target: LayerId, pointer: Point, orig: LayerRect) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(ActiveLayerDrag {
            target,
            pointer_start: pointer,
            orig,
        });
        true
    }

    /// Geometry for the current pointer position, or None when idle.
    pub fn update(&self, pointer: Point, container: Size) -> Option<(LayerId, LayerRect)> {
        let a = self.active.as_ref()?;
        Some((a.target, drag_rect(a.orig, a.pointer_start, pointer, container)))
    }

    /// Ends the gesture, returning the released target.
    pub fn end(&mut self) -> Option<LayerId> {
        self.active.take().map(|a| a.target)
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Aborts the gesture when `id` is being dragged. Returns true if a
    /// gesture was aborted.
    pub fn cancel_if_target(&mut self, id: LayerId) -> bool {
        if self.target() == Some(id) {
            self.active = None;
            true
        } else {
            false
        }
    }
}

/// Clip-reorder drag over the strip of clip tiles.
#[derive(Clone, Debug, Default)]
pub struct ReorderDrag {
    active: Option<ActiveReorder>,
}

#[derive(Clone, Copy, Debug)]
struct ActiveReorder {
    target: ClipId,
    from: usize,
    pointer_start: Point,
}

impl ReorderDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn target(&self) -> Option<ClipId> {
        self.active.map(|a| a.target)
    }

    pub fn begin(&mut self, target: ClipId, from: usize, pointer: Point) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(ActiveReorder {
            target,
            from,
            pointer_start: pointer,
        });
        true
    }

    /// Slot the dragged clip would land in at this pointer position.
    pub fn slot(&self, pointer: Point, slot_width: f64, clip_count: usize) -> Option<usize> {
        let a = self.active.as_ref()?;
        Some(reorder_slot(
            a.from,
            a.pointer_start.x,
            pointer.x,
            slot_width,
            clip_count,
        ))
    }

    /// Ends the gesture, returning the dragged clip and its source index.
    pub fn end(&mut self) -> Option<(ClipId, usize)> {
        self.active.take().map(|a| (a.target, a.from))
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn cancel_if_target(&mut self, id: ClipId) -> bool {
        if self.target() == Some(id) {
            self.active = None;
            true
        } else {
            false
        }
    }
}
