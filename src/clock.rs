use std::{cell::Cell, time::Instant};

/// Injectable time source for playback and controllers.
///
/// Everything downstream of a clock is a pure function of the sampled time,
/// so swapping in [`ManualClock`] makes visibility, animation, debounce and
/// progress behavior fully deterministic under test.
pub trait TimeSource {
    /// Current position in seconds.
    fn now(&self) -> f64;
}

/// Wall-clock playback position over a video.
///
/// While playing, the position is anchored to an [`Instant`] and advances at
/// `rate` seconds per wall second. Pausing freezes the position; seeking
/// re-anchors it.
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    playing: bool,
    rate: f64,
    anchor_instant: Option<Instant>,
    anchor_secs: f64,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            playing: false,
            rate: 1.0,
            anchor_instant: None,
            anchor_secs: 0.0,
        }
    }
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.anchor_instant = Some(Instant::now());
    }

    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.anchor_secs = self.position();
        self.playing = false;
        self.anchor_instant = None;
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek_to(&mut self, secs: f64) {
        self.anchor_secs = secs.max(0.0);
        if self.playing {
            self.anchor_instant = Some(Instant::now());
        }
    }

    /// Playback speed multiplier. Re-anchors so the position stays continuous.
    pub fn set_rate(&mut self, rate: f64) {
        if !(rate.is_finite() && rate > 0.0) {
            return;
        }
        self.anchor_secs = self.position();
        if self.playing {
            self.anchor_instant = Some(Instant::now());
        }
        self.rate = rate;
    }

    fn position(&self) -> f64 {
        match (self.playing, self.anchor_instant) {
            (true, Some(anchor)) => self.anchor_secs + anchor.elapsed().as_secs_f64() * self.rate,
            _ => self.anchor_secs,
        }
    }
}

impl TimeSource for PlaybackClock {
    fn now(&self) -> f64 {
        self.position()
    }
}

/// Hand-advanced clock for tests and offline sampling.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    secs: Cell<f64>,
}

impl ManualClock {
    pub fn new(secs: f64) -> Self {
        Self { secs: Cell::new(secs) }
    }

    pub fn set(&self, secs: f64) {
        self.secs.set(secs);
    }

    pub fn advance(&self, secs: f64) {
        self.secs.set(self.secs.get() + secs);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> f64 {
        self.secs.get()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> f64 {
        (**self).now()
    }
}
