//! Single source of truth for where the scrubber is.
//!
//! Three writers race for the position: periodic engine time updates, user
//! gestures, and the seek issued when a drag ends. The model resolves them
//! with a small state machine:
//!
//! ```text
//! Idle --(time update, duration known)--> Following
//! Following --(gesture start)--> Dragging
//! Dragging --(gesture end: seek, then release)--> Following
//! ```
//!
//! While `Dragging`, engine time updates are dropped so late playback events
//! cannot pull the scrubber away from the user's finger.

use tracing::trace;

use crate::time::MediaDuration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Idle,
    Following,
    Dragging,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackPositionModel {
    state: PositionState,
    duration: Option<MediaDuration>,
    progress: f64,
    display_time: f64,
}

impl Default for PlaybackPositionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackPositionModel {
    pub fn new() -> Self {
        Self {
            state: PositionState::Idle,
            duration: None,
            progress: 0.0,
            display_time: 0.0,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    /// Normalized scrubber position in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Time shown on the label, in `[0, duration]`.
    pub fn display_time(&self) -> f64 {
        self.display_time
    }

    pub fn duration(&self) -> Option<MediaDuration> {
        self.duration
    }

    pub fn is_dragging(&self) -> bool {
        self.state == PositionState::Dragging
    }

    /// Records the media duration. The first value wins; returns `true` only
    /// when this call fixed it.
    pub fn set_duration(&mut self, duration: MediaDuration) -> bool {
        if self.duration.is_some() {
            return false;
        }
        self.duration = Some(duration);
        true
    }

    /// Applies an engine time update. Returns `false` when it was ignored
    /// (dragging, or duration still unknown).
    pub fn on_time_update(&mut self, current_time: f64) -> bool {
        if self.is_dragging() {
            trace!(current_time, "time update ignored while dragging");
            return false;
        }
        let Some(duration) = self.duration else {
            return false;
        };

        self.display_time = duration.clamp(current_time);
        self.progress = progress_of(self.display_time, duration);
        self.state = PositionState::Following;
        true
    }

    /// Enters `Dragging` at the start of a tap or pan.
    pub fn begin_drag(&mut self) {
        self.state = PositionState::Dragging;
    }

    /// Moves the scrubber optimistically while dragging.
    pub fn preview(&mut self, progress: f64) {
        if !self.is_dragging() {
            return;
        }
        self.progress = clamp_progress(progress);
        self.display_time = self
            .duration
            .map(|duration| duration.clamp(self.progress * duration.as_secs()))
            .unwrap_or(0.0);
    }

    /// Ends a drag: hands the final time to `seek`, then leaves `Dragging`.
    ///
    /// Returns the seek target, or `None` when no drag was active.
    pub fn finish_drag(&mut self, seek: impl FnOnce(f64)) -> Option<f64> {
        if !self.is_dragging() {
            return None;
        }
        let target = self.display_time;
        seek(target);
        self.state = PositionState::Following;
        Some(target)
    }

    /// Leaves `Dragging` without seeking; the next engine update restores the
    /// real position.
    pub fn cancel_drag(&mut self) {
        if self.is_dragging() {
            self.state = if self.duration.is_some() {
                PositionState::Following
            } else {
                PositionState::Idle
            };
        }
    }

    /// A tap: one instantaneous drag at `progress`.
    pub fn tap(&mut self, progress: f64, seek: impl FnOnce(f64)) -> Option<f64> {
        self.begin_drag();
        self.preview(progress);
        self.finish_drag(seek)
    }
}

fn progress_of(time: f64, duration: MediaDuration) -> f64 {
    if duration.as_secs() <= 0.0 {
        return 0.0;
    }
    clamp_progress(time / duration.as_secs())
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0)
}
