//! Pointer gestures over the timeline strip.
//!
//! [`PointerRecognizer`] turns raw pointer samples into [`GestureEvent`]s.
//! A press that stays within `tap_slop_px` of where it started is a tap on
//! release; moving further turns it into a pan. Tap and pan never both emit
//! for the same interaction.
//!
//! [`GestureMapper`] converts gesture events into [`ScrubAction`]s in
//! normalized progress. It arbitrates a second time per [`InteractionId`]: the
//! first kind (tap or pan) to reach it claims the interaction, and events of
//! the other kind for that interaction are dropped. A host that wires its own
//! tap and pan recognizers in parallel therefore still gets at most one seek
//! per interaction.

use tracing::trace;

/// Identifies one press-to-release interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractionId(pub u64);

/// Semantic gesture, carrying the pointer x offset within the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Tap { id: InteractionId, x: f64 },
    PanStart { id: InteractionId, x: f64 },
    PanUpdate { id: InteractionId, x: f64 },
    PanEnd { id: InteractionId, x: f64 },
    PanCancel { id: InteractionId },
}

impl GestureEvent {
    pub fn interaction(&self) -> InteractionId {
        match *self {
            Self::Tap { id, .. }
            | Self::PanStart { id, .. }
            | Self::PanUpdate { id, .. }
            | Self::PanEnd { id, .. }
            | Self::PanCancel { id } => id,
        }
    }

    fn kind(&self) -> GestureKind {
        match self {
            Self::Tap { .. } => GestureKind::Tap,
            _ => GestureKind::Pan,
        }
    }
}

/// Raw pointer sample fed to the recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerSample {
    Down { x: f64 },
    Move { x: f64 },
    Up { x: f64 },
    Cancel,
}

pub const DEFAULT_TAP_SLOP_PX: f64 = 8.0;

#[derive(Debug, Clone, Copy)]
struct Press {
    id: InteractionId,
    down_x: f64,
    panning: bool,
}

/// Composes tap and pan recognition over one pointer.
#[derive(Debug, Clone)]
pub struct PointerRecognizer {
    tap_slop_px: f64,
    next_id: u64,
    press: Option<Press>,
}

impl Default for PointerRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_TAP_SLOP_PX)
    }
}

impl PointerRecognizer {
    pub fn new(tap_slop_px: f64) -> Self {
        Self {
            tap_slop_px: tap_slop_px.max(0.0),
            next_id: 0,
            press: None,
        }
    }

    pub fn tap_slop_px(&self) -> f64 {
        self.tap_slop_px
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn process(&mut self, sample: PointerSample) -> Vec<GestureEvent> {
        match sample {
            PointerSample::Down { x } => {
                // A down without a matching up means the release was lost.
                let events = self.cancel_press();
                self.next_id += 1;
                self.press = Some(Press {
                    id: InteractionId(self.next_id),
                    down_x: x,
                    panning: false,
                });
                events
            }
            PointerSample::Move { x } => {
                let Some(press) = self.press.as_mut() else {
                    return Vec::new();
                };
                if press.panning {
                    return vec![GestureEvent::PanUpdate { id: press.id, x }];
                }
                if (x - press.down_x).abs() <= self.tap_slop_px {
                    return Vec::new();
                }
                press.panning = true;
                vec![
                    GestureEvent::PanStart {
                        id: press.id,
                        x: press.down_x,
                    },
                    GestureEvent::PanUpdate { id: press.id, x },
                ]
            }
            PointerSample::Up { x } => match self.press.take() {
                Some(press) if press.panning => vec![GestureEvent::PanEnd { id: press.id, x }],
                Some(press) => vec![GestureEvent::Tap {
                    id: press.id,
                    x: press.down_x,
                }],
                None => Vec::new(),
            },
            PointerSample::Cancel => self.cancel_press(),
        }
    }

    /// Drops any press in progress without emitting anything.
    pub fn reset(&mut self) {
        self.press = None;
    }

    fn cancel_press(&mut self) -> Vec<GestureEvent> {
        match self.press.take() {
            Some(press) if press.panning => vec![GestureEvent::PanCancel { id: press.id }],
            _ => Vec::new(),
        }
    }
}

/// What the position model should do in response to a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrubAction {
    /// Tap: position once, seek, done.
    Tap { progress: f64 },
    /// Pan started: enter dragging at `progress`.
    Begin { progress: f64 },
    /// Pan moved: update display state only.
    Preview { progress: f64 },
    /// Pan released: seek to `progress` and leave dragging.
    Commit { progress: f64 },
    /// Pan aborted: leave dragging without seeking.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureKind {
    Tap,
    Pan,
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    id: InteractionId,
    kind: GestureKind,
    finished: bool,
}

/// Maps pointer offsets to normalized progress and arbitrates tap vs pan.
#[derive(Debug, Clone)]
pub struct GestureMapper {
    width: f64,
    claim: Option<Claim>,
}

impl GestureMapper {
    pub fn new(width: f64) -> Self {
        Self {
            width: sanitize_width(width),
            claim: None,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = sanitize_width(width);
    }

    /// `clamp(x, 0, width) / width`; zero while the timeline has no width.
    pub fn progress_at(&self, x: f64) -> f64 {
        if self.width <= 0.0 || x.is_nan() {
            return 0.0;
        }
        x.clamp(0.0, self.width) / self.width
    }

    pub fn seek_time_at(&self, x: f64, duration_secs: f64) -> f64 {
        self.progress_at(x) * duration_secs
    }

    pub fn handle(&mut self, event: GestureEvent) -> Option<ScrubAction> {
        let id = event.interaction();
        let kind = event.kind();

        match self.claim {
            Some(claim) if claim.id == id => {
                if claim.kind != kind || claim.finished {
                    trace!(interaction = id.0, ?event, "gesture dropped by arbitration");
                    return None;
                }
            }
            _ => {
                // Only a tap or a pan start may open an interaction.
                if !matches!(
                    event,
                    GestureEvent::Tap { .. } | GestureEvent::PanStart { .. }
                ) {
                    trace!(interaction = id.0, ?event, "gesture for unknown interaction");
                    return None;
                }
                self.claim = Some(Claim {
                    id,
                    kind,
                    finished: false,
                });
            }
        }

        let action = match event {
            GestureEvent::Tap { x, .. } => {
                self.finish();
                ScrubAction::Tap {
                    progress: self.progress_at(x),
                }
            }
            GestureEvent::PanStart { x, .. } => ScrubAction::Begin {
                progress: self.progress_at(x),
            },
            GestureEvent::PanUpdate { x, .. } => ScrubAction::Preview {
                progress: self.progress_at(x),
            },
            GestureEvent::PanEnd { x, .. } => {
                self.finish();
                ScrubAction::Commit {
                    progress: self.progress_at(x),
                }
            }
            GestureEvent::PanCancel { .. } => {
                self.finish();
                ScrubAction::Cancel
            }
        };
        Some(action)
    }

    fn finish(&mut self) {
        if let Some(claim) = self.claim.as_mut() {
            claim.finished = true;
        }
    }
}

fn sanitize_width(width: f64) -> f64 {
    if width.is_finite() { width.max(0.0) } else { 0.0 }
}
