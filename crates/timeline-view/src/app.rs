use std::time::Duration;

use scrubber::{
    PointerRecognizer, PointerSample, ScreenEvent, ScreenMessage, ScrubberConfig,
    ScrubberSnapshot, ThumbnailSequence,
};
use tracing::debug;

use crate::smoothing::Smoothed;
use crate::widgets::timeline::{
    TimelineFrame, TimelineLayout, TimelineRenderModel, build_render_model,
};

/// Message consumed by [`TimelineView::update`].
#[derive(Debug, Clone)]
pub enum ViewMessage {
    Screen(ScreenEvent),
    Pointer(PointerSample),
    Resized { width: f32 },
    Tick(Duration),
    PlayPausePressed,
}

/// View state of the timeline: last screen snapshot, strip, and the
/// animated values derived from them.
#[derive(Debug, Clone)]
pub struct TimelineView {
    layout: TimelineLayout,
    snapshot: Option<ScrubberSnapshot>,
    thumbnails: ThumbnailSequence,
    progress: Smoothed,
    label_opacity: Smoothed,
    recognizer: PointerRecognizer,
    torn_down: bool,
}

impl TimelineView {
    pub fn new(config: &ScrubberConfig, width: f32) -> Self {
        let fade = Duration::from_millis(config.label_fade_ms);
        Self {
            layout: TimelineLayout::new(width, config.playhead_width_px as f32),
            snapshot: None,
            thumbnails: ThumbnailSequence::absent(config.thumbnail_count),
            progress: Smoothed::new(0.0),
            label_opacity: Smoothed::new(0.0).with_settle_time(fade),
            recognizer: PointerRecognizer::new(config.tap_slop_px),
            torn_down: false,
        }
    }

    /// Message announcing the initial width to the screen.
    pub fn initial_messages(&self) -> Vec<ScreenMessage> {
        vec![ScreenMessage::Resized {
            width: f64::from(self.layout.width),
        }]
    }

    /// Applies one view message and returns messages for the screen.
    pub fn update(&mut self, message: ViewMessage) -> Vec<ScreenMessage> {
        if self.torn_down {
            return Vec::new();
        }
        match message {
            ViewMessage::Screen(event) => {
                self.apply_screen_event(event);
                Vec::new()
            }
            ViewMessage::Pointer(sample) => self
                .recognizer
                .process(sample)
                .into_iter()
                .map(ScreenMessage::Gesture)
                .collect(),
            ViewMessage::Resized { width } => {
                self.layout.width = width.max(0.0);
                if self.recognizer.is_pressed() {
                    self.recognizer.reset();
                }
                vec![ScreenMessage::Resized {
                    width: f64::from(self.layout.width),
                }]
            }
            ViewMessage::Tick(dt) => {
                self.progress.advance(dt);
                self.label_opacity.advance(dt);
                Vec::new()
            }
            ViewMessage::PlayPausePressed => vec![ScreenMessage::TogglePlayback],
        }
    }

    pub fn render_model(&self) -> TimelineRenderModel {
        let (display_time, loading) = self
            .snapshot
            .map(|snapshot| (snapshot.display_time, snapshot.loading))
            .unwrap_or((0.0, false));
        build_render_model(
            &self.layout,
            &TimelineFrame {
                progress: self.progress.value(),
                display_time,
                thumbnails: &self.thumbnails,
                loading,
                label_opacity: self.label_opacity.value(),
            },
        )
    }

    pub fn snapshot(&self) -> Option<&ScrubberSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        !self.progress.is_at_rest() || !self.label_opacity.is_at_rest()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn apply_screen_event(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::PositionChanged(snapshot) => {
                if snapshot.is_dragging() {
                    self.progress.snap_to(snapshot.progress);
                    self.label_opacity.set_target(1.0);
                } else {
                    self.progress.set_target(snapshot.progress);
                    self.label_opacity.set_target(0.0);
                }
                self.snapshot = Some(snapshot);
            }
            ScreenEvent::ThumbnailsChanged(thumbnails) => self.thumbnails = thumbnails,
            ScreenEvent::Seeked { .. } => {
                // The playhead lands where the finger left it.
                if let Some(snapshot) = self.snapshot {
                    self.progress.snap_to(snapshot.progress);
                }
            }
            ScreenEvent::ThumbnailsRequested(_) => {}
            ScreenEvent::TornDown => {
                debug!("timeline view detached from torn down screen");
                self.recognizer.reset();
                self.torn_down = true;
            }
        }
    }
}
