//! The scrubber screen: one single-threaded owner of all mutable UI state.
//!
//! Every input (engine events, gestures, resize, generation results,
//! teardown) arrives as a [`ScreenMessage`] and is applied in order by
//! [`ScrubberScreen::handle`], which returns the [`ScreenEvent`]s a host
//! renders or acts on. Nothing else mutates the position model or the strip.

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::cache::SharedThumbnailCache;
use crate::config::ScrubberConfig;
use crate::generator::{GenerationJob, GenerationOutcome, ThumbnailGenerator};
use crate::gesture::{GestureEvent, GestureMapper, ScrubAction};
use crate::player::{PlaybackEngine, PlayerEvent};
use crate::position::{PlaybackPositionModel, PositionState};
use crate::thumbnail::{MediaReference, ThumbnailSequence};
use crate::time::MediaDuration;

/// Inputs accepted by the screen.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenMessage {
    Player(PlayerEvent),
    Gesture(GestureEvent),
    /// Timeline width in pixels changed.
    Resized {
        width: f64,
    },
    TogglePlayback,
    /// A generation job finished; `epoch` identifies the run.
    ThumbnailsGenerated {
        epoch: u64,
        outcome: GenerationOutcome,
    },
    Teardown,
}

/// Outputs emitted by the screen.
#[derive(Debug, Clone)]
pub enum ScreenEvent {
    PositionChanged(ScrubberSnapshot),
    ThumbnailsChanged(ThumbnailSequence),
    /// The host should run this job and post its outcome back.
    ThumbnailsRequested(GenerationJob),
    Seeked {
        time: f64,
    },
    TornDown,
}

/// Immutable view of the screen state consumed by the render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubberSnapshot {
    pub state: PositionState,
    pub progress: f64,
    pub display_time: f64,
    pub duration: Option<f64>,
    pub is_playing: bool,
    pub loading: bool,
}

impl ScrubberSnapshot {
    pub fn is_dragging(&self) -> bool {
        self.state == PositionState::Dragging
    }
}

pub struct ScrubberScreen<P: ?Sized> {
    player: Arc<P>,
    media: MediaReference,
    config: ScrubberConfig,
    position: PlaybackPositionModel,
    mapper: GestureMapper,
    generator: ThumbnailGenerator,
    thumbnails: ThumbnailSequence,
    pending_epoch: Option<u64>,
    loading: bool,
    is_playing: bool,
    alive: bool,
}

impl<P> ScrubberScreen<P>
where
    P: PlaybackEngine + ?Sized,
{
    /// Creates a screen for `media` played by `player`, backed by `cache`.
    pub fn new(
        player: Arc<P>,
        media: MediaReference,
        config: ScrubberConfig,
        cache: SharedThumbnailCache,
    ) -> Self {
        let thumbnails = ThumbnailSequence::absent(config.thumbnail_count);
        let is_playing = player.is_playing();
        Self {
            player,
            media,
            config,
            position: PlaybackPositionModel::new(),
            mapper: GestureMapper::new(0.0),
            generator: ThumbnailGenerator::new(cache),
            thumbnails,
            pending_epoch: None,
            loading: false,
            is_playing,
            alive: true,
        }
    }

    pub fn player(&self) -> &Arc<P> {
        &self.player
    }

    pub fn media(&self) -> &MediaReference {
        &self.media
    }

    pub fn config(&self) -> &ScrubberConfig {
        &self.config
    }

    pub fn thumbnails(&self) -> &ThumbnailSequence {
        &self.thumbnails
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn snapshot(&self) -> ScrubberSnapshot {
        ScrubberSnapshot {
            state: self.position.state(),
            progress: self.position.progress(),
            display_time: self.position.display_time(),
            duration: self.position.duration().map(MediaDuration::as_secs),
            is_playing: self.is_playing,
            loading: self.loading,
        }
    }

    /// Picks up a duration the engine already knows at mount time.
    pub fn start(&mut self) -> Vec<ScreenEvent> {
        let mut events = vec![ScreenEvent::ThumbnailsChanged(self.thumbnails.clone())];
        if self.alive {
            self.discover_duration(&mut events);
            events.push(self.position_changed());
        }
        events
    }

    /// Applies one message and returns emitted events.
    pub fn handle(&mut self, message: ScreenMessage) -> Vec<ScreenEvent> {
        if !self.alive {
            trace!(?message, "message after teardown ignored");
            return Vec::new();
        }
        match message {
            ScreenMessage::Player(event) => self.player_event(event),
            ScreenMessage::Gesture(event) => self.gesture(event),
            ScreenMessage::Resized { width } => {
                self.mapper.set_width(width);
                Vec::new()
            }
            ScreenMessage::TogglePlayback => {
                if self.player.is_playing() {
                    self.player.pause();
                } else {
                    self.player.play();
                }
                Vec::new()
            }
            ScreenMessage::ThumbnailsGenerated { epoch, outcome } => {
                self.thumbnails_generated(epoch, outcome)
            }
            ScreenMessage::Teardown => self.teardown(),
        }
    }

    fn player_event(&mut self, event: PlayerEvent) -> Vec<ScreenEvent> {
        let mut events = Vec::new();
        match event {
            PlayerEvent::TimeUpdate { current_time } => {
                self.discover_duration(&mut events);
                if self.position.on_time_update(current_time) {
                    events.push(self.position_changed());
                }
            }
            PlayerEvent::StatusChange => {
                if self.discover_duration(&mut events) {
                    events.push(self.position_changed());
                }
            }
            PlayerEvent::PlayingChange { is_playing } => {
                self.is_playing = is_playing;
                events.push(self.position_changed());
            }
        }
        events
    }

    fn gesture(&mut self, event: GestureEvent) -> Vec<ScreenEvent> {
        if self.position.duration().is_none() {
            debug!(?event, "gesture before duration is known ignored");
            return Vec::new();
        }
        let Some(action) = self.mapper.handle(event) else {
            return Vec::new();
        };

        let player = Arc::clone(&self.player);
        let seek = |time: f64| player.set_current_time(time);
        let mut events = Vec::new();
        let seeked = match action {
            ScrubAction::Tap { progress } => self.position.tap(progress, seek),
            ScrubAction::Begin { progress } => {
                self.position.begin_drag();
                self.position.preview(progress);
                None
            }
            ScrubAction::Preview { progress } => {
                self.position.preview(progress);
                None
            }
            ScrubAction::Commit { progress } => {
                self.position.preview(progress);
                self.position.finish_drag(seek)
            }
            ScrubAction::Cancel => {
                self.position.cancel_drag();
                self.position.on_time_update(self.player.current_time());
                None
            }
        };

        events.push(self.position_changed());
        if let Some(time) = seeked {
            info!(media = %self.media, time, "seek issued");
            events.push(ScreenEvent::Seeked { time });
        }
        events
    }

    /// Fixes the duration on first sight and requests the strip. Returns
    /// `true` when the duration became known during this call.
    fn discover_duration(&mut self, events: &mut Vec<ScreenEvent>) -> bool {
        if self.position.duration().is_some() {
            return false;
        }
        // Engines report 0 until metadata has loaded.
        let Some(seconds) = self.player.duration().filter(|seconds| *seconds > 0.0) else {
            return false;
        };
        let duration = match MediaDuration::new(seconds) {
            Ok(duration) => duration,
            Err(error) => {
                debug!(media = %self.media, %error, "engine reported unusable duration");
                return false;
            }
        };
        self.position.set_duration(duration);
        debug!(media = %self.media, duration_secs = seconds, "media duration known");
        self.request_thumbnails(duration, events);
        true
    }

    fn request_thumbnails(&mut self, duration: MediaDuration, events: &mut Vec<ScreenEvent>) {
        let request = self.config.generation_request(self.media.clone(), duration);
        if let Some(cached) = self.generator.lookup(&request) {
            debug!(media = %self.media, "thumbnail strip served from cache");
            self.thumbnails = cached;
            events.push(ScreenEvent::ThumbnailsChanged(self.thumbnails.clone()));
            return;
        }

        let token = self.generator.begin();
        self.pending_epoch = Some(token.epoch());
        self.loading = true;
        events.push(ScreenEvent::ThumbnailsRequested(GenerationJob::new(
            self.generator.clone(),
            token,
            request,
        )));
    }

    fn thumbnails_generated(&mut self, epoch: u64, outcome: GenerationOutcome) -> Vec<ScreenEvent> {
        if self.pending_epoch != Some(epoch) {
            debug!(epoch, pending = ?self.pending_epoch, "stale thumbnail result dropped");
            return Vec::new();
        }
        self.pending_epoch = None;
        self.loading = false;

        let mut events = Vec::new();
        if let Some(sequence) = outcome.into_sequence() {
            self.thumbnails = sequence;
            events.push(ScreenEvent::ThumbnailsChanged(self.thumbnails.clone()));
        }
        events.push(self.position_changed());
        events
    }

    fn teardown(&mut self) -> Vec<ScreenEvent> {
        self.generator.cancel();
        self.pending_epoch = None;
        self.loading = false;
        self.alive = false;
        info!(media = %self.media, "scrubber screen torn down");
        vec![ScreenEvent::TornDown]
    }

    fn position_changed(&self) -> ScreenEvent {
        ScreenEvent::PositionChanged(self.snapshot())
    }
}
