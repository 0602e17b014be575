use std::sync::Arc;
use std::time::Duration;

use scrubber::{
    ManualPlayer, MediaReference, PointerSample, PositionState, ScreenEvent, ScreenMessage,
    ScrubberConfig, ScrubberScreen, SharedThumbnailCache,
};
use timeline_view::{TimelineView, ViewMessage};

/// Routes view output into the screen and screen output back into the view,
/// the way a host event loop would.
struct Harness {
    player: Arc<ManualPlayer>,
    screen: ScrubberScreen<ManualPlayer>,
    view: TimelineView,
}

impl Harness {
    fn new(duration: f64, width: f32) -> Self {
        let config = ScrubberConfig::default();
        let player = Arc::new(ManualPlayer::with_duration(duration));
        let mut screen = ScrubberScreen::new(
            Arc::clone(&player),
            MediaReference::new("clip.mp4"),
            config.clone(),
            SharedThumbnailCache::new(5),
        );
        let mut view = TimelineView::new(&config, width);

        for message in view.initial_messages() {
            screen.handle(message);
        }
        for event in screen.start() {
            view.update(ViewMessage::Screen(event));
        }
        Self {
            player,
            screen,
            view,
        }
    }

    fn send(&mut self, message: ScreenMessage) -> Vec<ScreenEvent> {
        let events = self.screen.handle(message);
        for event in &events {
            self.view.update(ViewMessage::Screen(event.clone()));
        }
        events
    }

    fn pointer(&mut self, sample: PointerSample) -> Vec<ScreenEvent> {
        let messages = self.view.update(ViewMessage::Pointer(sample));
        messages
            .into_iter()
            .flat_map(|message| self.send(message))
            .collect()
    }

    fn engine_time(&mut self, current_time: f64) {
        self.player.advance_to(current_time);
        self.send(ScreenMessage::Player(scrubber::PlayerEvent::TimeUpdate {
            current_time,
        }));
    }
}

#[test]
fn drag_from_start_to_end_seeks_to_duration_and_resumes_following() {
    let mut harness = Harness::new(100.0, 400.0);
    harness.engine_time(0.0);

    harness.pointer(PointerSample::Down { x: 0.0 });
    harness.pointer(PointerSample::Move { x: 200.0 });
    assert!(harness.view.snapshot().is_some_and(|s| s.is_dragging()));
    assert_eq!(harness.view.render_model().fill_width, 200.0);

    harness.engine_time(3.0);
    assert_eq!(harness.view.render_model().fill_width, 200.0);

    let events = harness.pointer(PointerSample::Up { x: 400.0 });

    assert!(
        events
            .iter()
            .any(|event| matches!(event, ScreenEvent::Seeked { time } if *time == 100.0))
    );
    assert_eq!(harness.player.seeks(), vec![100.0]);
    assert_eq!(harness.screen.snapshot().state, PositionState::Following);
    assert_eq!(harness.view.render_model().playhead_x, 400.0 - 4.0);
}

#[test]
fn tap_in_the_middle_seeks_to_half_duration() {
    let mut harness = Harness::new(80.0, 200.0);
    harness.engine_time(0.0);

    harness.pointer(PointerSample::Down { x: 100.0 });
    harness.pointer(PointerSample::Up { x: 102.0 });

    assert_eq!(harness.player.seeks(), vec![40.0]);
    for _ in 0..100 {
        harness.view.update(ViewMessage::Tick(Duration::from_millis(16)));
    }
    assert_eq!(harness.view.render_model().label.text, "0:40");
    assert_eq!(harness.view.render_model().label.opacity, 0.0);
}

#[test]
fn loading_flag_reaches_the_render_model() {
    let harness = Harness::new(30.0, 200.0);

    let model = harness.view.render_model();

    assert!(model.loading);
    assert_eq!(model.cells.len(), 10);
    assert!(model.cells.iter().all(|cell| cell.image.is_none()));
}
