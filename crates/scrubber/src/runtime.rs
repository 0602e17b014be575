//! Drives a [`ScrubberScreen`] on a tokio task.
//!
//! All inputs are marshalled into one unbounded queue and applied in arrival
//! order: engine events from the player subscription, gestures and resizes
//! posted through [`ScreenHandle`] from any thread, and outcomes of
//! generation jobs, which run as their own tasks. Emitted [`ScreenEvent`]s are
//! forwarded to the host.
//!
//! The loop stops on teardown, once every [`ScreenHandle`] is dropped, or once
//! the host drops the event receiver; the last two tear the screen down. The
//! player subscription and in-flight jobs only hold weak senders, so they
//! never keep a finished screen alive.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tracing::debug;

use crate::error::{Result, ScrubberError};
use crate::generator::GenerationJob;
use crate::gesture::GestureEvent;
use crate::player::{PlaybackEngine, PlayerEvent};
use crate::screen::{ScreenEvent, ScreenMessage, ScrubberScreen};
use crate::thumbnail::ThumbnailExtractor;

/// Sender side of a running screen. Cheap to clone and usable from any thread.
#[derive(Debug, Clone)]
pub struct ScreenHandle {
    messages: UnboundedSender<ScreenMessage>,
}

impl ScreenHandle {
    pub fn post(&self, message: ScreenMessage) -> Result<()> {
        self.messages
            .send(message)
            .map_err(|_| ScrubberError::ScreenClosed)
    }

    pub fn post_gesture(&self, event: GestureEvent) -> Result<()> {
        self.post(ScreenMessage::Gesture(event))
    }

    pub fn resize(&self, width: f64) -> Result<()> {
        self.post(ScreenMessage::Resized { width })
    }

    pub fn toggle_playback(&self) -> Result<()> {
        self.post(ScreenMessage::TogglePlayback)
    }

    pub fn teardown(&self) -> Result<()> {
        self.post(ScreenMessage::Teardown)
    }

    pub fn is_closed(&self) -> bool {
        self.messages.is_closed()
    }
}

/// Spawns `screen` on the current tokio runtime.
///
/// Generation jobs requested by the screen run with `extractor`.
pub fn spawn_screen<P, X>(
    mut screen: ScrubberScreen<P>,
    extractor: Arc<X>,
) -> (ScreenHandle, UnboundedReceiver<ScreenEvent>)
where
    P: PlaybackEngine + ?Sized + 'static,
    X: ThumbnailExtractor + ?Sized + 'static,
{
    let (message_tx, mut message_rx) = mpsc::unbounded_channel::<ScreenMessage>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ScreenEvent>();
    let loopback = message_tx.downgrade();

    let player_loopback = loopback.clone();
    let subscription = screen
        .player()
        .subscribe(Box::new(move |event: PlayerEvent| {
            if let Some(messages) = player_loopback.upgrade() {
                let _ = messages.send(ScreenMessage::Player(event));
            }
        }));

    tokio::spawn(async move {
        let media = screen.media().clone();
        let mut forwarding = dispatch(screen.start(), &event_tx, &loopback, &extractor);

        while forwarding && screen.is_alive() {
            let Some(message) = message_rx.recv().await else {
                debug!(media = %media, "all screen handles dropped");
                break;
            };
            forwarding = dispatch(screen.handle(message), &event_tx, &loopback, &extractor);
        }
        if !forwarding {
            debug!(media = %media, "host stopped listening for screen events");
        }
        if screen.is_alive() {
            let events = screen.handle(ScreenMessage::Teardown);
            dispatch(events, &event_tx, &loopback, &extractor);
        }

        subscription.dispose();
        message_rx.close();
        drop(message_rx);
        debug!(media = %media, "screen runtime stopped");
    });

    (
        ScreenHandle {
            messages: message_tx,
        },
        event_rx,
    )
}

/// Starts requested jobs and forwards every event. Returns `false` once the
/// host stopped listening.
fn dispatch<X>(
    events: Vec<ScreenEvent>,
    event_tx: &UnboundedSender<ScreenEvent>,
    loopback: &WeakUnboundedSender<ScreenMessage>,
    extractor: &Arc<X>,
) -> bool
where
    X: ThumbnailExtractor + ?Sized + 'static,
{
    for event in events {
        if let ScreenEvent::ThumbnailsRequested(job) = &event {
            spawn_job(job.clone(), loopback.clone(), Arc::clone(extractor));
        }
        if event_tx.send(event).is_err() {
            return false;
        }
    }
    true
}

fn spawn_job<X>(job: GenerationJob, loopback: WeakUnboundedSender<ScreenMessage>, extractor: Arc<X>)
where
    X: ThumbnailExtractor + ?Sized + 'static,
{
    tokio::spawn(async move {
        let outcome = job.run(extractor.as_ref()).await;
        let epoch = job.epoch();
        match loopback.upgrade() {
            Some(messages) => {
                let _ = messages.send(ScreenMessage::ThumbnailsGenerated { epoch, outcome });
            }
            None => debug!(epoch, "screen gone before thumbnails finished"),
        }
    });
}
