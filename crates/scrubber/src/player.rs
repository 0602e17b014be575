use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Notification emitted by a playback engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    /// Periodic playback clock update, in seconds.
    TimeUpdate { current_time: f64 },
    /// Load status changed; the duration may have become known.
    StatusChange,
    PlayingChange { is_playing: bool },
}

/// Callback registered with [`PlaybackEngine::subscribe`]. May be invoked from
/// any thread.
pub type PlayerListener = Box<dyn Fn(PlayerEvent) + Send + Sync>;

/// Video decode/playback transport consumed by the scrubber.
pub trait PlaybackEngine: Send + Sync {
    fn play(&self);

    fn pause(&self);

    fn current_time(&self) -> f64;

    /// Seeks the transport to `seconds`.
    fn set_current_time(&self, seconds: f64);

    /// Total length in seconds, `None` until the media is loaded.
    fn duration(&self) -> Option<f64>;

    fn is_playing(&self) -> bool;

    fn subscribe(&self, listener: PlayerListener) -> PlayerSubscription;
}

/// Disposable registration handle. Disposing, explicitly or by dropping,
/// unregisters the listener exactly once.
pub struct PlayerSubscription {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl PlayerSubscription {
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for PlayerSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl Debug for PlayerSubscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSubscription")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}

type SharedListener = Arc<dyn Fn(PlayerEvent) + Send + Sync>;

#[derive(Default)]
struct HubState {
    next_id: u64,
    listeners: Vec<(u64, SharedListener)>,
}

/// Listener registry for engine implementations.
///
/// Listeners are invoked outside the registry lock, so a listener may
/// subscribe or dispose without deadlocking.
#[derive(Clone, Default)]
pub struct PlayerEventHub {
    state: Arc<Mutex<HubState>>,
}

impl PlayerEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: PlayerListener) -> PlayerSubscription {
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push((id, Arc::from(listener)));
            id
        };

        let weak: Weak<Mutex<HubState>> = Arc::downgrade(&self.state);
        PlayerSubscription::new(move || {
            if let Some(state) = weak.upgrade() {
                lock(&state)
                    .listeners
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    pub fn emit(&self, event: PlayerEvent) {
        let listeners: Vec<SharedListener> = lock(&self.state)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }
}

impl Debug for PlayerEventHub {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerEventHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct ManualState {
    current_time: f64,
    duration: Option<f64>,
    playing: bool,
    seeks: Vec<f64>,
}

/// In-memory engine whose clock is driven by the host.
///
/// Useful for headless hosts and tests: the host sets the duration and
/// advances time, and every seek the scrubber issues is recorded.
#[derive(Debug, Default)]
pub struct ManualPlayer {
    state: Mutex<ManualState>,
    hub: PlayerEventHub,
}

impl ManualPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration: f64) -> Self {
        let player = Self::new();
        lock(&player.state).duration = Some(duration);
        player
    }

    /// Marks the media as loaded and emits `StatusChange`.
    pub fn load(&self, duration: f64) {
        lock(&self.state).duration = Some(duration);
        self.hub.emit(PlayerEvent::StatusChange);
    }

    /// Moves the playback clock and emits `TimeUpdate`.
    pub fn advance_to(&self, current_time: f64) {
        lock(&self.state).current_time = current_time;
        self.hub.emit(PlayerEvent::TimeUpdate { current_time });
    }

    /// Seeks issued through [`PlaybackEngine::set_current_time`], oldest first.
    pub fn seeks(&self) -> Vec<f64> {
        lock(&self.state).seeks.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }

    fn set_playing(&self, playing: bool) {
        let changed = {
            let mut state = lock(&self.state);
            let changed = state.playing != playing;
            state.playing = playing;
            changed
        };
        if changed {
            self.hub.emit(PlayerEvent::PlayingChange {
                is_playing: playing,
            });
        }
    }
}

impl PlaybackEngine for ManualPlayer {
    fn play(&self) {
        self.set_playing(true);
    }

    fn pause(&self) {
        self.set_playing(false);
    }

    fn current_time(&self) -> f64 {
        lock(&self.state).current_time
    }

    fn set_current_time(&self, seconds: f64) {
        {
            let mut state = lock(&self.state);
            state.current_time = seconds;
            state.seeks.push(seconds);
        }
        self.hub.emit(PlayerEvent::TimeUpdate {
            current_time: seconds,
        });
    }

    fn duration(&self) -> Option<f64> {
        lock(&self.state).duration
    }

    fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    fn subscribe(&self, listener: PlayerListener) -> PlayerSubscription {
        self.hub.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::{ManualPlayer, PlaybackEngine, PlayerEvent, PlayerEventHub, PlayerSubscription};

    #[test]
    fn emit_reaches_every_listener() {
        let hub = PlayerEventHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = {
            let seen = Arc::clone(&seen);
            hub.subscribe(Box::new(move |event| seen.lock().expect("lock").push((1, event))))
        };
        let second = {
            let seen = Arc::clone(&seen);
            hub.subscribe(Box::new(move |event| seen.lock().expect("lock").push((2, event))))
        };

        hub.emit(PlayerEvent::StatusChange);

        assert_eq!(
            *seen.lock().expect("lock"),
            vec![(1, PlayerEvent::StatusChange), (2, PlayerEvent::StatusChange)]
        );
        drop((first, second));
    }

    #[test]
    fn dispose_and_drop_both_unregister() {
        let hub = PlayerEventHub::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = |calls: &Arc<AtomicUsize>| {
            let calls = Arc::clone(calls);
            Box::new(move |_: PlayerEvent| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        let disposed = hub.subscribe(counting(&calls));
        let dropped = hub.subscribe(counting(&calls));
        assert_eq!(hub.listener_count(), 2);

        disposed.dispose();
        drop(dropped);
        hub.emit(PlayerEvent::PlayingChange { is_playing: true });

        assert_eq!(hub.listener_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscription_outliving_hub_disposes_quietly() {
        let hub = PlayerEventHub::new();
        let subscription = hub.subscribe(Box::new(|_| {}));
        drop(hub);

        subscription.dispose();
    }

    #[test]
    fn dispose_callback_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let subscription = {
            let calls = Arc::clone(&calls);
            PlayerSubscription::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        subscription.dispose();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn manual_player_records_seeks_and_toggles() {
        let player = ManualPlayer::with_duration(30.0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = player.subscribe(Box::new(move |event: PlayerEvent| {
            sink.lock().expect("lock").push(event);
        }));

        player.play();
        player.play();
        player.set_current_time(12.0);
        player.pause();

        assert_eq!(player.seeks(), vec![12.0]);
        assert_eq!(player.current_time(), 12.0);
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![
                PlayerEvent::PlayingChange { is_playing: true },
                PlayerEvent::TimeUpdate { current_time: 12.0 },
                PlayerEvent::PlayingChange { is_playing: false },
            ]
        );
    }
}
