//! Single-slot clip playback.
//!
//! [`PlaybackController`] keeps at most one [`PlaybackResource`] alive. Every
//! new request tears down the previous resource before a new one is acquired,
//! and every asynchronous notification coming back from a resource is checked
//! against the session generation it was registered for, so late callbacks
//! from a superseded session never touch the state of the current one.

mod external;
mod sink;

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::api::ApiClient;
use crate::config::{AppConfig, PlayerBackend};
use crate::Result;

pub use external::{ExternalPlayer, ExternalPlayerResource};
pub use sink::{ClipLoader, SinkPlayer, SinkResource};

/// Fired once when a resource finishes playing on its own.
pub type EndedObserver = Box<dyn FnOnce() + Send + 'static>;
/// Fired once when a resource fails after it has started.
pub type FailureObserver = Box<dyn FnOnce(String) + Send + 'static>;

/// A single audio output unit bound to one source locator.
///
/// `start` resolves or rejects exactly once. Observers fire at most once per
/// event type and are discarded by `detach_source`.
#[async_trait]
pub trait PlaybackResource: Send + Sync {
    async fn start(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn detach_source(&self) -> Result<()>;
    fn on_ended(&self, observer: EndedObserver);
    fn on_failure(&self, observer: FailureObserver);
}

/// Produces playback resources for source locators (URLs or paths).
pub trait ResourceProvider: Send + Sync {
    fn acquire(&self, locator: &str) -> Result<Arc<dyn PlaybackResource>>;
}

impl ResourceProvider for Box<dyn ResourceProvider> {
    fn acquire(&self, locator: &str) -> Result<Arc<dyn PlaybackResource>> {
        (**self).acquire(locator)
    }
}

/// Builds the provider selected by `player.backend`.
pub fn provider_from_config(config: &AppConfig) -> Result<Box<dyn ResourceProvider>> {
    match config.player.backend {
        PlayerBackend::Sink => {
            let api = ApiClient::new(&config.api)?;
            Ok(Box::new(SinkPlayer::open(api.http().clone())?))
        }
        PlayerBackend::Command => Ok(Box::new(ExternalPlayer::from_config(&config.player)?)),
    }
}

/// Snapshot of the controller state exposed to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub active_key: Option<String>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

struct Session {
    generation: u64,
    key: String,
    resource: Arc<dyn PlaybackResource>,
}

#[derive(Default)]
struct SlotState {
    session: Option<Session>,
    is_loading: bool,
    last_error: Option<String>,
    next_generation: u64,
}

impl SlotState {
    fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            active_key: self.session.as_ref().map(|session| session.key.clone()),
            is_loading: self.is_loading,
            last_error: self.last_error.clone(),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session
            .as_ref()
            .map(|session| session.generation == generation)
            .unwrap_or(false)
    }

    fn take_session(&mut self) -> Option<Session> {
        self.is_loading = false;
        self.session.take()
    }
}

/// State shared between the controller and the observers it registers.
/// Observers only hold a [`Weak`] reference, so nothing keeps the slot alive
/// once the controller is dropped.
struct Slot {
    state: Mutex<SlotState>,
    status_tx: watch::Sender<PlaybackStatus>,
}

impl Slot {
    fn new() -> Self {
        let (status_tx, _) = watch::channel(PlaybackStatus::default());
        Self {
            state: Mutex::new(SlotState::default()),
            status_tx,
        }
    }

    /// Runs `f` under the state lock and publishes the resulting status. The
    /// lock is released before returning; resources are never called with it
    /// held.
    fn update<T>(&self, f: impl FnOnce(&mut SlotState) -> T) -> T {
        let mut state = self.state.lock();
        let out = f(&mut state);
        self.status_tx.send_replace(state.status());
        out
    }

    /// Installs a new session. A session that another request installed
    /// after our `stop()` is displaced and released here, so the slot never
    /// loses track of a live resource.
    fn begin(&self, key: &str, resource: Arc<dyn PlaybackResource>) -> u64 {
        let (generation, displaced) = self.update(|state| {
            state.next_generation += 1;
            let generation = state.next_generation;
            let displaced = state.session.replace(Session {
                generation,
                key: key.to_string(),
                resource,
            });
            state.is_loading = true;
            state.last_error = None;
            (generation, displaced)
        });

        if let Some(session) = displaced {
            tracing::debug!(key = %session.key, "releasing session displaced by a concurrent request");
            release(session);
        }
        generation
    }

    /// Tears down the current session, whatever it is.
    fn stop(&self) {
        let session = {
            let mut state = self.state.lock();
            if state.session.is_none() {
                return;
            }
            let session = state.take_session();
            self.status_tx.send_replace(state.status());
            session
        };

        if let Some(session) = session {
            release(session);
        }
    }

    fn confirm_start(&self, generation: u64) -> bool {
        self.update(|state| {
            let current = state.is_current(generation);
            if current {
                state.is_loading = false;
            }
            current
        })
    }

    /// Ends the session registered under `generation`, if it is still the
    /// current one, optionally recording why.
    fn finish(&self, generation: u64, error: Option<String>) {
        let session = self.update(|state| {
            if !state.is_current(generation) {
                return None;
            }
            if error.is_some() {
                state.last_error = error;
            }
            state.take_session()
        });

        match session {
            Some(session) => release(session),
            None => tracing::debug!(generation, "ignoring notification from superseded session"),
        }
    }

    fn ended_observer(slot: Weak<Slot>, generation: u64) -> EndedObserver {
        Box::new(move || {
            if let Some(slot) = slot.upgrade() {
                tracing::debug!(generation, "playback ended");
                slot.finish(generation, None);
            }
        })
    }

    fn failure_observer(slot: Weak<Slot>, generation: u64) -> FailureObserver {
        Box::new(move |message| {
            if let Some(slot) = slot.upgrade() {
                tracing::warn!(generation, %message, "playback failed");
                slot.finish(generation, Some(message));
            }
        })
    }
}

/// Pauses and detaches a resource. Failures are logged and swallowed so that
/// teardown always completes.
fn release(session: Session) {
    if let Err(err) = session.resource.pause() {
        tracing::warn!(key = %session.key, error = %err, "error pausing playback resource");
    }
    if let Err(err) = session.resource.detach_source() {
        tracing::warn!(key = %session.key, error = %err, "error detaching playback source");
    }
}

/// Mediates playback so that at most one clip plays at a time.
///
/// Dropping the controller stops whatever is playing.
pub struct PlaybackController<P> {
    provider: P,
    slot: Arc<Slot>,
}

impl<P: ResourceProvider> PlaybackController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            slot: Arc::new(Slot::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Starts playing `locator` under `key`, or stops if `key` is already the
    /// active item.
    ///
    /// Returns whether `key` is playing once the request has settled: `false`
    /// for invalid input, a stop, a failed start, or a start that was
    /// superseded by another request while it was pending.
    pub async fn toggle_play(&self, key: &str, locator: &str) -> bool {
        if key.is_empty() || locator.is_empty() {
            tracing::debug!(key, locator, "ignoring playback request with missing key or source");
            return false;
        }

        if self.is_playing(key) {
            tracing::debug!(key, "toggling off active clip");
            self.stop();
            return false;
        }

        self.stop();

        let resource = match self.provider.acquire(locator) {
            Ok(resource) => resource,
            Err(err) => {
                tracing::warn!(key, locator, error = %err, "could not acquire playback resource");
                self.slot.update(|state| state.last_error = Some(err.to_string()));
                return false;
            }
        };

        let generation = self.slot.begin(key, resource.clone());
        resource.on_ended(Slot::ended_observer(Arc::downgrade(&self.slot), generation));
        resource.on_failure(Slot::failure_observer(Arc::downgrade(&self.slot), generation));

        tracing::info!(key, locator, generation, "starting playback");
        match resource.start().await {
            Ok(()) => {
                let current = self.slot.confirm_start(generation);
                if !current {
                    tracing::debug!(key, generation, "discarding stale start confirmation");
                }
                current
            }
            Err(err) => {
                self.slot.finish(generation, Some(err.to_string()));
                false
            }
        }
    }

    /// Stops playback. Safe to call when nothing is playing.
    pub fn stop(&self) {
        self.slot.stop();
    }

    pub fn is_playing(&self, key: &str) -> bool {
        self.slot
            .state
            .lock()
            .session
            .as_ref()
            .map(|session| session.key == key)
            .unwrap_or(false)
    }

    pub fn clear_error(&self) {
        self.slot.update(|state| state.last_error = None);
    }

    pub fn status(&self) -> PlaybackStatus {
        self.slot.state.lock().status()
    }

    pub fn active_key(&self) -> Option<String> {
        self.status().active_key
    }

    pub fn is_loading(&self) -> bool {
        self.slot.state.lock().is_loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.slot.state.lock().last_error.clone()
    }

    /// Receives a fresh [`PlaybackStatus`] after every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.slot.status_tx.subscribe()
    }
}

impl<P> Drop for PlaybackController<P> {
    fn drop(&mut self) {
        self.slot.stop();
    }
}

impl<P> std::fmt::Debug for PlaybackController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("status", &self.slot.state.lock().status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    use futures::FutureExt;
    use tokio::sync::oneshot;

    use super::*;
    use crate::DashError;

    enum Start {
        Ok,
        Fail(&'static str),
        Gated(oneshot::Receiver<std::result::Result<(), String>>),
    }

    #[derive(Default)]
    struct Tracker {
        live: AtomicUsize,
        max_live: AtomicUsize,
    }

    struct FakeResource {
        locator: String,
        start: Mutex<Option<Start>>,
        ended: Mutex<Option<EndedObserver>>,
        failure: Mutex<Option<FailureObserver>>,
        paused: Mutex<bool>,
        detached: Mutex<bool>,
        fail_release: bool,
        tracker: Arc<Tracker>,
    }

    impl FakeResource {
        fn fire_ended(&self) {
            let observer = self.ended.lock().take();
            if let Some(observer) = observer {
                observer();
            }
        }

        fn fire_failure(&self, message: &str) {
            let observer = self.failure.lock().take();
            if let Some(observer) = observer {
                observer(message.to_string());
            }
        }

        fn torn_down(&self) -> bool {
            *self.paused.lock() && *self.detached.lock()
        }
    }

    #[async_trait]
    impl PlaybackResource for FakeResource {
        async fn start(&self) -> Result<()> {
            let start = self.start.lock().take().unwrap_or(Start::Ok);
            match start {
                Start::Ok => Ok(()),
                Start::Fail(message) => Err(DashError::playback(message)),
                Start::Gated(gate) => match gate.await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(message)) => Err(DashError::playback(message)),
                    Err(_) => Err(DashError::playback("gate dropped")),
                },
            }
        }

        fn pause(&self) -> Result<()> {
            *self.paused.lock() = true;
            if self.fail_release {
                return Err(DashError::msg("pause exploded"));
            }
            Ok(())
        }

        fn detach_source(&self) -> Result<()> {
            let mut detached = self.detached.lock();
            if !*detached {
                *detached = true;
                self.tracker.live.fetch_sub(1, Ordering::SeqCst);
            }
            self.ended.lock().take();
            self.failure.lock().take();
            if self.fail_release {
                return Err(DashError::msg("detach exploded"));
            }
            Ok(())
        }

        fn on_ended(&self, observer: EndedObserver) {
            *self.ended.lock() = Some(observer);
        }

        fn on_failure(&self, observer: FailureObserver) {
            *self.failure.lock() = Some(observer);
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        scripts: Mutex<HashMap<String, Start>>,
        unavailable: Mutex<Vec<String>>,
        fail_release: bool,
        acquired: Mutex<Vec<Arc<FakeResource>>>,
        tracker: Arc<Tracker>,
        acquire_barrier: Option<Barrier>,
    }

    impl FakeProvider {
        fn script(&self, locator: &str, start: Start) {
            self.scripts.lock().insert(locator.to_string(), start);
        }

        fn resource(&self, index: usize) -> Arc<FakeResource> {
            self.acquired.lock()[index].clone()
        }

        fn acquired_count(&self) -> usize {
            self.acquired.lock().len()
        }
    }

    impl ResourceProvider for FakeProvider {
        fn acquire(&self, locator: &str) -> Result<Arc<dyn PlaybackResource>> {
            if self.unavailable.lock().iter().any(|l| l == locator) {
                return Err(DashError::playback(format!("no decoder for {locator}")));
            }

            if let Some(barrier) = &self.acquire_barrier {
                barrier.wait();
            }

            let live = self.tracker.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.tracker.max_live.fetch_max(live, Ordering::SeqCst);

            let resource = Arc::new(FakeResource {
                locator: locator.to_string(),
                start: Mutex::new(self.scripts.lock().remove(locator)),
                ended: Mutex::new(None),
                failure: Mutex::new(None),
                paused: Mutex::new(false),
                detached: Mutex::new(false),
                fail_release: self.fail_release,
                tracker: self.tracker.clone(),
            });
            self.acquired.lock().push(resource.clone());
            Ok(resource)
        }
    }

    fn controller() -> PlaybackController<FakeProvider> {
        PlaybackController::new(FakeProvider::default())
    }

    #[tokio::test]
    async fn plays_and_reports_status() {
        let player = controller();

        assert!(player.toggle_play("robin", "robin.mp3").await);
        assert!(player.is_playing("robin"));
        assert_eq!(
            player.status(),
            PlaybackStatus {
                active_key: Some("robin".to_string()),
                is_loading: false,
                last_error: None,
            }
        );
        assert_eq!(player.provider().resource(0).locator, "robin.mp3");
    }

    #[tokio::test]
    async fn rejects_missing_key_or_source() {
        let player = controller();

        assert!(!player.toggle_play("", "robin.mp3").await);
        assert!(!player.toggle_play("robin", "").await);
        assert_eq!(player.status(), PlaybackStatus::default());
        assert_eq!(player.provider().acquired_count(), 0);
    }

    #[tokio::test]
    async fn toggling_the_same_key_stops_it() {
        let player = controller();

        assert!(player.toggle_play("robin", "robin.mp3").await);
        assert!(!player.toggle_play("robin", "robin.mp3").await);

        assert!(!player.is_playing("robin"));
        assert!(player.provider().resource(0).torn_down());
        assert_eq!(player.provider().acquired_count(), 1);
    }

    #[tokio::test]
    async fn switching_keys_releases_the_previous_clip_first() {
        let player = controller();

        assert!(player.toggle_play("robin", "robin.mp3").await);
        assert!(player.toggle_play("wren", "wren.mp3").await);

        assert!(!player.is_playing("robin"));
        assert!(player.is_playing("wren"));
        assert!(player.provider().resource(0).torn_down());
        assert!(!player.provider().resource(1).torn_down());
        assert_eq!(player.provider().tracker.max_live.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn never_holds_two_live_resources() {
        let player = controller();
        player.provider().script("c.mp3", Start::Fail("bad frame"));

        let requests = [
            ("a", "a.mp3"),
            ("b", "b.mp3"),
            ("b", "b.mp3"),
            ("c", "c.mp3"),
            ("a", "a.mp3"),
            ("d", "d.mp3"),
        ];
        for (key, locator) in requests {
            player.toggle_play(key, locator).await;
            let live = player.provider().tracker.live.load(Ordering::SeqCst);
            assert!(live <= 1, "{live} resources alive after toggling {key}");
        }
        player.stop();

        let tracker = &player.provider().tracker;
        assert_eq!(tracker.max_live.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_on_idle_controller_is_a_no_op() {
        let player = controller();
        let mut status = player.subscribe();

        player.stop();
        player.stop();

        assert_eq!(player.status(), PlaybackStatus::default());
        assert!(!status.has_changed().unwrap());
    }

    #[tokio::test]
    async fn natural_completion_returns_to_idle() {
        let player = controller();
        assert!(player.toggle_play("robin", "robin.mp3").await);

        player.provider().resource(0).fire_ended();

        assert!(!player.is_playing("robin"));
        assert_eq!(player.active_key(), None);
        assert!(!player.is_loading());
        assert!(player.provider().resource(0).torn_down());
    }

    #[tokio::test]
    async fn start_failure_is_recorded() {
        let player = controller();
        player.provider().script("bad.mp3", Start::Fail("decode error"));

        assert!(!player.toggle_play("jay", "bad.mp3").await);

        assert_eq!(player.last_error().as_deref(), Some("decode error"));
        assert!(!player.is_playing("jay"));
        assert!(!player.is_loading());
        assert!(player.provider().resource(0).torn_down());
    }

    #[tokio::test]
    async fn acquisition_failure_leaves_controller_idle() {
        let player = controller();
        player
            .provider()
            .unavailable
            .lock()
            .push("missing.mp3".to_string());

        assert!(!player.toggle_play("owl", "missing.mp3").await);
        assert_eq!(player.active_key(), None);
        assert_eq!(player.last_error().as_deref(), Some("no decoder for missing.mp3"));
    }

    #[tokio::test]
    async fn runtime_failure_sets_error_and_stops() {
        let player = controller();
        assert!(player.toggle_play("robin", "robin.mp3").await);

        player.provider().resource(0).fire_failure("stream dropped");

        assert_eq!(player.last_error().as_deref(), Some("stream dropped"));
        assert_eq!(player.active_key(), None);

        player.clear_error();
        assert_eq!(player.last_error(), None);
    }

    #[tokio::test]
    async fn next_start_clears_previous_error() {
        let player = controller();
        player.provider().script("bad.mp3", Start::Fail("decode error"));

        assert!(!player.toggle_play("jay", "bad.mp3").await);
        assert!(player.toggle_play("robin", "robin.mp3").await);
        assert_eq!(player.last_error(), None);
    }

    #[tokio::test]
    async fn loading_until_start_confirms() {
        let player = controller();
        let (gate_tx, gate) = oneshot::channel();
        player.provider().script("robin.mp3", Start::Gated(gate));

        let (started, observed) = tokio::join!(player.toggle_play("robin", "robin.mp3"), async {
            let observed = player.status();
            gate_tx.send(Ok(())).unwrap();
            observed
        });

        assert!(observed.is_loading);
        assert_eq!(observed.active_key.as_deref(), Some("robin"));
        assert!(started);
        assert!(!player.is_loading());
    }

    #[tokio::test]
    async fn stale_start_failure_does_not_touch_new_session() {
        let player = controller();
        let (gate_tx, gate) = oneshot::channel();
        player.provider().script("robin.mp3", Start::Gated(gate));

        let (first, second) = tokio::join!(player.toggle_play("robin", "robin.mp3"), async {
            let second = player.toggle_play("wren", "wren.mp3").await;
            gate_tx.send(Err("interrupted".to_string())).unwrap();
            second
        });

        assert!(!first);
        assert!(second);
        assert_eq!(
            player.status(),
            PlaybackStatus {
                active_key: Some("wren".to_string()),
                is_loading: false,
                last_error: None,
            }
        );
        assert!(player.provider().resource(0).torn_down());
    }

    #[tokio::test]
    async fn stale_start_confirmation_is_discarded() {
        let player = controller();
        let (robin_tx, robin_gate) = oneshot::channel();
        let (wren_tx, wren_gate) = oneshot::channel();
        player.provider().script("robin.mp3", Start::Gated(robin_gate));
        player.provider().script("wren.mp3", Start::Gated(wren_gate));

        let (first, second) = tokio::join!(player.toggle_play("robin", "robin.mp3"), async {
            let pending = player.toggle_play("wren", "wren.mp3");
            tokio::pin!(pending);
            // Drive the wren request up to its own pending start, then let
            // the superseded robin start confirm.
            assert!(pending.as_mut().now_or_never().is_none());
            robin_tx.send(Ok(())).unwrap();
            tokio::task::yield_now().await;
            assert!(player.is_loading(), "stale confirmation cleared loading flag");
            wren_tx.send(Ok(())).unwrap();
            pending.await
        });

        assert!(!first, "superseded start must not report playing");
        assert!(second);
        assert!(player.is_playing("wren"));
        assert!(!player.is_loading());
    }

    #[tokio::test]
    async fn restarting_same_key_ignores_old_session_callbacks() {
        let player = controller();
        let (gate_tx, gate) = oneshot::channel();
        player.provider().script("robin.mp3", Start::Gated(gate));

        let (first, second) = tokio::join!(player.toggle_play("robin", "robin.mp3"), async {
            player.stop();
            let second = player.toggle_play("robin", "robin-2.mp3").await;
            gate_tx.send(Err("aborted".to_string())).unwrap();
            second
        });

        assert!(!first);
        assert!(second);
        assert!(player.is_playing("robin"));
        assert_eq!(player.last_error(), None);
    }

    #[tokio::test]
    async fn late_observers_from_superseded_sessions_are_ignored() {
        let player = controller();
        assert!(player.toggle_play("robin", "robin.mp3").await);
        let old = player.provider().resource(0);
        let ended = old.ended.lock().take().unwrap();
        let failure = old.failure.lock().take().unwrap();

        assert!(player.toggle_play("wren", "wren.mp3").await);
        ended();
        failure("late failure".to_string());

        assert!(player.is_playing("wren"));
        assert_eq!(player.last_error(), None);
        assert!(!player.provider().resource(1).torn_down());
    }

    #[tokio::test]
    async fn release_failures_are_swallowed() {
        let player = PlaybackController::new(FakeProvider {
            fail_release: true,
            ..FakeProvider::default()
        });
        assert!(player.toggle_play("robin", "robin.mp3").await);

        player.stop();

        assert_eq!(player.status(), PlaybackStatus::default());
        assert!(player.provider().resource(0).torn_down());
    }

    #[tokio::test]
    async fn dropping_the_controller_stops_playback() {
        let player = controller();
        assert!(player.toggle_play("robin", "robin.mp3").await);
        let resource = player.provider().resource(0);

        drop(player);

        assert!(resource.torn_down());
    }

    #[tokio::test]
    async fn subscribers_see_every_transition() {
        let player = controller();
        let mut status = player.subscribe();

        assert!(player.toggle_play("robin", "robin.mp3").await);
        assert!(status.has_changed().unwrap());
        assert_eq!(status.borrow_and_update().active_key.as_deref(), Some("robin"));

        player.provider().resource(0).fire_ended();
        assert!(status.has_changed().unwrap());
        assert_eq!(*status.borrow_and_update(), PlaybackStatus::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_toggles_release_every_displaced_resource() {
        let player = Arc::new(PlaybackController::new(FakeProvider {
            acquire_barrier: Some(Barrier::new(2)),
            ..FakeProvider::default()
        }));

        // Both requests pass their stop() and acquire before either begins.
        let robin = tokio::spawn({
            let player = player.clone();
            async move { player.toggle_play("robin", "robin.mp3").await }
        });
        let wren = tokio::spawn({
            let player = player.clone();
            async move { player.toggle_play("wren", "wren.mp3").await }
        });
        robin.await.unwrap();
        wren.await.unwrap();

        let tracker = &player.provider().tracker;
        assert_eq!(tracker.live.load(Ordering::SeqCst), 1);
        assert!(player.is_playing("robin") ^ player.is_playing("wren"));

        player.stop();
        assert_eq!(tracker.live.load(Ordering::SeqCst), 0);
        assert!(player.provider().resource(0).torn_down());
        assert!(player.provider().resource(1).torn_down());
    }
}
