//! Session lifecycle and debounced autosave.
//!
//! [`DataSync`] owns at most one session at a time. A session is a
//! [`DashboardStore`] behind a `tokio::sync::RwLock` plus an autosave task
//! that receives [`Signal`]s over an mpsc channel:
//!
//! ```text
//!   mutate() ──Changed──▶ ┌──────────────┐ ──PUT /api/data──▶ server
//!   on_hidden() ─Flush──▶ │ autosave task│
//!   flush() ──Flush+ack─▶ │ (one PUT at  │ ──SyncEvent──▶ broadcast
//!   logout() ─Shutdown──▶ │  a time)     │
//!                         └──────────────┘
//! ```
//!
//! The task performs saves inline, so at most one PUT is in flight per
//! session. Each session keeps its own last-saved revision; a revision that
//! was already saved is never sent again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use studydash_core::{DashboardDocument, Error, Result, User};

use crate::config::SyncConfig;
use crate::seed::{demo_document, needs_seed};
use crate::store::DashboardStore;
use crate::transport::DashboardApi;

/// Event emitted by the sync engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A user's document was installed.
    Loaded { user_id: Uuid, seeded: bool },
    /// A load finished after a newer session had started; its result was
    /// dropped.
    StaleLoadDiscarded { user_id: Uuid },
    /// A revision reached the server.
    Saved { user_id: Uuid, revision: u64 },
    /// A save failed. `attempt` counts tries since the last success.
    SaveFailed {
        user_id: Uuid,
        attempt: u32,
        error: String,
    },
    /// The session ended and state went back to empty defaults.
    Reset,
}

/// Observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No session; reads see empty defaults.
    Idle,
    Loading,
    /// Everything up to the current revision is saved.
    Clean,
    /// Unsaved changes exist.
    Dirty,
    Saving,
}

/// Result of [`DataSync::switch_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { seeded: bool },
    /// A newer `switch_user` or `logout` superseded this load.
    Stale,
}

enum Signal {
    Changed,
    /// Save now. The ack, when present, receives the save result.
    Flush(Option<oneshot::Sender<Result<()>>>),
    /// Save anything pending, then stop.
    Shutdown(oneshot::Sender<Result<()>>),
}

struct Session {
    user_id: Uuid,
    store: Arc<RwLock<DashboardStore>>,
    signals: mpsc::UnboundedSender<Signal>,
    task: JoinHandle<()>,
}

/// Client-side data layer: load on sign-in, seed the demo account, autosave
/// every change.
pub struct DataSync {
    api: Arc<dyn DashboardApi>,
    config: SyncConfig,
    generation: AtomicU64,
    session: Mutex<Option<Session>>,
    event_tx: broadcast::Sender<SyncEvent>,
    state_tx: Arc<watch::Sender<SyncState>>,
}

impl DataSync {
    pub fn new(api: Arc<dyn DashboardApi>, config: SyncConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (state_tx, _) = watch::channel(SyncState::Idle);
        Self {
            api,
            config,
            generation: AtomicU64::new(0),
            session: Mutex::new(None),
            event_tx,
            state_tx: Arc::new(state_tx),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Get a receiver for sync events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    pub fn state(&self) -> SyncState {
        *self.state_tx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SyncState> {
        self.state_tx.subscribe()
    }

    /// User of the active session, if any.
    pub fn current_user(&self) -> Option<Uuid> {
        self.session().as_ref().map(|s| s.user_id)
    }

    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    /// Start a session for `user`: flush and stop the previous session, load
    /// the user's document, seed it if this is the demo account, then install
    /// it and start autosaving.
    ///
    /// A load that completes after a newer `switch_user` or `logout` is
    /// discarded and reported as [`LoadOutcome::Stale`].
    #[instrument(skip(self, user), fields(subsystem = "sync", op = "switch_user", user_id = %user.id))]
    pub async fn switch_user(&self, user: &User) -> Result<LoadOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.close_session().await;
        self.state_tx.send_replace(SyncState::Loading);

        let doc = match self.api.load().await {
            Ok(doc) => doc,
            Err(e) => {
                if self.is_current(generation) {
                    self.state_tx.send_replace(SyncState::Idle);
                }
                warn!(error = %e, "Dashboard load failed");
                return Err(e);
            }
        };
        if !self.is_current(generation) {
            return Ok(self.discard_stale(user.id));
        }

        let mut store = DashboardStore::from_document(doc).with_scale(self.config.grade_scale);
        let mut last_saved = store.revision();

        let seeded = needs_seed(store.document(), &user.email, &self.config.demo_email);
        if seeded {
            store.replace_document(demo_document(Utc::now().date_naive()));
            match self.api.save(&store.to_document()).await {
                Ok(()) => {
                    last_saved = store.revision();
                    self.emit(SyncEvent::Saved {
                        user_id: user.id,
                        revision: last_saved,
                    });
                }
                // Left dirty; autosave picks it up.
                Err(e) => warn!(error = %e, "Saving demo fixture failed"),
            }
        }

        let dirty = store.revision() != last_saved;
        let signals = {
            let mut slot = self.session();
            if !self.is_current(generation) {
                None
            } else {
                let session = self.start_session(user.id, store, last_saved);
                let signals = session.signals.clone();
                *slot = Some(session);
                Some(signals)
            }
        };
        let Some(signals) = signals else {
            return Ok(self.discard_stale(user.id));
        };

        if dirty {
            self.state_tx.send_replace(SyncState::Dirty);
            let _ = signals.send(Signal::Changed);
        } else {
            self.state_tx.send_replace(SyncState::Clean);
        }

        info!(seeded, "Session loaded");
        self.emit(SyncEvent::Loaded {
            user_id: user.id,
            seeded,
        });
        Ok(LoadOutcome::Loaded { seeded })
    }

    fn discard_stale(&self, user_id: Uuid) -> LoadOutcome {
        debug!(user_id = %user_id, "Discarding stale load");
        self.emit(SyncEvent::StaleLoadDiscarded { user_id });
        LoadOutcome::Stale
    }

    fn start_session(&self, user_id: Uuid, store: DashboardStore, last_saved: u64) -> Session {
        let store = Arc::new(RwLock::new(store));
        let (signals, signal_rx) = mpsc::unbounded_channel();
        let autosave = Autosave {
            user_id,
            api: self.api.clone(),
            store: store.clone(),
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            state_tx: self.state_tx.clone(),
            last_saved,
            failures: 0,
        };
        let task = tokio::spawn(autosave.run(signal_rx));
        Session {
            user_id,
            store,
            signals,
            task,
        }
    }

    /// Stop the active session after a final save. Returns that save's
    /// result, or `None` when there was no session.
    async fn close_session(&self) -> Option<Result<()>> {
        let session = self.session().take()?;
        let (ack_tx, ack_rx) = oneshot::channel();
        let result = if session.signals.send(Signal::Shutdown(ack_tx)).is_ok() {
            ack_rx
                .await
                .unwrap_or_else(|_| Err(Error::Internal("Autosave task stopped".into())))
        } else {
            Err(Error::Internal("Autosave task stopped".into()))
        };
        if let Err(e) = session.task.await {
            warn!(subsystem = "sync", error = %e, "Autosave task panicked");
        }
        self.state_tx.send_replace(SyncState::Idle);
        self.emit(SyncEvent::Reset);
        debug!(subsystem = "sync", user_id = %session.user_id, "Session closed");
        Some(result)
    }

    /// Flush, then end the session. Any in-flight load is discarded.
    ///
    /// Returns the result of the final save; the session ends either way.
    pub async fn logout(&self) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        match self.close_session().await {
            Some(result) => result,
            None => {
                self.state_tx.send_replace(SyncState::Idle);
                self.emit(SyncEvent::Reset);
                Ok(())
            }
        }
    }

    /// Apply `f` to the session's store. When the store's revision moves,
    /// the autosave debounce restarts.
    ///
    /// Fails with [`Error::Unauthorized`] when no session is active.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut DashboardStore) -> Result<T> + Send,
    {
        let (store, signals) = {
            let slot = self.session();
            let session = slot
                .as_ref()
                .ok_or_else(|| Error::Unauthorized("No active session".to_string()))?;
            (session.store.clone(), session.signals.clone())
        };

        let mut guard = store.write().await;
        let before = guard.revision();
        let result = f(&mut *guard);
        let changed = guard.revision() != before;
        drop(guard);

        if changed {
            self.state_tx.send_replace(SyncState::Dirty);
            if signals.send(Signal::Changed).is_err() {
                debug!(subsystem = "sync", "Mutation after session closed");
            }
        }
        result
    }

    /// Read from the session's store; with no session `f` sees an empty one.
    pub async fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&DashboardStore) -> T,
    {
        let store = self.session().as_ref().map(|s| s.store.clone());
        match store {
            Some(store) => f(&*store.read().await),
            None => f(&DashboardStore::new().with_scale(self.config.grade_scale)),
        }
    }

    /// Current document, or the empty default when idle.
    pub async fn snapshot(&self) -> DashboardDocument {
        self.read(|store| store.to_document()).await
    }

    fn signals(&self) -> Option<mpsc::UnboundedSender<Signal>> {
        self.session().as_ref().map(|s| s.signals.clone())
    }

    /// Save pending changes now and wait for the result.
    pub async fn flush(&self) -> Result<()> {
        let Some(signals) = self.signals() else {
            return Ok(());
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        signals
            .send(Signal::Flush(Some(ack_tx)))
            .map_err(|_| Error::Internal("Autosave task stopped".into()))?;
        ack_rx
            .await
            .map_err(|_| Error::Internal("Autosave task stopped".into()))?
    }

    /// The page is going away: start a save of pending changes without
    /// waiting for it.
    pub fn on_hidden(&self) {
        if let Some(signals) = self.signals() {
            let _ = signals.send(Signal::Flush(None));
        }
    }
}

/// Per-session autosave loop.
struct Autosave {
    user_id: Uuid,
    api: Arc<dyn DashboardApi>,
    store: Arc<RwLock<DashboardStore>>,
    config: SyncConfig,
    event_tx: broadcast::Sender<SyncEvent>,
    state_tx: Arc<watch::Sender<SyncState>>,
    last_saved: u64,
    /// Consecutive failed saves.
    failures: u32,
}

impl Autosave {
    async fn run(mut self, mut signals: mpsc::UnboundedReceiver<Signal>) {
        let mut deadline: Option<Instant> = None;
        debug!(subsystem = "sync", component = "autosave", user_id = %self.user_id, "Autosave started");

        loop {
            let tick = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                signal = signals.recv() => match signal {
                    Some(Signal::Changed) => {
                        self.failures = 0;
                        deadline = Some(Instant::now() + self.config.debounce);
                    }
                    Some(Signal::Flush(ack)) => {
                        let result = self.save().await;
                        deadline = self.schedule_retry(&result);
                        if let Some(ack) = ack {
                            let _ = ack.send(result);
                        }
                    }
                    Some(Signal::Shutdown(ack)) => {
                        let _ = ack.send(self.save().await);
                        break;
                    }
                    // Engine dropped: last chance to save.
                    None => {
                        let _ = self.save().await;
                        break;
                    }
                },
                _ = tick => {
                    let result = self.save().await;
                    deadline = self.schedule_retry(&result);
                }
            }
        }

        debug!(subsystem = "sync", component = "autosave", user_id = %self.user_id, "Autosave stopped");
    }

    /// Next deadline after a save attempt: none on success, a backoff delay
    /// while retries remain, none once they are exhausted.
    fn schedule_retry(&mut self, result: &Result<()>) -> Option<Instant> {
        match result {
            Ok(()) => {
                self.failures = 0;
                None
            }
            Err(_) if self.failures <= self.config.max_retries => {
                let delay = self.config.retry_delay(self.failures);
                debug!(
                    subsystem = "sync",
                    component = "autosave",
                    user_id = %self.user_id,
                    attempt = self.failures,
                    delay_ms = delay.as_millis() as u64,
                    "Retry scheduled"
                );
                Some(Instant::now() + delay)
            }
            Err(_) => {
                warn!(
                    subsystem = "sync",
                    component = "autosave",
                    user_id = %self.user_id,
                    attempt = self.failures,
                    "Giving up on save until the next change"
                );
                None
            }
        }
    }

    /// Save the current revision unless it is already saved.
    async fn save(&mut self) -> Result<()> {
        let (revision, doc) = {
            let store = self.store.read().await;
            let revision = store.revision();
            if revision == self.last_saved {
                self.state_tx.send_replace(SyncState::Clean);
                return Ok(());
            }
            (revision, store.to_document())
        };

        self.state_tx.send_replace(SyncState::Saving);
        let attempt = self.failures + 1;
        let start = std::time::Instant::now();

        match self.api.save(&doc).await {
            Ok(()) => {
                self.last_saved = revision;
                let current = self.store.read().await.revision();
                self.state_tx.send_replace(if current == revision {
                    SyncState::Clean
                } else {
                    SyncState::Dirty
                });
                info!(
                    subsystem = "sync",
                    component = "autosave",
                    op = "save",
                    user_id = %self.user_id,
                    revision,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Dashboard saved"
                );
                let _ = self.event_tx.send(SyncEvent::Saved {
                    user_id: self.user_id,
                    revision,
                });
                Ok(())
            }
            Err(e) => {
                self.failures = attempt;
                self.state_tx.send_replace(SyncState::Dirty);
                warn!(
                    subsystem = "sync",
                    component = "autosave",
                    op = "save",
                    user_id = %self.user_id,
                    revision,
                    attempt,
                    error = %e,
                    "Dashboard save failed"
                );
                let _ = self.event_tx.send(SyncEvent::SaveFailed {
                    user_id: self.user_id,
                    attempt,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::mock::MockDashboardApi;
    use crate::store::CourseInput;
    use studydash_core::defaults::DEMO_EMAIL;
    use studydash_core::{Day, TimetableSlot};

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Test Student".to_string(),
            student_id: None,
            department: "Not Specified".to_string(),
            avatar: Some("TS".to_string()),
            created_at: Utc::now(),
        }
    }

    fn engine(api: &Arc<MockDashboardApi>) -> DataSync {
        DataSync::new(api.clone(), SyncConfig::default())
    }

    async fn add_course(sync: &DataSync, name: &str) -> String {
        sync.mutate(|store| {
            store.add_course(CourseInput {
                name: name.to_string(),
                ..Default::default()
            })
        })
        .await
        .unwrap()
        .id
    }

    async fn wait_for<F>(events: &mut broadcast::Receiver<SyncEvent>, pred: F) -> SyncEvent
    where
        F: Fn(&SyncEvent) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(600), async {
            loop {
                match events.recv().await {
                    Ok(event) if pred(&event) => return event,
                    Ok(_) => continue,
                    Err(e) => panic!("event channel: {:?}", e),
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    fn is_saved(event: &SyncEvent) -> bool {
        matches!(event, SyncEvent::Saved { .. })
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutations_within_debounce_coalesce_into_one_save() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);
        let mut events = sync.events();
        sync.switch_user(&user("a@uni.edu")).await.unwrap();

        for i in 0..5 {
            add_course(&sync, &format!("Course {}", i)).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(api.save_count(), 0);
        assert_eq!(sync.state(), SyncState::Dirty);

        wait_for(&mut events, is_saved).await;
        assert_eq!(api.save_count(), 1);
        assert_eq!(api.stored().courses.len(), 5);
        assert_eq!(sync.state(), SyncState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_document_reflects_cascade_delete() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);
        sync.switch_user(&user("a@uni.edu")).await.unwrap();

        let id = add_course(&sync, "Networks").await;
        sync.mutate(|store| {
            store.update_timetable(
                Day::Monday,
                vec![TimetableSlot {
                    period: 1,
                    course_id: id.clone(),
                    start_time: "08:00".to_string(),
                    end_time: "09:30".to_string(),
                    venue: "LAB-D102".to_string(),
                    extra: Default::default(),
                }],
            )
        })
        .await
        .unwrap();
        sync.flush().await.unwrap();
        assert_eq!(api.stored().timetable.monday.len(), 1);

        sync.mutate(|store| Ok(store.delete_course(&id))).await.unwrap();
        sync.flush().await.unwrap();

        let stored = api.stored();
        assert!(stored.courses.is_empty());
        assert!(stored.timetable.monday.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_account_seeded_once() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);
        let demo = user(DEMO_EMAIL);

        let outcome = sync.switch_user(&demo).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { seeded: true });
        assert_eq!(api.save_count(), 1);
        assert_eq!(api.stored().courses.len(), 48);

        // Seeded revision is already saved; nothing more goes out.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.save_count(), 1);

        let first = sync.read(|s| s.courses()[0].id.clone()).await;
        sync.mutate(|store| Ok(store.delete_course(&first))).await.unwrap();
        sync.logout().await.unwrap();
        assert_eq!(api.stored().courses.len(), 47);

        let outcome = sync.switch_user(&demo).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { seeded: false });
        assert_eq!(sync.read(|s| s.courses().len()).await, 47);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_accounts_never_seeded() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);
        let outcome = sync.switch_user(&user("a@uni.edu")).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { seeded: false });
        assert_eq!(api.save_count(), 0);
        assert!(sync.snapshot().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_load_is_discarded() {
        let mut doc_a = DashboardDocument::empty();
        doc_a.semesters.push(studydash_core::Semester {
            id: "a".to_string(),
            name: "Belongs to A".to_string(),
            order: 0,
            extra: Default::default(),
        });
        let api = Arc::new(MockDashboardApi::with_document(doc_a));
        api.set_load_latency(Duration::from_secs(1));
        let sync = Arc::new(engine(&api));
        let mut events = sync.events();

        let user_a = user("a@uni.edu");
        let user_b = user("b@uni.edu");
        let slow = tokio::spawn({
            let sync = sync.clone();
            let user_a = user_a.clone();
            async move { sync.switch_user(&user_a).await }
        });
        while api.load_count() == 0 {
            tokio::task::yield_now().await;
        }

        api.set_document(DashboardDocument::empty());
        api.set_load_latency(Duration::ZERO);
        let outcome = sync.switch_user(&user_b).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded { seeded: false });

        assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Stale);
        let event = wait_for(&mut events, |e| {
            matches!(e, SyncEvent::StaleLoadDiscarded { .. })
        })
        .await;
        assert_eq!(event, SyncEvent::StaleLoadDiscarded { user_id: user_a.id });
        assert_eq!(sync.current_user(), Some(user_b.id));
        assert!(sync.snapshot().await.semesters.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_retries_with_backoff() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);
        let mut events = sync.events();
        sync.switch_user(&user("a@uni.edu")).await.unwrap();

        api.fail_next_saves(2);
        add_course(&sync, "Compilers").await;

        let first = wait_for(&mut events, |e| matches!(e, SyncEvent::SaveFailed { .. })).await;
        assert!(matches!(first, SyncEvent::SaveFailed { attempt: 1, .. }));
        let second = wait_for(&mut events, |e| matches!(e, SyncEvent::SaveFailed { .. })).await;
        assert!(matches!(second, SyncEvent::SaveFailed { attempt: 2, .. }));

        wait_for(&mut events, is_saved).await;
        assert_eq!(api.save_count(), 1);
        assert_eq!(api.stored().courses.len(), 1);
        assert_eq!(sync.state(), SyncState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_stop_after_limit() {
        let api = Arc::new(MockDashboardApi::new());
        let config = SyncConfig::default().with_retry(
            Duration::from_secs(1),
            Duration::from_secs(4),
            2,
        );
        let sync = DataSync::new(api.clone(), config);
        let mut events = sync.events();
        sync.switch_user(&user("a@uni.edu")).await.unwrap();
        let _ = events.try_recv();

        api.fail_next_saves(100);
        add_course(&sync, "Compilers").await;

        for expected in 1..=3 {
            let event =
                wait_for(&mut events, |e| matches!(e, SyncEvent::SaveFailed { .. })).await;
            assert!(matches!(event, SyncEvent::SaveFailed { attempt, .. } if attempt == expected));
        }

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(sync.state(), SyncState::Dirty);
        assert_eq!(api.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_flushes_pending_changes() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);
        let mut events = sync.events();
        sync.switch_user(&user("a@uni.edu")).await.unwrap();

        add_course(&sync, "Databases").await;
        sync.logout().await.unwrap();

        assert_eq!(api.save_count(), 1);
        assert_eq!(api.stored().courses.len(), 1);
        assert_eq!(sync.state(), SyncState::Idle);
        assert_eq!(sync.current_user(), None);
        assert!(sync.snapshot().await.is_empty());
        wait_for(&mut events, |e| *e == SyncEvent::Reset).await;

        let err = add_course_result(&sync).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    async fn add_course_result(sync: &DataSync) -> Result<String> {
        sync.mutate(|store| {
            store
                .add_course(CourseInput {
                    name: "Late".to_string(),
                    ..Default::default()
                })
                .map(|c| c.id)
        })
        .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_marker_is_per_session() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);

        sync.switch_user(&user("a@uni.edu")).await.unwrap();
        add_course(&sync, "A's course").await;
        sync.flush().await.unwrap();
        assert_eq!(api.save_count(), 1);

        // B's store reaches the same revision number A last saved.
        api.set_document(DashboardDocument::empty());
        sync.switch_user(&user("b@uni.edu")).await.unwrap();
        add_course(&sync, "B's course").await;
        sync.flush().await.unwrap();

        assert_eq!(api.save_count(), 2);
        assert_eq!(api.stored().courses[0].name, "B's course");
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_user_flushes_previous_session_first() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);

        sync.switch_user(&user("a@uni.edu")).await.unwrap();
        add_course(&sync, "Pending").await;
        sync.switch_user(&user("b@uni.edu")).await.unwrap();

        assert_eq!(api.save_count(), 1);
        assert_eq!(api.saves()[0].courses[0].name, "Pending");
        assert_eq!(api.load_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_hidden_saves_without_waiting_for_debounce() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);
        let mut events = sync.events();
        sync.switch_user(&user("a@uni.edu")).await.unwrap();

        let start = Instant::now();
        add_course(&sync, "Algorithms").await;
        sync.on_hidden();
        wait_for(&mut events, is_saved).await;

        assert!(start.elapsed() < sync.config().debounce);
        assert_eq!(api.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_save_in_flight() {
        let api = Arc::new(MockDashboardApi::new());
        api.set_save_latency(Duration::from_secs(1));
        let sync = engine(&api);
        sync.switch_user(&user("a@uni.edu")).await.unwrap();

        add_course(&sync, "One").await;
        sync.on_hidden();
        tokio::time::sleep(Duration::from_millis(100)).await;
        add_course(&sync, "Two").await;
        sync.on_hidden();
        add_course(&sync, "Three").await;
        sync.on_hidden();

        sync.flush().await.unwrap();
        assert_eq!(api.max_saves_in_flight(), 1);
        assert_eq!(api.stored().courses.len(), 3);
        assert_eq!(sync.state(), SyncState::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_without_changes_sends_nothing() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);
        sync.flush().await.unwrap();
        sync.switch_user(&user("a@uni.edu")).await.unwrap();
        sync.flush().await.unwrap();
        assert_eq!(api.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_mutation_does_not_schedule_save() {
        let api = Arc::new(MockDashboardApi::new());
        let sync = engine(&api);
        sync.switch_user(&user("a@uni.edu")).await.unwrap();

        let err = sync
            .mutate(|store| store.add_course(CourseInput::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(sync.state(), SyncState::Clean);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(api.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_leaves_engine_idle() {
        let api = Arc::new(MockDashboardApi::new());
        api.fail_next_loads(1);
        let sync = engine(&api);
        assert!(sync.switch_user(&user("a@uni.edu")).await.is_err());
        assert_eq!(sync.state(), SyncState::Idle);
        assert_eq!(sync.current_user(), None);
    }
}
