//! Conversion request controller: the submit / cancel lifecycle.
//!
//! ```text
//!            submit(url)                response / transport failure
//!   Idle ─────────────────▶ Submitting ─────────────────▶ Settling ──cleanup──▶ Idle
//!     ▲                         │
//!     └──────── cancel() ───────┘
//! ```
//!
//! One [`Controller`] owns at most one [`Session`] at a time. `submit()`
//! races the backend call against the session's cancellation token;
//! `cancel()` trips that token, asks the backend to stop in the background,
//! and reports the cancellation without waiting for the backend.
//!
//! Cleanup (submit re-enabled, cancel hidden, session cleared) is tied to a
//! drop guard, so it runs on every exit path of `submit()`, including the
//! caller dropping the future.

use crate::backend::{ConversionBackend, HttpBackend};
use crate::config::{ClientConfig, ConcurrentSubmitPolicy};
use crate::error::TrackfetchError;
use crate::present::{self, Entry};
use crate::protocol::{CancelRequest, ConversionResult, ConvertRequest};
use crate::session::{Session, SessionId, SessionSlot};
use crate::view::{NoopView, ViewHandle};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Busy message shown while a conversion is outstanding.
pub const STATUS_CONVERTING: &str = "Converting tracks...";
/// Shown while the cancel path runs.
pub const STATUS_STOPPING: &str = "Stopping...";
/// Final status after a user cancellation.
pub const STATUS_CANCELLED: &str = "Conversion cancelled.";
/// Final status after a transport failure.
pub const STATUS_SERVER_ERROR: &str = "Server error.";
/// Status after `clear()`.
pub const STATUS_READY: &str = "Ready";

/// Lifecycle state of a [`Controller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Nothing cancellable. Also held while a new submission prepares the view.
    #[default]
    Idle,
    /// A conversion request is outstanding and cancellable.
    Submitting,
    /// The response arrived and is being presented.
    Settling,
}

/// What a call to [`Controller::submit`] ended up doing.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Input was empty after trimming; nothing happened.
    Ignored,
    /// Another submission is in flight and the policy is
    /// [`ConcurrentSubmitPolicy::Reject`].
    Rejected { active: SessionId },
    /// The backend answered. `entries` is what the view was given
    /// (empty unless the result is a success).
    Settled {
        session_id: SessionId,
        result: ConversionResult,
        entries: Vec<Entry>,
    },
    /// The request was cancelled or replaced before it settled.
    Aborted { session_id: SessionId },
    /// The request failed on the wire.
    Failed {
        session_id: SessionId,
        error: TrackfetchError,
    },
}

impl SubmitOutcome {
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            SubmitOutcome::Ignored | SubmitOutcome::Rejected { .. } => None,
            SubmitOutcome::Settled { session_id, .. }
            | SubmitOutcome::Aborted { session_id }
            | SubmitOutcome::Failed { session_id, .. } => Some(session_id),
        }
    }
}

/// Handle returned by [`Controller::cancel`].
///
/// The backend notify runs in the background; a host about to exit can
/// await [`CancelNotice::finished`] so the notify is not cut off.
#[derive(Debug)]
pub struct CancelNotice {
    pub session_id: SessionId,
    notify: JoinHandle<()>,
}

impl CancelNotice {
    /// Wait for the backend notify to finish (successfully or not).
    pub async fn finished(self) {
        if let Err(e) = self.notify.await {
            warn!("Cancel notify task for {} did not complete: {}", self.session_id, e);
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    slot: SessionSlot,
    state: ControllerState,
}

/// Drives one conversion at a time against a [`ConversionBackend`].
pub struct Controller {
    backend: Arc<dyn ConversionBackend>,
    view: ViewHandle,
    config: ClientConfig,
    inner: Mutex<Inner>,
}

impl Controller {
    pub fn new(backend: Arc<dyn ConversionBackend>, config: ClientConfig) -> Self {
        Self {
            backend,
            view: Arc::new(NoopView),
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Controller over the HTTP backend described by `config`.
    pub fn http(config: ClientConfig) -> Result<Self, TrackfetchError> {
        let backend = HttpBackend::new(&config)?;
        Ok(Self::new(Arc::new(backend), config))
    }

    /// Attach the presentation surface.
    pub fn with_view(mut self, view: ViewHandle) -> Self {
        self.view = view;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.lock().state
    }

    /// Id of the in-flight submission, if any.
    pub fn active_session(&self) -> Option<SessionId> {
        self.lock().slot.active().map(|s| s.id().clone())
    }

    /// Submit `url` for conversion and wait for it to settle.
    ///
    /// Never returns an error: every failure ends up in the view's status
    /// text and in the returned [`SubmitOutcome`].
    pub async fn submit(&self, url: &str) -> SubmitOutcome {
        let url = url.trim();
        if url.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let session = match self.begin() {
            Ok(session) => session,
            Err(active) => return SubmitOutcome::Rejected { active },
        };
        let session_id = session.id().clone();
        let _cleanup = CleanupGuard {
            controller: self,
            id: session_id.clone(),
        };

        self.view.set_submit_enabled(false);
        self.view.set_cancel_visible(true);
        self.view.set_busy(STATUS_CONVERTING);
        self.view.hide_results();

        if !self.arm(&session_id) {
            debug!("Session {} replaced before its request went out", session_id);
            return SubmitOutcome::Aborted { session_id };
        }
        info!("Submitting {} (session {})", url, session_id);

        let request = ConvertRequest {
            url: url.to_string(),
            session_id: session_id.clone(),
        };
        let token = session.token().clone();

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            r = self.backend.convert(&request) => Some(r),
        };

        let Some(response) = response else {
            debug!("Conversion request for {} aborted", session_id);
            return SubmitOutcome::Aborted { session_id };
        };

        if !self.settle(&session_id) {
            debug!("Discarding response for superseded session {}", session_id);
            return SubmitOutcome::Aborted { session_id };
        }

        match response {
            Ok(result) => {
                let entries = present::render(&result, &self.config);
                if matches!(result, ConversionResult::Success { .. }) {
                    self.view.show_results(&entries);
                }
                let status = result.status_text();
                info!("Session {} settled: {}", session_id, status);
                self.view.set_status(&status);
                SubmitOutcome::Settled {
                    session_id,
                    result,
                    entries,
                }
            }
            Err(_) if token.is_cancelled() => SubmitOutcome::Aborted { session_id },
            Err(error) => {
                warn!("Conversion request for {} failed: {}", session_id, error);
                self.view.set_status(STATUS_SERVER_ERROR);
                SubmitOutcome::Failed { session_id, error }
            }
        }
    }

    /// Cancel the in-flight submission.
    ///
    /// Returns `None` (and touches nothing) when no submission is
    /// outstanding. Must be called from within a Tokio runtime: the backend
    /// notify is spawned onto it.
    pub fn cancel(&self) -> Option<CancelNotice> {
        let session = {
            let mut inner = self.lock();
            if inner.state != ControllerState::Submitting {
                return None;
            }
            inner.slot.take()?
        };
        let session_id = session.id().clone();
        info!("Cancelling session {}", session_id);

        session.abort();
        self.view.set_status(STATUS_STOPPING);

        let backend = Arc::clone(&self.backend);
        let request = CancelRequest {
            session_id: session_id.clone(),
        };
        let notify = tokio::spawn(async move {
            match backend.cancel(&request).await {
                Ok(()) => debug!("Backend notified of cancel for {}", request.session_id),
                Err(e) => warn!("Cancel notify for {} failed: {}", request.session_id, e),
            }
        });

        self.view.set_status(STATUS_CANCELLED);
        self.cleanup(&session_id);

        Some(CancelNotice { session_id, notify })
    }

    /// Empty the result area and reset the status. Does not affect an
    /// in-flight submission.
    pub fn clear(&self) {
        self.view.clear_results();
        self.view.set_status(STATUS_READY);
    }

    /// Register a new session according to the concurrency policy.
    /// `Err` carries the id of the session that blocked it.
    ///
    /// The new session is not cancellable until [`Self::arm`] runs, so a
    /// `cancel()` cannot interleave with the view being prepared.
    fn begin(&self) -> Result<Session, SessionId> {
        let mut inner = self.lock();
        if let Some(active) = inner.slot.active() {
            match self.config.concurrent_submit {
                ConcurrentSubmitPolicy::Reject => {
                    warn!("Submission rejected: session {} still in flight", active.id());
                    return Err(active.id().clone());
                }
                ConcurrentSubmitPolicy::Replace => {
                    info!("Replacing in-flight session {}", active.id());
                }
            }
        }
        let (session, previous) = inner.slot.create();
        if let Some(previous) = previous {
            previous.abort();
        }
        inner.state = ControllerState::Idle;
        Ok(session)
    }

    /// Move to `Submitting` if `id` is still the active session.
    fn arm(&self, id: &SessionId) -> bool {
        let mut inner = self.lock();
        let current = inner.slot.active().is_some_and(|s| s.id() == id);
        if current {
            inner.state = ControllerState::Submitting;
        }
        current
    }

    /// Move to `Settling` if `id` is still the active session.
    fn settle(&self, id: &SessionId) -> bool {
        let mut inner = self.lock();
        let current = inner.slot.active().is_some_and(|s| s.id() == id);
        if current {
            inner.state = ControllerState::Settling;
        }
        current
    }

    /// Clear `id` and, unless a newer session took over, reset the view.
    /// Safe to call any number of times.
    fn cleanup(&self, id: &SessionId) {
        {
            let mut inner = self.lock();
            inner.slot.clear(id);
            if inner.slot.is_active() {
                return;
            }
            inner.state = ControllerState::Idle;
        }
        self.view.set_submit_enabled(true);
        self.view.set_cancel_visible(false);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct CleanupGuard<'a> {
    controller: &'a Controller,
    id: SessionId,
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        self.controller.cleanup(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Track;
    use crate::view::ControllerView;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    // ── Test doubles ─────────────────────────────────────────────────────

    enum Script {
        Reply(ConversionResult),
        Fail,
        Hang,
    }

    #[derive(Default)]
    struct ScriptedBackend {
        scripts: Mutex<VecDeque<Script>>,
        converts: Mutex<Vec<ConvertRequest>>,
        cancels: Mutex<Vec<CancelRequest>>,
        entered: Notify,
        cancel_fails: bool,
    }

    impl ScriptedBackend {
        fn with(scripts: impl IntoIterator<Item = Script>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts.into_iter().collect()),
                ..Default::default()
            })
        }

        fn convert_count(&self) -> usize {
            self.converts.lock().unwrap().len()
        }

        fn cancel_ids(&self) -> Vec<SessionId> {
            self.cancels
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.session_id.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ConversionBackend for ScriptedBackend {
        async fn convert(
            &self,
            request: &ConvertRequest,
        ) -> Result<ConversionResult, TrackfetchError> {
            self.converts.lock().unwrap().push(request.clone());
            let script = self.scripts.lock().unwrap().pop_front();
            self.entered.notify_one();
            match script {
                Some(Script::Reply(r)) => Ok(r),
                Some(Script::Fail) | None => Err(TrackfetchError::Transport {
                    endpoint: "/convert".into(),
                    reason: "connection refused".into(),
                }),
                Some(Script::Hang) => std::future::pending().await,
            }
        }

        async fn cancel(&self, request: &CancelRequest) -> Result<(), TrackfetchError> {
            self.cancels.lock().unwrap().push(request.clone());
            if self.cancel_fails {
                Err(TrackfetchError::Transport {
                    endpoint: "/cancel".into(),
                    reason: "unreachable".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct RecordingView {
        events: Mutex<Vec<String>>,
        statuses: Mutex<Vec<String>>,
        submit_enabled: Mutex<Option<bool>>,
        cancel_visible: Mutex<Option<bool>>,
        shown: Mutex<Vec<Entry>>,
    }

    impl RecordingView {
        fn last_status(&self) -> Option<String> {
            self.statuses.lock().unwrap().last().cloned()
        }
        fn submit_enabled(&self) -> Option<bool> {
            *self.submit_enabled.lock().unwrap()
        }
        fn cancel_visible(&self) -> Option<bool> {
            *self.cancel_visible.lock().unwrap()
        }
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ControllerView for RecordingView {
        fn set_submit_enabled(&self, enabled: bool) {
            *self.submit_enabled.lock().unwrap() = Some(enabled);
            self.events.lock().unwrap().push(format!("submit:{enabled}"));
        }
        fn set_cancel_visible(&self, visible: bool) {
            *self.cancel_visible.lock().unwrap() = Some(visible);
            self.events.lock().unwrap().push(format!("cancel:{visible}"));
        }
        fn set_busy(&self, message: &str) {
            self.events.lock().unwrap().push(format!("busy:{message}"));
        }
        fn set_status(&self, text: &str) {
            self.statuses.lock().unwrap().push(text.to_string());
            self.events.lock().unwrap().push(format!("status:{text}"));
        }
        fn hide_results(&self) {
            self.events.lock().unwrap().push("hide".into());
        }
        fn show_results(&self, entries: &[Entry]) {
            *self.shown.lock().unwrap() = entries.to_vec();
            self.events.lock().unwrap().push(format!("show:{}", entries.len()));
        }
        fn clear_results(&self) {
            self.shown.lock().unwrap().clear();
            self.events.lock().unwrap().push("clear".into());
        }
    }

    fn controller(
        backend: Arc<ScriptedBackend>,
        policy: ConcurrentSubmitPolicy,
    ) -> (Arc<Controller>, Arc<RecordingView>) {
        let view = Arc::new(RecordingView::default());
        let config = ClientConfig::builder()
            .backend_url("http://backend.test")
            .concurrent_submit(policy)
            .build()
            .unwrap();
        let c = Controller::new(backend, config).with_view(view.clone());
        (Arc::new(c), view)
    }

    fn success(n: usize, zip: bool) -> ConversionResult {
        ConversionResult::Success {
            tracks: (1..=n)
                .map(|i| Track {
                    name: format!("Track {i}"),
                    download_link: format!("/downloads/t{i}.mp3"),
                })
                .collect(),
            zip_link: zip.then(|| "/downloads/all.zip".to_string()),
            skipped: vec![],
        }
    }

    // ── submit ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn blank_input_is_a_noop() {
        let backend = ScriptedBackend::with([]);
        let (c, view) = controller(backend.clone(), ConcurrentSubmitPolicy::Reject);

        for input in ["", "   ", "\t\n"] {
            assert!(matches!(c.submit(input).await, SubmitOutcome::Ignored));
        }
        assert_eq!(backend.convert_count(), 0);
        assert_eq!(c.state(), ControllerState::Idle);
        assert!(view.events().is_empty());
    }

    #[tokio::test]
    async fn success_renders_archive_then_tracks() {
        let backend = ScriptedBackend::with([Script::Reply(success(2, true))]);
        let (c, view) = controller(backend.clone(), ConcurrentSubmitPolicy::Reject);

        let SubmitOutcome::Settled { entries, session_id, .. } =
            c.submit("  https://example.com/playlist  ").await
        else {
            panic!("expected a settled submission");
        };

        assert_eq!(entries.len(), 3);
        assert!(matches!(&entries[0], Entry::Archive { href } if href == "http://backend.test/downloads/all.zip"));
        assert!(matches!(&entries[1], Entry::Track { name, .. } if name == "Track 1"));
        assert!(matches!(&entries[2], Entry::Track { name, .. } if name == "Track 2"));
        assert_eq!(*view.shown.lock().unwrap(), entries);
        assert_eq!(view.last_status().as_deref(), Some("2 track(s) ready."));

        let sent = backend.converts.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://example.com/playlist");
        assert_eq!(sent[0].session_id, session_id);

        assert_eq!(view.submit_enabled(), Some(true));
        assert_eq!(view.cancel_visible(), Some(false));
        assert!(c.active_session().is_none());
        assert_eq!(c.state(), ControllerState::Idle);
    }

    #[tokio::test]
    async fn submit_prepares_view_before_request() {
        let backend = ScriptedBackend::with([Script::Reply(ConversionResult::Cancelled)]);
        let (c, view) = controller(backend, ConcurrentSubmitPolicy::Reject);
        c.submit("https://example.com/a").await;

        assert_eq!(
            view.events(),
            vec![
                "submit:false".to_string(),
                "cancel:true".into(),
                format!("busy:{STATUS_CONVERTING}"),
                "hide".into(),
                "status:Conversion stopped.".into(),
                "submit:true".into(),
                "cancel:false".into(),
            ]
        );
    }

    #[tokio::test]
    async fn backend_error_is_prefixed() {
        let backend = ScriptedBackend::with([Script::Reply(ConversionResult::Error {
            message: "Invalid URL".into(),
        })]);
        let (c, view) = controller(backend, ConcurrentSubmitPolicy::Reject);

        let outcome = c.submit("nonsense").await;
        assert!(matches!(outcome, SubmitOutcome::Settled { ref entries, .. } if entries.is_empty()));
        assert_eq!(view.last_status().as_deref(), Some("Error: Invalid URL"));
        assert!(view.shown.lock().unwrap().is_empty());
        assert_eq!(view.submit_enabled(), Some(true));
    }

    #[tokio::test]
    async fn transport_failure_reports_server_error() {
        let backend = ScriptedBackend::with([Script::Fail]);
        let (c, view) = controller(backend, ConcurrentSubmitPolicy::Reject);

        let outcome = c.submit("https://example.com/a").await;
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert_eq!(view.last_status().as_deref(), Some(STATUS_SERVER_ERROR));
        assert_eq!(view.submit_enabled(), Some(true));
        assert_eq!(view.cancel_visible(), Some(false));
        assert!(c.active_session().is_none());
    }

    #[tokio::test]
    async fn each_submission_gets_its_own_session() {
        let backend = ScriptedBackend::with([
            Script::Reply(success(1, false)),
            Script::Reply(success(1, false)),
        ]);
        let (c, _view) = controller(backend.clone(), ConcurrentSubmitPolicy::Reject);

        let a = c.submit("https://example.com/a").await;
        let b = c.submit("https://example.com/b").await;
        assert_ne!(a.session_id(), b.session_id());
        assert!(c.active_session().is_none());
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let backend = ScriptedBackend::with([Script::Reply(success(1, false))]);
        let (c, view) = controller(backend, ConcurrentSubmitPolicy::Reject);

        let outcome = c.submit("https://example.com/a").await;
        let id = outcome.session_id().unwrap().clone();
        c.cleanup(&id);
        c.cleanup(&id);

        assert_eq!(c.state(), ControllerState::Idle);
        assert!(c.active_session().is_none());
        assert_eq!(view.submit_enabled(), Some(true));
        assert_eq!(view.cancel_visible(), Some(false));
    }

    // ── cancel ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn cancel_without_submission_is_a_noop() {
        let backend = ScriptedBackend::with([]);
        let (c, view) = controller(backend.clone(), ConcurrentSubmitPolicy::Reject);

        assert!(c.cancel().is_none());
        assert!(backend.cancel_ids().is_empty());
        assert!(view.events().is_empty());
    }

    #[tokio::test]
    async fn cancel_while_outstanding() {
        let backend = ScriptedBackend::with([Script::Hang]);
        let (c, view) = controller(backend.clone(), ConcurrentSubmitPolicy::Reject);

        let task = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.submit("https://example.com/long").await }
        });
        backend.entered.notified().await;
        assert_eq!(c.state(), ControllerState::Submitting);
        let active = c.active_session().unwrap();

        let notice = c.cancel().expect("a session was active");
        assert_eq!(notice.session_id, active);
        notice.finished().await;

        let outcome = task.await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Aborted { ref session_id } if *session_id == active));

        assert_eq!(backend.cancel_ids(), vec![active]);
        let statuses = view.statuses.lock().unwrap().clone();
        assert_eq!(statuses, vec![STATUS_STOPPING.to_string(), STATUS_CANCELLED.into()]);
        assert_eq!(view.submit_enabled(), Some(true));
        assert_eq!(view.cancel_visible(), Some(false));
        assert_eq!(c.state(), ControllerState::Idle);

        // a second cancel has nothing left to do
        assert!(c.cancel().is_none());
    }

    /// Cancels from inside the first view call of a submission.
    #[derive(Default)]
    struct EagerCancelView {
        controller: std::sync::OnceLock<std::sync::Weak<Controller>>,
        inner: RecordingView,
        attempted: Mutex<Vec<bool>>,
    }

    impl ControllerView for EagerCancelView {
        fn set_submit_enabled(&self, enabled: bool) {
            self.inner.set_submit_enabled(enabled);
            if !enabled {
                if let Some(c) = self.controller.get().and_then(std::sync::Weak::upgrade) {
                    self.attempted.lock().unwrap().push(c.cancel().is_some());
                }
            }
        }
        fn set_cancel_visible(&self, visible: bool) {
            self.inner.set_cancel_visible(visible);
        }
        fn set_busy(&self, message: &str) {
            self.inner.set_busy(message);
        }
        fn set_status(&self, text: &str) {
            self.inner.set_status(text);
        }
        fn hide_results(&self) {
            self.inner.hide_results();
        }
        fn show_results(&self, entries: &[Entry]) {
            self.inner.show_results(entries);
        }
    }

    #[tokio::test]
    async fn cancel_during_view_setup_does_not_leave_stale_busy_status() {
        let backend = ScriptedBackend::with([Script::Hang]);
        let view = Arc::new(EagerCancelView::default());
        let c = Arc::new(
            Controller::new(backend.clone(), ClientConfig::default()).with_view(view.clone()),
        );
        view.controller.set(Arc::downgrade(&c)).unwrap();

        let task = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.submit("https://example.com/long").await }
        });
        backend.entered.notified().await;

        // The early cancel found nothing cancellable and left the screen alone.
        assert_eq!(*view.attempted.lock().unwrap(), vec![false]);
        assert!(view.inner.statuses.lock().unwrap().is_empty());
        assert_eq!(c.state(), ControllerState::Submitting);

        c.cancel().expect("request is outstanding").finished().await;
        assert!(matches!(task.await.unwrap(), SubmitOutcome::Aborted { .. }));

        let events = view.inner.events();
        assert_eq!(events.last().map(String::as_str), Some("cancel:false"));
        assert_eq!(view.inner.last_status().as_deref(), Some(STATUS_CANCELLED));
        let busy_at = events.iter().position(|e| e.starts_with("busy:")).unwrap();
        let cancelled_at = events
            .iter()
            .position(|e| *e == format!("status:{STATUS_CANCELLED}"))
            .unwrap();
        assert!(busy_at < cancelled_at);
    }

    #[tokio::test]
    async fn cancel_notify_failure_is_swallowed() {
        let backend = Arc::new(ScriptedBackend {
            scripts: Mutex::new(VecDeque::from([Script::Hang])),
            cancel_fails: true,
            ..Default::default()
        });
        let (c, view) = controller(backend.clone(), ConcurrentSubmitPolicy::Reject);

        let task = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.submit("https://example.com/long").await }
        });
        backend.entered.notified().await;

        c.cancel().unwrap().finished().await;
        assert!(matches!(task.await.unwrap(), SubmitOutcome::Aborted { .. }));
        assert_eq!(backend.cancel_ids().len(), 1);
        assert_eq!(view.last_status().as_deref(), Some(STATUS_CANCELLED));
    }

    #[tokio::test]
    async fn controller_is_reusable_after_cancel() {
        let backend = ScriptedBackend::with([Script::Hang, Script::Reply(success(1, false))]);
        let (c, view) = controller(backend.clone(), ConcurrentSubmitPolicy::Reject);

        let task = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.submit("https://example.com/a").await }
        });
        backend.entered.notified().await;
        c.cancel().unwrap().finished().await;
        task.await.unwrap();

        let outcome = c.submit("https://example.com/b").await;
        assert!(matches!(outcome, SubmitOutcome::Settled { .. }));
        assert_eq!(view.last_status().as_deref(), Some("1 track(s) ready."));
    }

    // ── concurrency policy ───────────────────────────────────────────────

    #[tokio::test]
    async fn reject_policy_refuses_second_submission() {
        let backend = ScriptedBackend::with([Script::Hang]);
        let (c, _view) = controller(backend.clone(), ConcurrentSubmitPolicy::Reject);

        let first = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.submit("https://example.com/a").await }
        });
        backend.entered.notified().await;
        let active = c.active_session().unwrap();

        let second = c.submit("https://example.com/b").await;
        assert!(matches!(second, SubmitOutcome::Rejected { active: ref a } if *a == active));
        assert_eq!(backend.convert_count(), 1);
        assert_eq!(c.active_session(), Some(active));

        c.cancel().unwrap().finished().await;
        first.await.unwrap();
    }

    #[tokio::test]
    async fn replace_policy_aborts_previous_submission() {
        let backend = ScriptedBackend::with([Script::Hang, Script::Reply(success(2, false))]);
        let (c, view) = controller(backend.clone(), ConcurrentSubmitPolicy::Replace);

        let first = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.submit("https://example.com/a").await }
        });
        backend.entered.notified().await;
        let first_id = c.active_session().unwrap();

        let second = c.submit("https://example.com/b").await;
        assert!(matches!(second, SubmitOutcome::Settled { .. }));
        assert_ne!(second.session_id(), Some(&first_id));

        let first = first.await.unwrap();
        assert!(matches!(first, SubmitOutcome::Aborted { .. }));
        assert_eq!(view.last_status().as_deref(), Some("2 track(s) ready."));
        assert_eq!(view.submit_enabled(), Some(true));
        assert!(c.active_session().is_none());
    }

    // ── clear ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn clear_resets_results_and_status() {
        let backend = ScriptedBackend::with([Script::Reply(success(1, true))]);
        let (c, view) = controller(backend, ConcurrentSubmitPolicy::Reject);
        c.submit("https://example.com/a").await;

        c.clear();
        assert!(view.shown.lock().unwrap().is_empty());
        assert_eq!(view.last_status().as_deref(), Some(STATUS_READY));
    }
}
