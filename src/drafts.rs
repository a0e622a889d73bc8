//! Server-side storage for the drafts of open investor forms.
//!
//! Every form a user opens gets its own [`FormSession`], addressed by a random
//! [`DraftId`] carried in the page URL. Sessions are never shared between
//! forms and are dropped once they go stale.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::forms::investors::{FormKind, InvestorDraft};
use crate::services::{ServiceError, ServiceResult};

/// Identifier of one open form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DraftId(Uuid);

impl DraftId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an id taken from a URL. Malformed ids yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }
}

impl Display for DraftId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Success,
    Error,
}

/// Last outcome shown on the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl FormMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }
}

/// Progress of the form's submit action.
///
/// `Idle -> Validating -> Submitting -> (Succeeded | Failed) -> Idle`.
/// Validation failures go straight from `Validating` to `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed(String),
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether a submit is underway and new attempts must be refused.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }

    pub fn begin(&mut self) -> ServiceResult<()> {
        if self.is_in_flight() {
            return Err(ServiceError::SubmissionInFlight);
        }
        *self = Self::Validating;
        Ok(())
    }

    pub fn start_request(&mut self) {
        debug_assert_eq!(*self, Self::Validating);
        *self = Self::Submitting;
    }

    pub fn succeed(&mut self) {
        *self = Self::Succeeded;
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        *self = Self::Failed(reason.into());
    }

    /// Returns to `Idle` once the outcome has been reported.
    pub fn settle(&mut self) {
        if matches!(self, Self::Succeeded | Self::Failed(_)) {
            *self = Self::Idle;
        }
    }
}

/// One open form: its draft plus transient UI state.
#[derive(Debug, Clone)]
pub struct FormSession {
    pub kind: FormKind,
    pub draft: InvestorDraft,
    pub submission: SubmissionState,
    pub message: Option<FormMessage>,
    touched_at: DateTime<Utc>,
}

impl FormSession {
    fn new(kind: FormKind, draft: InvestorDraft, message: Option<FormMessage>) -> Self {
        Self {
            kind,
            draft,
            submission: SubmissionState::Idle,
            message,
            touched_at: Utc::now(),
        }
    }
}

/// In-memory registry of open forms.
pub struct DraftStore {
    sessions: Mutex<HashMap<DraftId, FormSession>>,
    ttl: Duration,
}

impl DraftStore {
    /// Creates a store dropping sessions untouched for longer than `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> ServiceResult<MutexGuard<'_, HashMap<DraftId, FormSession>>> {
        self.sessions.lock().map_err(|e| {
            log::error!("Draft store lock poisoned: {e}");
            ServiceError::Internal
        })
    }

    /// Registers a new form session, evicting stale ones first.
    pub fn open(
        &self,
        kind: FormKind,
        draft: InvestorDraft,
        message: Option<FormMessage>,
    ) -> ServiceResult<DraftId> {
        let mut sessions = self.lock()?;
        let cutoff = Utc::now() - self.ttl;
        let before = sessions.len();
        sessions.retain(|_, session| session.touched_at >= cutoff);
        if sessions.len() != before {
            log::info!("Evicted {} stale drafts", before - sessions.len());
        }

        let id = DraftId::generate();
        sessions.insert(id, FormSession::new(kind, draft, message));
        Ok(id)
    }

    /// Runs `f` against the session under the store lock.
    pub fn with_session<T>(
        &self,
        id: DraftId,
        f: impl FnOnce(&mut FormSession) -> T,
    ) -> ServiceResult<T> {
        let mut sessions = self.lock()?;
        let session = sessions.get_mut(&id).ok_or(ServiceError::NotFound)?;
        session.touched_at = Utc::now();
        Ok(f(session))
    }

    /// Copy of the session for rendering.
    pub fn snapshot(&self, id: DraftId) -> ServiceResult<FormSession> {
        self.with_session(id, |session| session.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_sessions_are_independent() {
        let store = DraftStore::new(Duration::minutes(30));
        let first = store
            .open(FormKind::Create, InvestorDraft::default(), None)
            .unwrap();
        let second = store
            .open(FormKind::Create, InvestorDraft::default(), None)
            .unwrap();

        store
            .with_session(first, |session| session.draft.add_portfolio_entry())
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(store.snapshot(first).unwrap().draft.portfolio().len(), 1);
        assert!(store.snapshot(second).unwrap().draft.portfolio().is_empty());
    }

    #[test]
    fn unknown_draft_is_not_found() {
        let store = DraftStore::new(Duration::minutes(30));
        let id = DraftId::parse("5f1b7c1e-2a7e-4c43-9d0b-6c1b0d1f6a11").unwrap();

        assert_eq!(store.snapshot(id).unwrap_err(), ServiceError::NotFound);
    }

    #[test]
    fn stale_sessions_are_evicted_on_open() {
        let store = DraftStore::new(Duration::zero());
        let stale = store
            .open(FormKind::Create, InvestorDraft::default(), None)
            .unwrap();
        store
            .with_session(stale, |session| {
                session.touched_at = Utc::now() - Duration::seconds(5);
            })
            .unwrap();

        store
            .open(FormKind::Create, InvestorDraft::default(), None)
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot(stale).unwrap_err(), ServiceError::NotFound);
    }

    #[test]
    fn rejects_malformed_draft_ids() {
        assert!(DraftId::parse("not-a-uuid").is_none());
    }

    #[test]
    fn submission_state_refuses_reentry() {
        let mut state = SubmissionState::default();
        state.begin().unwrap();
        state.start_request();

        assert!(state.is_in_flight());
        assert_eq!(state.begin(), Err(ServiceError::SubmissionInFlight));

        state.fail("Network error");
        state.settle();
        assert_eq!(state, SubmissionState::Idle);
        assert!(state.begin().is_ok());
    }
}
