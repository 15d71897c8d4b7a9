use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use storage::repository::{AuthProvider, PreferenceRepository, SessionRepository};
use study_core::Clock;
use study_core::model::{CourseId, SessionId, StudySession, User};

use crate::error::RecorderError;

/// Fixed preference key under which the remembered course selection lives.
pub const SELECTED_COURSE_KEY: &str = "selected_course";

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of one timer run.
///
/// `Idle` is both the initial state and the rest state between runs. The
/// elapsed-seconds counter lives next to this enum on the recorder so it can
/// survive the `Running` -> `ConfirmingSwitch` -> `Running` round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Running {
        started_at: DateTime<Utc>,
    },
    ConfirmingSwitch {
        started_at: DateTime<Utc>,
        pending: CourseId,
    },
}

/// Outcome of a course-change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseChange {
    /// Timer was idle; the selection changed immediately.
    Switched,
    /// Timer is running; the caller must ask the user and then call
    /// [`SessionRecorder::resolve_switch`].
    ConfirmationRequired,
}

/// The user's answer to the "timer is running" confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchDecision {
    SaveAndSwitch,
    SwitchWithoutSaving,
    Cancel,
}

/// What a resolved confirmation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchResolution {
    /// The request was aborted; the timer keeps running on the old course.
    Cancelled,
    /// The selection changed. `saved` carries the persisted session for
    /// save-and-switch, `None` for switch-without-saving.
    Switched { saved: Option<StudySession> },
}

//
// ─── RECORDER ──────────────────────────────────────────────────────────────────
//

/// Timer and session recorder for the selected course.
///
/// Owns the transient timer state exclusively; dependents read it through the
/// accessors instead of sharing mutable state. All work is driven by the
/// caller (user actions plus a one-second tick), so nothing here needs
/// interior locking.
pub struct SessionRecorder {
    clock: Clock,
    auth: Arc<dyn AuthProvider>,
    sessions: Arc<dyn SessionRepository>,
    preferences: Arc<dyn PreferenceRepository>,
    user: Option<User>,
    selected_course: Option<CourseId>,
    state: RecorderState,
    elapsed_secs: u64,
}

impl SessionRecorder {
    /// Build a recorder: fetch the signed-in user first, then restore the
    /// remembered course selection from the preference port. A stored value
    /// that does not parse as a course id is treated as no value.
    ///
    /// # Errors
    ///
    /// Returns `RecorderError::Storage` if the user or preference read fails.
    pub async fn init(
        clock: Clock,
        auth: Arc<dyn AuthProvider>,
        sessions: Arc<dyn SessionRepository>,
        preferences: Arc<dyn PreferenceRepository>,
    ) -> Result<Self, RecorderError> {
        let user = auth.current_user().await?;
        let selected_course = preferences
            .get_preference(SELECTED_COURSE_KEY)
            .await?
            .and_then(|raw| raw.parse::<CourseId>().ok());

        Ok(Self {
            clock,
            auth,
            sessions,
            preferences,
            user,
            selected_course,
            state: RecorderState::Idle,
            elapsed_secs: 0,
        })
    }

    // ── accessors ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> RecorderState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            RecorderState::Running { .. } | RecorderState::ConfirmingSwitch { .. }
        )
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            RecorderState::Idle => None,
            RecorderState::Running { started_at }
            | RecorderState::ConfirmingSwitch { started_at, .. } => Some(started_at),
        }
    }

    #[must_use]
    pub fn selected_course(&self) -> Option<CourseId> {
        self.selected_course
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Re-read the signed-in user, e.g. after the auth state changed.
    ///
    /// # Errors
    ///
    /// Returns `RecorderError::Storage` if the identity cannot be read.
    pub async fn refresh_user(&mut self) -> Result<(), RecorderError> {
        self.user = self.auth.current_user().await?;
        Ok(())
    }

    // ── timer operations ───────────────────────────────────────────────────

    /// Start the timer for the selected course.
    ///
    /// Silent no-op (returns `false`) unless the recorder is idle, a course is
    /// selected, and a user is signed in.
    pub fn start(&mut self) -> bool {
        if self.state != RecorderState::Idle
            || self.selected_course.is_none()
            || self.user.is_none()
        {
            return false;
        }

        self.elapsed_secs = 0;
        self.state = RecorderState::Running {
            started_at: self.clock.now(),
        };
        true
    }

    /// One-second tick. Counts only while a run is live, so a driver interval
    /// that outlives a stop cannot increment an orphaned counter.
    ///
    /// A tick also advances the recorder's clock by one second; on the system
    /// clock that is a no-op, on a fixed clock it keeps elapsed time and
    /// timestamps consistent.
    pub fn tick(&mut self) {
        if self.is_running() {
            self.elapsed_secs += 1;
            self.clock.advance(Duration::seconds(1));
        }
    }

    /// Stop the timer and persist the completed session.
    ///
    /// The transient state is cleared before the insert is issued, so on
    /// failure the timer is already idle and nothing is retried. Returns
    /// `Ok(None)` when no run was active, or when the user signed out
    /// mid-run; in the latter case the run is discarded and the timer reset.
    ///
    /// # Errors
    ///
    /// Returns `RecorderError::Storage` if the insert fails.
    pub async fn stop(&mut self) -> Result<Option<StudySession>, RecorderError> {
        let RecorderState::Running { started_at } = self.state else {
            return Ok(None);
        };
        let (Some(course_id), Some(user)) = (self.selected_course, self.user.as_ref()) else {
            // Signed out mid-run: nothing to persist, discard the interval.
            self.state = RecorderState::Idle;
            self.elapsed_secs = 0;
            return Ok(None);
        };

        let end = self.clock.now();
        let session = StudySession::from_interval(
            SessionId::new_random(),
            course_id,
            user.id(),
            started_at,
            end,
        )?;

        self.state = RecorderState::Idle;
        self.elapsed_secs = 0;

        self.sessions.insert_session(&session).await?;
        Ok(Some(session))
    }

    /// Ask to select a different course.
    ///
    /// While idle the switch happens immediately; while running it parks the
    /// request and the caller must resolve the three-way confirmation.
    ///
    /// # Errors
    ///
    /// Returns `RecorderError::Storage` if persisting the new selection fails.
    pub async fn request_course_change(
        &mut self,
        new_course: CourseId,
    ) -> Result<CourseChange, RecorderError> {
        match self.state {
            RecorderState::Idle => {
                self.set_selected_course(new_course).await?;
                Ok(CourseChange::Switched)
            }
            RecorderState::Running { started_at }
            | RecorderState::ConfirmingSwitch { started_at, .. } => {
                self.state = RecorderState::ConfirmingSwitch {
                    started_at,
                    pending: new_course,
                };
                Ok(CourseChange::ConfirmationRequired)
            }
        }
    }

    /// Resolve a pending course-switch confirmation.
    ///
    /// Save-and-switch behaves like [`SessionRecorder::stop`] followed by the
    /// switch; the switch is applied even when the save fails, matching the
    /// error-then-switch order of the confirmation flow. Switch-without-saving
    /// discards the interval without persisting anything. Cancel resumes the
    /// run with counter and start time intact.
    ///
    /// # Errors
    ///
    /// Returns `RecorderError::NotConfirming` if no confirmation is pending.
    /// Returns `RecorderError::Storage` if the save or the preference write
    /// fails.
    pub async fn resolve_switch(
        &mut self,
        decision: SwitchDecision,
    ) -> Result<SwitchResolution, RecorderError> {
        let RecorderState::ConfirmingSwitch {
            started_at,
            pending,
        } = self.state
        else {
            return Err(RecorderError::NotConfirming);
        };

        match decision {
            SwitchDecision::Cancel => {
                self.state = RecorderState::Running { started_at };
                Ok(SwitchResolution::Cancelled)
            }
            SwitchDecision::SwitchWithoutSaving => {
                self.state = RecorderState::Idle;
                self.elapsed_secs = 0;
                self.set_selected_course(pending).await?;
                Ok(SwitchResolution::Switched { saved: None })
            }
            SwitchDecision::SaveAndSwitch => {
                self.state = RecorderState::Running { started_at };
                let saved = self.stop().await;
                self.set_selected_course(pending).await?;
                Ok(SwitchResolution::Switched { saved: saved? })
            }
        }
    }

    async fn set_selected_course(&mut self, course_id: CourseId) -> Result<(), RecorderError> {
        self.selected_course = Some(course_id);
        self.preferences
            .set_preference(SELECTED_COURSE_KEY, &course_id.to_string())
            .await?;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
