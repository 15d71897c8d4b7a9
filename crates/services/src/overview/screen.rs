use std::collections::HashSet;
use std::sync::Arc;

use storage::repository::{AuthProvider, CourseRepository, SessionRepository};
use study_core::model::{CourseId, SessionId};

use super::aggregate::{CourseAggregate, aggregate_by_course, overall_minutes};
use crate::error::OverviewError;

/// Loaded overview state: the aggregates plus the edit-mode selection of
/// sessions marked for deletion.
pub struct OverviewScreen {
    auth: Arc<dyn AuthProvider>,
    courses: Arc<dyn CourseRepository>,
    sessions: Arc<dyn SessionRepository>,
    aggregates: Vec<CourseAggregate>,
    editing: bool,
    selection: HashSet<SessionId>,
}

impl OverviewScreen {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        courses: Arc<dyn CourseRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            auth,
            courses,
            sessions,
            aggregates: Vec::new(),
            editing: false,
            selection: HashSet::new(),
        }
    }

    /// Fetch courses and sessions for the signed-in user and recompute the
    /// aggregates. The user fetch completes first; a null user is a terminal
    /// branch. If either row fetch fails the previous aggregates stay as they
    /// were — partial results are never shown.
    ///
    /// # Errors
    ///
    /// Returns `OverviewError::SignedOut` when nobody is signed in, or
    /// `OverviewError::Storage` when a fetch fails.
    pub async fn load(&mut self) -> Result<(), OverviewError> {
        let user = self
            .auth
            .current_user()
            .await?
            .ok_or(OverviewError::SignedOut)?;

        let courses = self.courses.list_courses(user.id()).await?;
        let sessions = self.sessions.list_sessions(user.id()).await?;

        self.aggregates = aggregate_by_course(courses, sessions);
        Ok(())
    }

    // ── read side ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn aggregates(&self) -> &[CourseAggregate] {
        &self.aggregates
    }

    #[must_use]
    pub fn overall_minutes(&self) -> u64 {
        overall_minutes(&self.aggregates)
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    #[must_use]
    pub fn is_selected(&self, id: SessionId) -> bool {
        self.selection.contains(&id)
    }

    /// True when every session of the course is currently selected.
    #[must_use]
    pub fn course_fully_selected(&self, course_id: CourseId) -> bool {
        self.aggregates
            .iter()
            .find(|a| a.course_id() == course_id)
            .is_some_and(|a| {
                !a.sessions.is_empty()
                    && a.sessions.iter().all(|s| self.selection.contains(&s.id()))
            })
    }

    // ── selection / edit mode ──────────────────────────────────────────────

    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    /// Leave edit mode and drop any pending selection.
    pub fn cancel_edit(&mut self) {
        self.editing = false;
        self.selection.clear();
    }

    /// Toggle a single session in or out of the deletion selection.
    pub fn toggle(&mut self, id: SessionId) {
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
    }

    /// Select or deselect every session belonging to one course.
    pub fn select_all_in_course(&mut self, course_id: CourseId, selected: bool) {
        let Some(aggregate) = self.aggregates.iter().find(|a| a.course_id() == course_id)
        else {
            return;
        };
        for session in &aggregate.sessions {
            if selected {
                self.selection.insert(session.id());
            } else {
                self.selection.remove(&session.id());
            }
        }
    }

    /// Delete the selected sessions and reload once.
    ///
    /// On success the selection is cleared, edit mode ends, and the
    /// aggregates are refreshed with exactly one reload. On failure the
    /// previously displayed aggregates and the selection are left untouched
    /// so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns `OverviewError::EmptySelection` when nothing is selected, or
    /// `OverviewError::Storage` when the delete fails.
    pub async fn delete_selected(&mut self) -> Result<(), OverviewError> {
        if self.selection.is_empty() {
            return Err(OverviewError::EmptySelection);
        }

        let ids: Vec<SessionId> = self.selection.iter().copied().collect();
        self.sessions.delete_sessions(&ids).await?;

        self.selection.clear();
        self.editing = false;
        self.load().await
    }
}
