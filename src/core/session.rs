//! Review session state machine.
//!
//! States: `Idle` → `Reviewing` (loops on each grade) → `Completed` → `Idle`.
//!
//! The session owns the working copy of the reference list and the history
//! ledger. Every grade produces a new list and a new ledger, which are pushed
//! to the [`ReviewStore`] immediately. Store failures are logged and ignored
//! so a broken disk never interrupts a review.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::config::Config;
use crate::core::clock::Clock;
use crate::core::random::{shuffle, RandomSource};
use crate::core::reference::{replace_reference, FieldKey, FieldProgress, Reference};
use crate::core::selector::{choose_field, due_count, pick_next, EligibleFields};
use crate::core::sm2;
use crate::error::{FailOpen, Result};
use crate::history::{HistoryLedger, ReviewHistoryItem};
use crate::storage::ReviewStore;

/// How the next item is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Most overdue (reference, field) pair first, until nothing is due.
    #[default]
    DueOnly,
    /// Every reference once, in shuffled order, ignoring due status.
    ShuffleAll,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::DueOnly => f.write_str("due"),
            SessionMode::ShuffleAll => f.write_str("shuffle-all"),
        }
    }
}

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Reviewing,
    Completed,
}

/// The (reference, field) pair being quizzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizItem {
    pub ref_id: String,
    pub field: FieldKey,
}

/// Ephemeral session state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub mode: SessionMode,
    pub phase: SessionPhase,
    pub current: Option<QuizItem>,
    pub answer_draft: String,
    pub result_revealed: bool,
    pub last_correct: Option<bool>,
    /// Reference ids still to visit in shuffle-all mode; front is current.
    pub queue: VecDeque<String>,
}

/// Result of a grading event.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    pub item: QuizItem,
    pub grade: i32,
    pub correct: bool,
    /// Progress before grading, `None` if the field had no record.
    pub previous: Option<FieldProgress>,
    pub updated: FieldProgress,
}

/// Check a typed answer against the expected field value.
///
/// Comparison is case-insensitive on whitespace-trimmed text.
pub fn answers_match(expected: &str, given: &str) -> bool {
    expected.trim().to_lowercase() == given.trim().to_lowercase()
}

/// Review session orchestrator.
pub struct ReviewSession<S: ReviewStore, C: Clock, R: RandomSource> {
    store: S,
    clock: C,
    rng: R,
    fields: EligibleFields,
    auto_resume: bool,
    references: Vec<Reference>,
    ledger: HistoryLedger,
    state: SessionState,
}

impl<S: ReviewStore, C: Clock, R: RandomSource> ReviewSession<S, C, R> {
    /// Create a session over an already loaded collection.
    pub fn new(
        store: S,
        clock: C,
        rng: R,
        config: &Config,
        references: Vec<Reference>,
        history: Vec<ReviewHistoryItem>,
    ) -> Self {
        Self {
            store,
            clock,
            rng,
            fields: EligibleFields::from_config(&config.review),
            auto_resume: config.review.auto_resume,
            references,
            ledger: HistoryLedger::from_items(history, config.history.capacity),
            state: SessionState::default(),
        }
    }

    /// Create a session by loading references and history from the store.
    pub fn load(store: S, clock: C, rng: R, config: &Config) -> Result<Self> {
        let references = store.load_references()?;
        let history = store.load_history()?;
        Ok(Self::new(store, clock, rng, config, references, history))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn mode(&self) -> SessionMode {
        self.state.mode
    }

    /// Current working copy of the reference list.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    /// The reference and field being quizzed.
    pub fn current(&self) -> Option<(&Reference, FieldKey)> {
        let item = self.state.current.as_ref()?;
        self.find(&item.ref_id).map(|r| (r, item.field))
    }

    /// Number of due pairs right now.
    pub fn due_count(&self) -> usize {
        due_count(&self.references, &self.fields, self.clock.now())
    }

    /// Whether a due-only session would have anything to show.
    pub fn can_start_due(&self) -> bool {
        self.due_count() > 0
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Transition: any → Reviewing (due-only), or → Completed if nothing is due.
    pub fn start_due_session(&mut self) -> SessionPhase {
        self.state = SessionState {
            mode: SessionMode::DueOnly,
            ..SessionState::default()
        };
        self.advance_due();
        tracing::debug!(phase = ?self.state.phase, "started due-only session");
        self.state.phase
    }

    /// Transition: any → Reviewing (shuffle-all), or → Completed if empty.
    pub fn start_free_session(&mut self) -> SessionPhase {
        let ids: Vec<String> = self.references.iter().map(|r| r.id.clone()).collect();
        self.state = SessionState {
            mode: SessionMode::ShuffleAll,
            queue: shuffle(&ids, &mut self.rng).into(),
            ..SessionState::default()
        };
        self.advance_queue();
        tracing::debug!(
            phase = ?self.state.phase,
            queued = self.state.queue.len(),
            "started shuffle-all session"
        );
        self.state.phase
    }

    /// Update the answer draft. Ignored once the result is revealed.
    pub fn set_answer(&mut self, answer: impl Into<String>) {
        if self.state.phase == SessionPhase::Reviewing && !self.state.result_revealed {
            self.state.answer_draft = answer.into();
        }
    }

    /// Check the draft against the target field and reveal the result.
    ///
    /// Returns the correctness, or `None` when there is nothing to check.
    pub fn submit_answer(&mut self) -> Option<bool> {
        if self.state.phase != SessionPhase::Reviewing || self.state.result_revealed {
            return None;
        }
        let correct = {
            let (reference, field) = self.current()?;
            answers_match(reference.field_value(field), &self.state.answer_draft)
        };
        self.state.last_correct = Some(correct);
        self.state.result_revealed = true;
        Some(correct)
    }

    /// Grade the revealed item, persist the effects, and move on.
    ///
    /// Returns `None` (no-op) without a current item or before the result
    /// has been revealed.
    pub fn grade(&mut self, grade: i32) -> Option<GradeOutcome> {
        if !self.state.result_revealed {
            return None;
        }
        let item = self.state.current.clone()?;
        let reference = self.find(&item.ref_id)?.clone();
        let now = self.clock.now();
        let correct = self.state.last_correct == Some(true);

        // (a) history
        self.ledger = self.ledger.append(ReviewHistoryItem {
            date: now,
            ref_id: reference.id.clone(),
            ref_title: reference.title.clone(),
            field: item.field,
            user_answer: self.state.answer_draft.clone(),
            correct,
            grade,
        });
        self.store
            .save_history(self.ledger.items())
            .fail_open_default("saving review history");

        // (b) progress
        let previous = reference.progress(item.field).copied();
        let prior = previous.unwrap_or_else(|| FieldProgress::new(now));
        let updated = sm2::update(&prior, grade, now);
        self.references =
            replace_reference(&self.references, &reference.with_progress(item.field, updated));
        self.store
            .save_references(&self.references)
            .fail_open_default("saving references");

        tracing::info!(
            ref_id = %item.ref_id,
            field = %item.field,
            grade,
            correct,
            interval = updated.interval,
            "graded field"
        );

        // (c) advance
        match self.state.mode {
            SessionMode::DueOnly => self.advance_due(),
            SessionMode::ShuffleAll => {
                self.state.queue.pop_front();
                self.advance_queue();
            }
        }

        Some(GradeOutcome {
            item,
            grade,
            correct,
            previous,
            updated,
        })
    }

    /// Transition: any → Idle. Discards the current item without persisting.
    pub fn abandon(&mut self) {
        if self.state.phase == SessionPhase::Reviewing {
            tracing::debug!("abandoned review session");
        }
        self.state = SessionState::default();
    }

    /// Accept a new reference list from outside the session.
    ///
    /// The current item is dropped if its reference disappeared. The
    /// completed-state reconciliation runs afterwards.
    pub fn replace_references(&mut self, references: Vec<Reference>) -> SessionPhase {
        self.references = references;

        if self.state.phase == SessionPhase::Reviewing && self.current().is_none() {
            match self.state.mode {
                SessionMode::DueOnly => self.advance_due(),
                SessionMode::ShuffleAll => self.advance_queue(),
            }
        }

        self.refresh()
    }

    /// Transition: Completed → Idle when something has become due.
    ///
    /// With `auto_resume` enabled, a due-only session starts right away.
    pub fn refresh(&mut self) -> SessionPhase {
        if self.state.phase == SessionPhase::Completed && self.can_start_due() {
            if self.auto_resume {
                return self.start_due_session();
            }
            tracing::debug!("items due again, leaving completed state");
            self.state = SessionState::default();
        }
        self.state.phase
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn find(&self, id: &str) -> Option<&Reference> {
        self.references.iter().find(|r| r.id == id)
    }

    fn present(&mut self, item: QuizItem) {
        self.state.phase = SessionPhase::Reviewing;
        self.state.current = Some(item);
        self.state.answer_draft.clear();
        self.state.result_revealed = false;
        self.state.last_correct = None;
    }

    fn complete(&mut self) {
        self.state.phase = SessionPhase::Completed;
        self.state.current = None;
        self.state.answer_draft.clear();
        self.state.result_revealed = false;
        self.state.last_correct = None;
        self.state.queue.clear();
    }

    fn advance_due(&mut self) {
        let next = pick_next(&self.references, &self.fields, self.clock.now()).map(|(r, field)| {
            QuizItem {
                ref_id: r.id.clone(),
                field,
            }
        });
        match next {
            Some(item) => self.present(item),
            None => self.complete(),
        }
    }

    /// Present the queue front, skipping ids no longer in the list.
    fn advance_queue(&mut self) {
        while let Some(id) = self.state.queue.front().cloned() {
            if let Some(reference) = self.references.iter().find(|r| r.id == id) {
                let field = choose_field(reference, &self.fields, &mut self.rng);
                self.present(QuizItem { ref_id: id, field });
                return;
            }
            self.state.queue.pop_front();
        }
        self.complete();
    }
}
