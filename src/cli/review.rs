//! Review command for bibly.
//!
//! Runs an interactive review session over line-oriented input: the
//! citation is shown with one field blanked, the answer is checked, and the
//! user grades their recall from 0 to 5. `:q` or end of input abandons the
//! session; everything graded so far is already saved.

use std::io::{BufRead, Write};

use serde::Serialize;

use crate::config::Config;
use crate::core::sm2::{format_interval, MAX_GRADE};
use crate::core::{format_prompt, Clock, RandomSource, ReviewSession, SessionMode, SessionPhase};
use crate::error::Result;
use crate::storage::ReviewStore;

/// Input that abandons the session.
const QUIT: &str = ":q";

/// Options for the review command.
#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    /// Print the summary as JSON.
    pub json: bool,
    /// Review every reference in shuffled order instead of due fields.
    pub all: bool,
}

/// Summary of a review run.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutput {
    pub success: bool,
    pub mode: SessionMode,
    /// Items graded.
    pub reviewed: usize,
    /// Items answered correctly.
    pub correct: usize,
    /// Whether the session ended before completion.
    pub abandoned: bool,
    /// Due (reference, field) pairs left afterwards.
    pub due_remaining: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewOutput {
    fn new(mode: SessionMode) -> Self {
        Self {
            success: true,
            mode,
            reviewed: 0,
            correct: 0,
            abandoned: false,
            due_remaining: 0,
            error: None,
        }
    }

    pub fn failure(mode: SessionMode, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::new(mode)
        }
    }
}

/// Outcome of reading one line.
enum Line {
    Text(String),
    Quit,
}

fn read_line<In: BufRead>(input: &mut In) -> Result<Line> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(Line::Quit);
    }
    let text = buf.trim_end_matches(['\r', '\n']).to_string();
    if text.trim() == QUIT {
        Ok(Line::Quit)
    } else {
        Ok(Line::Text(text))
    }
}

fn parse_grade(text: &str) -> Option<i32> {
    text.trim()
        .parse::<i32>()
        .ok()
        .filter(|g| (0..=MAX_GRADE).contains(g))
}

/// The review command implementation.
pub struct ReviewCommand<S: ReviewStore, C: Clock, R: RandomSource> {
    store: S,
    clock: C,
    rng: R,
    config: Config,
}

impl<S: ReviewStore, C: Clock, R: RandomSource> ReviewCommand<S, C, R> {
    /// Create a new review command.
    pub fn new(store: S, clock: C, rng: R, config: Config) -> Self {
        Self {
            store,
            clock,
            rng,
            config,
        }
    }

    /// Run an interactive session, reading answers from `input` and writing
    /// prompts to `out`.
    pub fn run<In: BufRead, Out: Write>(
        &mut self,
        input: &mut In,
        out: &mut Out,
        options: &ReviewOptions,
    ) -> ReviewOutput {
        let mode = if options.all {
            SessionMode::ShuffleAll
        } else {
            SessionMode::DueOnly
        };

        let mut session =
            match ReviewSession::load(&self.store, &self.clock, &mut self.rng, &self.config) {
                Ok(session) => session,
                Err(e) => return ReviewOutput::failure(mode, e.to_string()),
            };

        let mut output = ReviewOutput::new(mode);
        if let Err(e) = drive(&mut session, input, out, mode, &mut output) {
            session.abandon();
            output.success = false;
            output.abandoned = true;
            output.error = Some(e.to_string());
        }
        output.due_remaining = session.due_count();
        output
    }

    /// Format the end-of-session summary.
    pub fn format_output(&self, output: &ReviewOutput, options: &ReviewOptions) -> String {
        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Review failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.reviewed == 0 && !output.abandoned {
            return String::new();
        }

        let status = if output.abandoned {
            "Session stopped"
        } else {
            "Session complete"
        };
        format!(
            "\n{}: {} reviewed, {} correct. {} field(s) still due.\n",
            status, output.reviewed, output.correct, output.due_remaining
        )
    }
}

/// Drive one session until it completes or the user stops.
fn drive<S, C, R, In, Out>(
    session: &mut ReviewSession<S, C, R>,
    input: &mut In,
    out: &mut Out,
    mode: SessionMode,
    output: &mut ReviewOutput,
) -> Result<()>
where
    S: ReviewStore,
    C: Clock,
    R: RandomSource,
    In: BufRead,
    Out: Write,
{
    let phase = match mode {
        SessionMode::DueOnly => session.start_due_session(),
        SessionMode::ShuffleAll => session.start_free_session(),
    };

    if phase == SessionPhase::Completed {
        match mode {
            SessionMode::DueOnly => writeln!(out, "Nothing is due for review.")?,
            SessionMode::ShuffleAll => writeln!(out, "No references to review.")?,
        }
        return Ok(());
    }

    writeln!(
        out,
        "Fill in the blank. Type `{}` to stop; graded items are saved.",
        QUIT
    )?;

    while session.phase() == SessionPhase::Reviewing {
        let (prompt, label) = match session.current() {
            Some((reference, field)) => (format_prompt(reference, field), field.label()),
            None => break,
        };

        writeln!(out)?;
        writeln!(out, "[{}] {}", output.reviewed + 1, prompt)?;
        write!(out, "{}: ", label)?;
        out.flush()?;

        let answer = match read_line(input)? {
            Line::Text(text) => text,
            Line::Quit => {
                session.abandon();
                output.abandoned = true;
                break;
            }
        };
        session.set_answer(answer);

        let expected = session
            .current()
            .map(|(r, f)| r.field_value(f).to_string())
            .unwrap_or_default();
        match session.submit_answer() {
            Some(true) => writeln!(out, "Correct!")?,
            Some(false) => writeln!(out, "Incorrect. Answer: {}", expected)?,
            None => break,
        }

        let grade = loop {
            write!(out, "Grade 0-{} (5 = perfect, 0 = blackout): ", MAX_GRADE)?;
            out.flush()?;
            match read_line(input)? {
                Line::Text(text) => match parse_grade(&text) {
                    Some(g) => break Some(g),
                    None => writeln!(out, "Please enter a number from 0 to {}.", MAX_GRADE)?,
                },
                Line::Quit => break None,
            }
        };
        let Some(grade) = grade else {
            session.abandon();
            output.abandoned = true;
            break;
        };

        if let Some(outcome) = session.grade(grade) {
            output.reviewed += 1;
            if outcome.correct {
                output.correct += 1;
            }
            writeln!(
                out,
                "Next {} review in {}.",
                outcome.item.field.label(),
                format_interval(outcome.updated.interval)
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        FieldKey, FieldProgress, FixedClock, NewReference, Reference, SequenceRandom,
    };
    use crate::storage::MemoryReviewStore;
    use std::io::Cursor;
    use std::sync::Arc;

    fn reference(id: &str) -> Reference {
        Reference::with_id(
            id,
            NewReference {
                title: "On Liberty".to_string(),
                authors: "John Stuart Mill".to_string(),
                year: "1859".to_string(),
                publisher: "John W. Parker".to_string(),
                area: "Philosophy".to_string(),
            },
            0,
        )
    }

    type TestCommand = ReviewCommand<Arc<MemoryReviewStore>, FixedClock, SequenceRandom>;

    fn command(store: &Arc<MemoryReviewStore>) -> TestCommand {
        ReviewCommand::new(
            Arc::clone(store),
            FixedClock::new(0),
            SequenceRandom::new(vec![0.0]),
            Config::default(),
        )
    }

    fn run(
        store: &Arc<MemoryReviewStore>,
        input: &str,
        options: &ReviewOptions,
    ) -> (ReviewOutput, String) {
        let mut cmd = command(store);
        let mut input = Cursor::new(input.as_bytes().to_vec());
        let mut out = Vec::new();
        let output = cmd.run(&mut input, &mut out, options);
        (output, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_full_due_session() {
        let store = Arc::new(MemoryReviewStore::with_references(vec![reference("a")]));
        // Due order: year, publisher, area, authors
        let input = "1859\n5\njohn w. parker\n4\nEthics\n1\nJohn Stuart Mill\n5\n";
        let (output, text) = run(&store, input, &ReviewOptions::default());

        assert!(output.success);
        assert_eq!(output.reviewed, 4);
        assert_eq!(output.correct, 3);
        assert!(!output.abandoned);
        assert_eq!(output.due_remaining, 0);

        assert!(
            text.contains("John Stuart Mill ([Year?]). On Liberty. John W. Parker, Philosophy")
        );
        assert!(text.contains("Incorrect. Answer: Philosophy"));
        assert!(text.contains("Next Year review in 1d."));

        let history = store.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].field, FieldKey::Area);
        assert!(!history[2].correct);
    }

    #[test]
    fn test_quit_abandons_and_keeps_graded_items() {
        let store = Arc::new(MemoryReviewStore::with_references(vec![reference("a")]));
        let (output, _) = run(&store, "1859\n5\n:q\n", &ReviewOptions::default());

        assert!(output.abandoned);
        assert_eq!(output.reviewed, 1);
        assert_eq!(output.due_remaining, 3);
        assert_eq!(store.history().len(), 1);
        assert_eq!(
            store.references()[0]
                .progress(FieldKey::Year)
                .unwrap()
                .repetition,
            1
        );
    }

    #[test]
    fn test_single_letter_answer_is_submitted() {
        let mut r = reference("a");
        r.publisher = "Q".to_string();
        let store = Arc::new(MemoryReviewStore::with_references(vec![r]));
        let (output, text) = run(&store, "1859\n5\nq\n5\n:q\n", &ReviewOptions::default());

        assert!(output.abandoned);
        assert_eq!(output.reviewed, 2);
        assert_eq!(output.correct, 2);
        assert!(!text.contains("Incorrect"));
        assert_eq!(store.history()[1].user_answer, "q");
    }

    #[test]
    fn test_eof_abandons() {
        let store = Arc::new(MemoryReviewStore::with_references(vec![reference("a")]));
        let (output, _) = run(&store, "", &ReviewOptions::default());
        assert!(output.abandoned);
        assert_eq!(output.reviewed, 0);
        assert_eq!(store.reference_saves(), 0);
    }

    #[test]
    fn test_invalid_grade_reprompts() {
        let store = Arc::new(MemoryReviewStore::with_references(vec![reference("a")]));
        let (output, text) = run(&store, "1859\n9\nabc\n4\n:q\n", &ReviewOptions::default());

        assert_eq!(output.reviewed, 1);
        assert_eq!(text.matches("Please enter a number from 0 to 5.").count(), 2);
        assert_eq!(store.history()[0].grade, 4);
    }

    #[test]
    fn test_quit_at_grade_prompt_discards_item() {
        let store = Arc::new(MemoryReviewStore::with_references(vec![reference("a")]));
        let (output, _) = run(&store, "1859\n:q\n", &ReviewOptions::default());
        assert!(output.abandoned);
        assert_eq!(output.reviewed, 0);
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_nothing_due() {
        let r = reference("a");
        let mut scheduled = r.clone();
        for field in FieldKey::ALL {
            scheduled = scheduled.with_progress(
                field,
                FieldProgress {
                    next_review: 1_000,
                    ..FieldProgress::default()
                },
            );
        }
        let store = Arc::new(MemoryReviewStore::with_references(vec![scheduled]));
        let (output, text) = run(&store, "", &ReviewOptions::default());

        assert!(output.success);
        assert!(!output.abandoned);
        assert!(text.contains("Nothing is due for review."));
        let summary = command(&store).format_output(&output, &ReviewOptions::default());
        assert_eq!(summary, "");
    }

    #[test]
    fn test_shuffle_all_reviews_each_reference_once() {
        let store = Arc::new(MemoryReviewStore::with_references(vec![
            reference("a"),
            reference("b"),
        ]));
        let options = ReviewOptions {
            all: true,
            ..Default::default()
        };
        let (output, _) = run(&store, "x\n3\nx\n3\nx\n3\n", &options);

        assert_eq!(output.mode, SessionMode::ShuffleAll);
        assert_eq!(output.reviewed, 2);
        assert!(!output.abandoned);

        let mut ids: Vec<_> = store.history().into_iter().map(|h| h.ref_id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_format_summary() {
        let output = ReviewOutput {
            reviewed: 3,
            correct: 2,
            due_remaining: 1,
            ..ReviewOutput::new(SessionMode::DueOnly)
        };
        let cmd = command(&Arc::new(MemoryReviewStore::new()));
        let text = cmd.format_output(&output, &ReviewOptions::default());
        assert!(text.contains("Session complete: 3 reviewed, 2 correct. 1 field(s) still due."));

        let json = cmd.format_output(
            &output,
            &ReviewOptions {
                json: true,
                ..Default::default()
            },
        );
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "due_only");
        assert_eq!(value["reviewed"], 3);
    }

    #[test]
    fn test_parse_grade() {
        assert_eq!(parse_grade(" 0 "), Some(0));
        assert_eq!(parse_grade("5"), Some(5));
        assert_eq!(parse_grade("6"), None);
        assert_eq!(parse_grade("-1"), None);
        assert_eq!(parse_grade("five"), None);
    }
}
