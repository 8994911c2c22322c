//! Turn-based interactive session over a [`QueryRouter`].
//!
//! [`Session::turn`] handles one line of user input and never fails: routing
//! and generation errors become [`TurnOutcome`] values so the caller can keep
//! reading questions.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::warn;

use crate::error::{RagError, Result};
use crate::month::Month;
use crate::router::{Answer, QueryRouter};

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// `quit` or `exit`, in any case.
    Exit,
    /// A blank line.
    Empty,
    /// Anything else is a question.
    Query(String),
}

impl SessionInput {
    /// Classify one input line.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            SessionInput::Empty
        } else if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            SessionInput::Exit
        } else {
            SessionInput::Query(trimmed.to_string())
        }
    }
}

/// The terminal state of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The user asked to leave.
    Exit,
    /// Blank input; nothing was done.
    Skipped,
    /// An answer was generated.
    Answered(Answer),
    /// The question named a month with no statement.
    NoDocumentForMonth(Month),
    /// The turn failed; the message is shown to the user.
    Failed(String),
}

impl TurnOutcome {
    /// Text to show the user, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            TurnOutcome::Exit | TurnOutcome::Skipped => None,
            TurnOutcome::Answered(answer) => Some(format!("\n> Answer:\n\n{}\n", answer.text)),
            TurnOutcome::NoDocumentForMonth(month) => Some(format!("No document found for {month}.")),
            TurnOutcome::Failed(message) => Some(format!("Error: {message}")),
        }
    }
}

/// An interactive question-answering session.
#[derive(Clone)]
pub struct Session {
    router: Arc<QueryRouter>,
}

impl Session {
    /// Create a session over `router`.
    pub fn new(router: Arc<QueryRouter>) -> Self {
        Self { router }
    }

    /// Handle one line of input.
    pub async fn turn(&self, line: &str) -> TurnOutcome {
        let question = match SessionInput::parse(line) {
            SessionInput::Exit => return TurnOutcome::Exit,
            SessionInput::Empty => return TurnOutcome::Skipped,
            SessionInput::Query(question) => question,
        };

        match self.router.answer(&question).await {
            Ok(answer) => TurnOutcome::Answered(answer),
            Err(RagError::NoDocumentForMonth { month }) => TurnOutcome::NoDocumentForMonth(month),
            Err(e) => {
                warn!(error = %e, "turn failed");
                TurnOutcome::Failed(e.to_string())
            }
        }
    }

    /// Read questions line by line until `quit`/`exit` or end of input.
    ///
    /// Each turn's message is written to `writer`. Nothing is written after
    /// the exit command.
    pub async fn run<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<()> {
        for line in reader.lines() {
            let outcome = self.turn(&line?).await;
            if outcome == TurnOutcome::Exit {
                break;
            }
            if let Some(message) = outcome.message() {
                writeln!(writer, "{message}")?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}
