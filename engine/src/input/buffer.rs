//! Text and arithmetic buffers mutated by committed symbols.

use std::collections::VecDeque;

use super::eval;
use crate::recognition::classifier::ClassificationResult;

/// Evaluations kept in the arithmetic history for display.
pub const HISTORY_LIMIT: usize = 5;

// ── Buffer kind ────────────────────────────────────────────

/// Which buffer flavor a session accumulates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Text,
    Arithmetic,
}

impl BufferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Arithmetic => "arithmetic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "arithmetic" => Some(Self::Arithmetic),
            _ => None,
        }
    }
}

// ── Text buffer ────────────────────────────────────────────

/// Plain text accumulator with delete-last.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    pub content: String,
}

impl TextBuffer {
    fn apply(&mut self, symbol: &str) {
        match symbol {
            "space" => self.content.push(' '),
            "delete" => {
                self.content.pop();
            }
            other => self.content.push_str(&other.to_lowercase()),
        }
    }
}

// ── Arithmetic buffer ──────────────────────────────────────

/// Arithmetic expression accumulator with evaluation history.
///
/// The expression is held in display form (× ÷ −); `eval::evaluate`
/// maps it back before computing.
#[derive(Debug, Clone, Default)]
pub struct ArithmeticBuffer {
    pub expression: String,
    pub result: Option<String>,
    pub history: VecDeque<(String, String)>,
}

impl ArithmeticBuffer {
    fn apply(&mut self, symbol: &str) {
        match symbol {
            "delete" => {
                self.expression.pop();
                self.result = None;
            }
            "=" => {
                if self.expression.is_empty() {
                    return;
                }
                let result = eval::evaluate(&self.expression);
                self.history
                    .push_back((self.expression.clone(), result.clone()));
                while self.history.len() > HISTORY_LIMIT {
                    self.history.pop_front();
                }
                self.result = Some(result);
            }
            other => {
                for c in other.chars() {
                    self.expression.push(to_display(c));
                }
            }
        }
    }
}

/// Display form of an internal token character.
fn to_display(c: char) -> char {
    match c {
        '*' => '×',
        '/' => '÷',
        '-' => '−',
        other => other,
    }
}

// ── Buffer ─────────────────────────────────────────────────

/// A session's accumulator, text or arithmetic.
#[derive(Debug, Clone)]
pub enum Buffer {
    Text(TextBuffer),
    Arithmetic(ArithmeticBuffer),
}

impl Buffer {
    pub fn new(kind: BufferKind) -> Self {
        match kind {
            BufferKind::Text => Self::Text(TextBuffer::default()),
            BufferKind::Arithmetic => Self::Arithmetic(ArithmeticBuffer::default()),
        }
    }

    pub fn kind(&self) -> BufferKind {
        match self {
            Self::Text(_) => BufferKind::Text,
            Self::Arithmetic(_) => BufferKind::Arithmetic,
        }
    }

    /// Apply one committed symbol.
    pub fn apply(&mut self, symbol: &str) {
        match self {
            Self::Text(buf) => buf.apply(symbol),
            Self::Arithmetic(buf) => buf.apply(symbol),
        }
    }

    /// The user-visible buffer contents.
    pub fn display(&self) -> &str {
        match self {
            Self::Text(buf) => &buf.content,
            Self::Arithmetic(buf) => &buf.expression,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.kind());
    }

    /// Format as an s-expression plist for IPC snapshots.
    pub fn status_sexp(&self) -> String {
        match self {
            Self::Text(buf) => {
                format!("(:kind :text :content \"{}\")", escape(&buf.content))
            }
            Self::Arithmetic(buf) => {
                let result = buf
                    .result
                    .as_ref()
                    .map(|r| format!("\"{}\"", escape(r)))
                    .unwrap_or_else(|| "nil".to_string());
                let mut history = String::from("(");
                for (i, (expr, res)) in buf.history.iter().enumerate() {
                    if i > 0 {
                        history.push(' ');
                    }
                    history.push_str(&format!(
                        "(:expression \"{}\" :result \"{}\")",
                        escape(expr),
                        escape(res)
                    ));
                }
                history.push(')');
                format!(
                    "(:kind :arithmetic :expression \"{}\" :result {} :history {})",
                    escape(&buf.expression),
                    result,
                    history
                )
            }
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Commit application ─────────────────────────────────────

/// Apply the frame's classification to the buffer if a commit fired.
///
/// No commit, or no best-scoring symbol, means no mutation. Returns the
/// symbol that was applied, if any.
pub fn apply_commit(
    classification: &ClassificationResult,
    commit: bool,
    buffer: &mut Buffer,
) -> Option<String> {
    if !commit {
        return None;
    }
    let symbol = classification.best_name.as_ref()?;
    buffer.apply(symbol);
    Some(symbol.clone())
}

// ── Tests ──────────────────────────────────────────────────
