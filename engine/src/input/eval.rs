//! Safe arithmetic evaluation for the expression buffer.
//!
//! Failure is data: `evaluate` always returns a string, with the two
//! sentinel values below standing in for malformed input and non-finite
//! results. Nothing here panics on user input.

/// Sentinel returned for expressions that fail the character check or
/// do not parse.
pub const INVALID_EXPRESSION: &str = "Error: invalid expression";

/// Sentinel returned when the expression evaluates to a non-finite
/// value (division by zero and friends).
pub const INVALID_RESULT: &str = "Error: invalid result";

/// Evaluate an arithmetic expression with standard operator precedence.
///
/// Display operators (× ÷ −) are mapped back to their ASCII forms
/// first. Anything outside digits, `+ - * / . ( )` and spaces is
/// rejected. Integral results render without a decimal point; others
/// render with four decimal places.
pub fn evaluate(expression: &str) -> String {
    let internal: String = expression
        .chars()
        .map(|c| match c {
            '×' => '*',
            '÷' => '/',
            '−' => '-',
            other => other,
        })
        .collect();

    let allowed = |c: char| {
        c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '.' | '(' | ')' | ' ')
    };
    if !internal.chars().all(allowed) {
        return INVALID_EXPRESSION.to_string();
    }

    let value = match Parser::new(&internal).parse() {
        Some(v) => v,
        None => return INVALID_EXPRESSION.to_string(),
    };

    if !value.is_finite() {
        return INVALID_RESULT.to_string();
    }
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.4}", value)
    }
}

// ── Parser ─────────────────────────────────────────────────

/// Recursive-descent parser over the validated ASCII expression.
struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expr: &'a str) -> Self {
        Self {
            bytes: expr.as_bytes(),
            pos: 0,
        }
    }

    /// Parse the whole input; trailing garbage fails the parse.
    fn parse(mut self) -> Option<f64> {
        let value = self.expr()?;
        self.skip_spaces();
        if self.pos == self.bytes.len() {
            Some(value)
        } else {
            None
        }
    }

    fn expr(&mut self) -> Option<f64> {
        let mut acc = self.term()?;
        loop {
            self.skip_spaces();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    acc += self.term()?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    acc -= self.term()?;
                }
                _ => return Some(acc),
            }
        }
    }

    fn term(&mut self) -> Option<f64> {
        let mut acc = self.factor()?;
        loop {
            self.skip_spaces();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    acc *= self.factor()?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    acc /= self.factor()?;
                }
                _ => return Some(acc),
            }
        }
    }

    fn factor(&mut self) -> Option<f64> {
        self.skip_spaces();
        match self.peek()? {
            b'-' => {
                self.pos += 1;
                Some(-self.factor()?)
            }
            b'(' => {
                self.pos += 1;
                let value = self.expr()?;
                self.skip_spaces();
                if self.peek() == Some(b')') {
                    self.pos += 1;
                    Some(value)
                } else {
                    None
                }
            }
            _ => self.number(),
        }
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'.') {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        // str::parse rejects malformed numbers like "1.2.3" or ".".
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
