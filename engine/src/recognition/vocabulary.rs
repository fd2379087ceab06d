//! Gesture vocabularies: the named symbols a session recognizes.
//!
//! Iteration order is the insertion order and is the classifier's
//! tie-break, so a vocabulary never reorders or re-deduplicates after
//! construction.

// ── Presets ────────────────────────────────────────────────

/// Built-in vocabularies mirroring the practice modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Letters a-z.
    Alphabet,
    /// Digits 0-9.
    Digits,
    /// Digits plus operators, decimal point, equals, and delete.
    Arithmetic,
    /// Letters plus space and delete, for free-form text.
    Words,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alphabet => "alphabet",
            Self::Digits => "digits",
            Self::Arithmetic => "arithmetic",
            Self::Words => "words",
        }
    }

    /// Parse a preset name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "alphabet" => Some(Self::Alphabet),
            "digits" => Some(Self::Digits),
            "arithmetic" => Some(Self::Arithmetic),
            "words" => Some(Self::Words),
            _ => None,
        }
    }
}

// ── Vocabulary ─────────────────────────────────────────────

/// An ordered, deduplicated list of gesture names.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    names: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary from names, keeping the first occurrence of
    /// each and preserving order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self { names: out }
    }

    /// Build one of the preset vocabularies.
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Alphabet => Self::new(('a'..='z').map(String::from)),
            Preset::Digits => Self::new(('0'..='9').map(String::from)),
            Preset::Arithmetic => {
                let mut names: Vec<String> = ('0'..='9').map(String::from).collect();
                for op in ["+", "-", "*", "/", ".", "=", "delete"] {
                    names.push(op.to_string());
                }
                Self::new(names)
            }
            Preset::Words => {
                let mut names: Vec<String> = ('a'..='z').map(String::from).collect();
                names.push("space".to_string());
                names.push("delete".to_string());
                Self::new(names)
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ── Tests ──────────────────────────────────────────────────
