//! Generation constraints.
//!
//! A [`Constraint`] restricts what a runtime may produce for one generation
//! request. It is built from three primitives: a regular text pattern, an
//! exclusive alternation of fixed literals, and disjunctions (of a
//! constraint with a literal sentinel, or of several constraints). Any
//! runtime able to honour those can back the orchestrator.
//!
//! Every constraint can be rendered as an anchored regular expression (for
//! verification) and as a GBNF grammar (for llama.cpp style samplers).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Character class for the body of a quoted text value.
const TEXT_CHAR_REGEX: &str = r#"[^"\\\x00-\x1F\x7F]|\\["\\/bfnrt]"#;

/// GBNF equivalent of [`TEXT_CHAR_REGEX`].
const TEXT_CHAR_GBNF: &str = r#"[^"\\\x00-\x1F\x7F] | "\\" ["\\/bfnrt]"#;

/// A regular pattern with its grammar rendering.
///
/// The anchored regex is compiled on first use and cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    regex: String,
    gbnf: String,
    /// Optional cap on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip)]
    anchored: OnceLock<Result<Regex, regex::Error>>,
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex == other.regex && self.gbnf == other.gbnf && self.max_tokens == other.max_tokens
    }
}

impl Eq for Pattern {}

impl Pattern {
    /// Create a pattern from a regex and its GBNF expression.
    pub fn new(regex: impl Into<String>, gbnf: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            gbnf: gbnf.into(),
            max_tokens: None,
            anchored: OnceLock::new(),
        }
    }

    /// Unanchored regular expression.
    #[must_use]
    pub fn regex(&self) -> &str {
        &self.regex
    }

    /// GBNF expression matching the same language.
    #[must_use]
    pub fn gbnf(&self) -> &str {
        &self.gbnf
    }

    /// The anchored, full-match regex, compiled once.
    pub fn anchored(&self) -> Result<&Regex, &regex::Error> {
        self.anchored
            .get_or_init(|| Regex::new(&format!("^(?:{})$", self.regex)))
            .as_ref()
    }

    /// Whether `text` matches the pattern in full.
    pub fn matches(&self, text: &str) -> Result<bool, regex::Error> {
        self.anchored()
            .map(|re| re.is_match(text))
            .map_err(Clone::clone)
    }

    /// Signed integer that fits in an `i64`.
    #[must_use]
    pub fn integer() -> Self {
        static INTEGER: OnceLock<Pattern> = OnceLock::new();
        shared(&INTEGER, || {
            Self::new(
                r"-?(?:0|[1-9][0-9]{0,17})",
                r#""-"? ("0" | [1-9] [0-9]{0,17})"#,
            )
        })
    }

    /// Signed decimal with a mandatory fractional part.
    #[must_use]
    pub fn float() -> Self {
        static FLOAT: OnceLock<Pattern> = OnceLock::new();
        shared(&FLOAT, || Self::new(r"-?[0-9]+\.[0-9]+", r#""-"? [0-9]+ "." [0-9]+"#))
    }

    /// `true` or `false`.
    #[must_use]
    pub fn boolean() -> Self {
        static BOOLEAN: OnceLock<Pattern> = OnceLock::new();
        shared(&BOOLEAN, || Self::new("true|false", r#""true" | "false""#))
    }

    /// Non-empty double-quoted text with JSON escapes.
    #[must_use]
    pub fn quoted_text() -> Self {
        static QUOTED_TEXT: OnceLock<Pattern> = OnceLock::new();
        shared(&QUOTED_TEXT, || {
            Self::new(
                format!(r#""(?:{})+""#, TEXT_CHAR_REGEX),
                format!(r#""\"" ({})+ "\"""#, TEXT_CHAR_GBNF),
            )
        })
    }

    /// Set the token cap.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Clone of a built-in pattern whose regex was compiled once per process.
fn shared(cell: &'static OnceLock<Pattern>, build: impl FnOnce() -> Pattern) -> Pattern {
    cell.get_or_init(|| {
        let pattern = build();
        let _ = pattern.anchored();
        pattern
    })
    .clone()
}

/// Restriction on the text a runtime may produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Text matching a regular pattern.
    Pattern(Pattern),
    /// Exactly one of the listed literals, matched in full.
    Choice {
        /// Allowed literals, in declaration order.
        options: Vec<String>,
    },
    /// Either text satisfying `inner` or the literal `sentinel`.
    Either {
        /// Constraint for the present case.
        inner: Box<Constraint>,
        /// Literal marking the alternative case.
        sentinel: String,
    },
    /// Text satisfying at least one of the alternatives.
    AnyOf {
        /// Alternatives, in declaration order.
        alternatives: Vec<Constraint>,
    },
}

impl Constraint {
    /// Create an exclusive alternation of literals.
    pub fn choice<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choice {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a disjunction of `inner` and a sentinel literal.
    pub fn either(inner: Constraint, sentinel: impl Into<String>) -> Self {
        Self::Either {
            inner: Box::new(inner),
            sentinel: sentinel.into(),
        }
    }

    /// Create a disjunction of several constraints.
    pub fn any_of(alternatives: impl IntoIterator<Item = Constraint>) -> Self {
        Self::AnyOf {
            alternatives: alternatives.into_iter().collect(),
        }
    }

    /// Literals allowed by a `Choice`.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::Choice { options } => Some(options),
            _ => None,
        }
    }

    /// Token cap for the request, if any.
    #[must_use]
    pub fn max_tokens(&self) -> Option<u32> {
        match self {
            Self::Pattern(pattern) => pattern.max_tokens,
            Self::Choice { .. } => None,
            Self::Either { inner, .. } => inner.max_tokens(),
            Self::AnyOf { alternatives } => alternatives.iter().filter_map(Self::max_tokens).max(),
        }
    }

    /// Unanchored regular expression for this constraint.
    #[must_use]
    pub fn to_regex(&self) -> String {
        match self {
            Self::Pattern(pattern) => pattern.regex.clone(),
            Self::AnyOf { alternatives } => alternatives
                .iter()
                .map(|alternative| format!("(?:{})", alternative.to_regex()))
                .collect::<Vec<_>>()
                .join("|"),
            Self::Choice { options } => options
                .iter()
                .map(|option| regex::escape(option))
                .collect::<Vec<_>>()
                .join("|"),
            Self::Either { inner, sentinel } => {
                format!("(?:{})|{}", inner.to_regex(), regex::escape(sentinel))
            }
        }
    }

    /// Compile an anchored, full-match regex.
    pub fn compile_regex(&self) -> Result<Regex, regex::Error> {
        Regex::new(&format!("^(?:{})$", self.to_regex()))
    }

    /// Whether `text` satisfies the constraint as a whole.
    ///
    /// Fails only when a pattern does not compile.
    pub fn matches(&self, text: &str) -> Result<bool, regex::Error> {
        match self {
            Self::Choice { options } => Ok(options.iter().any(|option| option == text)),
            Self::Either { inner, sentinel } => {
                Ok(text == sentinel || inner.matches(text)?)
            }
            Self::Pattern(pattern) => pattern.matches(text),
            Self::AnyOf { alternatives } => {
                for alternative in alternatives {
                    if alternative.matches(text)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Like [`Constraint::matches`], treating an invalid pattern as
    /// matching nothing.
    #[must_use]
    pub fn is_satisfied_by(&self, text: &str) -> bool {
        self.matches(text).unwrap_or(false)
    }

    /// GBNF expression for this constraint, without a rule name.
    #[must_use]
    pub fn to_gbnf_expr(&self) -> String {
        match self {
            Self::Pattern(pattern) => pattern.gbnf.clone(),
            Self::Choice { options } => options
                .iter()
                .map(|option| gbnf_literal(option))
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Either { inner, sentinel } => {
                format!("({}) | {}", inner.to_gbnf_expr(), gbnf_literal(sentinel))
            }
            Self::AnyOf { alternatives } => alternatives
                .iter()
                .map(|alternative| format!("({})", alternative.to_gbnf_expr()))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    /// Complete GBNF grammar with a `root` rule.
    #[must_use]
    pub fn to_gbnf(&self) -> String {
        format!("root ::= {}\n", self.to_gbnf_expr())
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(pattern) => write!(f, "/{}/", pattern.regex),
            Self::Choice { options } => write!(f, "one of {:?}", options),
            Self::Either { inner, sentinel } => write!(f, "{} or {:?}", inner, sentinel),
            Self::AnyOf { alternatives } => {
                let rendered: Vec<_> = alternatives.iter().map(ToString::to_string).collect();
                write!(f, "any of [{}]", rendered.join(", "))
            }
        }
    }
}

/// Quote a literal for use in a GBNF grammar.
#[must_use]
pub fn gbnf_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
