//! Template compiler.
//!
//! # Responsibility
//! - Split template text into literal fragments and typed placeholders.
//! - Reject malformed templates with the offending fragment and its byte
//!   position.
//!
//! # Invariants
//! - Literal fragments are preserved verbatim and in order.
//! - Exactly one `SEQ` placeholder per template.
//! - `SEQ` width lies in `1..=MAX_SEQUENCE_WIDTH`.

use crate::template::period::PeriodGranularity;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Padding width used by a bare `{{SEQ}}`.
pub const DEFAULT_SEQUENCE_WIDTH: usize = 4;
/// Largest accepted `{{SEQ:n}}` width.
pub const MAX_SEQUENCE_WIDTH: usize = 10;

const OPEN_DELIMITER: &str = "{{";
const CLOSE_DELIMITER: &str = "}}";

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)\s*(?::(.*))?$").expect("valid placeholder regex"));

/// Typed substitution inside a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `{{YYYY}}`: four-digit year.
    Year4,
    /// `{{YY}}`: two-digit year.
    Year2,
    /// `{{MM}}`: two-digit month.
    Month,
    /// `{{DD}}`: two-digit day of month.
    Day,
    /// `{{SEQ}}` or `{{SEQ:n}}`: zero-padded running sequence.
    Sequence { width: usize },
    /// `{{TENANT}}`: short tenant code supplied by the caller.
    TenantCode,
}

impl Placeholder {
    /// Name as written in template text.
    pub fn name(self) -> &'static str {
        match self {
            Self::Year4 => "YYYY",
            Self::Year2 => "YY",
            Self::Month => "MM",
            Self::Day => "DD",
            Self::Sequence { .. } => "SEQ",
            Self::TenantCode => "TENANT",
        }
    }
}

/// One compiled template fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateToken {
    Literal(String),
    Placeholder(Placeholder),
}

/// Validated, immutable template ready for rendering.
///
/// Cheap to share behind an `Arc`; nothing in it changes after
/// `compile_template` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    source: String,
    tokens: Vec<TemplateToken>,
    sequence_width: usize,
    granularity: PeriodGranularity,
}

impl CompiledTemplate {
    /// Original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[TemplateToken] {
        &self.tokens
    }

    /// Minimum rendered width of the sequence value.
    pub fn sequence_width(&self) -> usize {
        self.sequence_width
    }

    /// Finest date unit present, which decides when the sequence resets.
    pub fn granularity(&self) -> PeriodGranularity {
        self.granularity
    }

    /// Returns whether the template renders a caller-supplied tenant code.
    pub fn uses_tenant_code(&self) -> bool {
        self.tokens
            .iter()
            .any(|token| matches!(token, TemplateToken::Placeholder(Placeholder::TenantCode)))
    }
}

/// Compile-time template defects.
///
/// `position` is the byte offset of the `{{` or `}}` that starts the
/// offending fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateCompileError {
    UnmatchedOpen { position: usize },
    UnmatchedClose { position: usize },
    EmptyPlaceholder { position: usize },
    UnknownPlaceholder { name: String, position: usize },
    UnexpectedArgument {
        name: &'static str,
        argument: String,
        position: usize,
    },
    InvalidSequenceWidth { argument: String, position: usize },
    MissingSequence,
    DuplicateSequence { position: usize },
}

impl Display for TemplateCompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmatchedOpen { position } => {
                write!(f, "unmatched `{{{{` at position {position}")
            }
            Self::UnmatchedClose { position } => {
                write!(f, "unmatched `}}}}` at position {position}")
            }
            Self::EmptyPlaceholder { position } => {
                write!(f, "empty placeholder at position {position}")
            }
            Self::UnknownPlaceholder { name, position } => write!(
                f,
                "unknown placeholder `{name}` at position {position}; expected YYYY|YY|MM|DD|SEQ|TENANT"
            ),
            Self::UnexpectedArgument {
                name,
                argument,
                position,
            } => write!(
                f,
                "placeholder `{name}` at position {position} takes no argument, got `{argument}`"
            ),
            Self::InvalidSequenceWidth { argument, position } => write!(
                f,
                "invalid SEQ width `{argument}` at position {position}; expected an integer in 1..={MAX_SEQUENCE_WIDTH}"
            ),
            Self::MissingSequence => {
                write!(f, "template must contain one `{{{{SEQ}}}}` placeholder")
            }
            Self::DuplicateSequence { position } => write!(
                f,
                "second `SEQ` placeholder at position {position}; exactly one is allowed"
            ),
        }
    }
}

impl Error for TemplateCompileError {}

/// Compiles template text into a `CompiledTemplate`.
///
/// # Errors
/// - Unmatched `{{` / `}}`, empty or unknown placeholders.
/// - Arguments on placeholders other than `SEQ`, or a bad `SEQ` width.
/// - Zero or several `SEQ` placeholders.
pub fn compile_template(text: &str) -> Result<CompiledTemplate, TemplateCompileError> {
    let mut tokens = Vec::new();
    let mut sequence_width = None;
    let mut cursor = 0;

    loop {
        let rest = &text[cursor..];
        let open = rest.find(OPEN_DELIMITER);
        let close = rest.find(CLOSE_DELIMITER);

        let (open, close) = match (open, close) {
            (None, None) => {
                push_literal(&mut tokens, rest);
                break;
            }
            (None, Some(close)) => {
                return Err(TemplateCompileError::UnmatchedClose {
                    position: cursor + close,
                })
            }
            (Some(open), None) => {
                return Err(TemplateCompileError::UnmatchedOpen {
                    position: cursor + open,
                })
            }
            (Some(open), Some(close)) if close < open => {
                return Err(TemplateCompileError::UnmatchedClose {
                    position: cursor + close,
                })
            }
            (Some(open), Some(close)) => (cursor + open, cursor + close),
        };

        let inner = &text[open + OPEN_DELIMITER.len()..close];
        if inner.contains(OPEN_DELIMITER) {
            return Err(TemplateCompileError::UnmatchedOpen { position: open });
        }

        push_literal(&mut tokens, &text[cursor..open]);
        let placeholder = parse_placeholder(inner, open)?;
        if let Placeholder::Sequence { width } = placeholder {
            if sequence_width.is_some() {
                return Err(TemplateCompileError::DuplicateSequence { position: open });
            }
            sequence_width = Some(width);
        }
        tokens.push(TemplateToken::Placeholder(placeholder));
        cursor = close + CLOSE_DELIMITER.len();
    }

    let sequence_width = sequence_width.ok_or(TemplateCompileError::MissingSequence)?;
    let granularity = PeriodGranularity::of_tokens(&tokens);

    Ok(CompiledTemplate {
        source: text.to_string(),
        tokens,
        sequence_width,
        granularity,
    })
}

fn push_literal(tokens: &mut Vec<TemplateToken>, fragment: &str) {
    if !fragment.is_empty() {
        tokens.push(TemplateToken::Literal(fragment.to_string()));
    }
}

fn parse_placeholder(inner: &str, position: usize) -> Result<Placeholder, TemplateCompileError> {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return Err(TemplateCompileError::EmptyPlaceholder { position });
    }

    let captures =
        PLACEHOLDER_RE
            .captures(trimmed)
            .ok_or_else(|| TemplateCompileError::UnknownPlaceholder {
                name: trimmed.to_string(),
                position,
            })?;
    let name = captures.get(1).map_or("", |m| m.as_str());
    let argument = captures.get(2).map(|m| m.as_str().trim());

    let placeholder = match name {
        "YYYY" => Placeholder::Year4,
        "YY" => Placeholder::Year2,
        "MM" => Placeholder::Month,
        "DD" => Placeholder::Day,
        "TENANT" => Placeholder::TenantCode,
        "SEQ" => {
            return Ok(Placeholder::Sequence {
                width: parse_sequence_width(argument, position)?,
            })
        }
        other => {
            return Err(TemplateCompileError::UnknownPlaceholder {
                name: other.to_string(),
                position,
            })
        }
    };

    if let Some(argument) = argument {
        return Err(TemplateCompileError::UnexpectedArgument {
            name: placeholder.name(),
            argument: argument.to_string(),
            position,
        });
    }
    Ok(placeholder)
}

fn parse_sequence_width(
    argument: Option<&str>,
    position: usize,
) -> Result<usize, TemplateCompileError> {
    let Some(argument) = argument else {
        return Ok(DEFAULT_SEQUENCE_WIDTH);
    };

    Some(argument)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<usize>().ok())
        .filter(|width| (1..=MAX_SEQUENCE_WIDTH).contains(width))
        .ok_or_else(|| TemplateCompileError::InvalidSequenceWidth {
            argument: argument.to_string(),
            position,
        })
}
