/// What went wrong on a given line.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ParseErrorKind {
    /// A `# HELP` or `# TYPE` line without a metric name.
    #[error("metadata line is missing its metric name")]
    MalformedMetadataLine,

    #[error("invalid identifier «{0}»")]
    InvalidIdentifier(String),

    #[error("invalid value «{0}»")]
    InvalidValue(String),

    #[error("duplicate label «{0}»")]
    DuplicateLabel(String),

    /// The line ended inside a quoted label value, an escape sequence, or a label list.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
}

/// Indicates that the exposition text could not be parsed.  Carries the 1-based line number and
/// the raw text of the offending line.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("line {line}: {kind}: {text}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub text: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, text: &str) -> Self {
        Self {
            kind,
            line,
            text: text.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Indicates that an error occurred while reading or parsing an exposition stream
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("couldn't read exposition: {0}")]
    Io(#[from] std::io::Error),
}
