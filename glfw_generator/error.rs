////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{error, fmt, io, path::PathBuf};

/// Everything that can abort a generation run.
///
/// None of these are recoverable: the generator either produces the whole binding or nothing.
#[derive(Debug)]
pub enum Error {
    /// A `/*` without a closing `*/`.
    UnterminatedComment { line: String },
    /// A `"` without a closing `"`.
    UnterminatedString { line: String },
    /// A character outside of the declaration alphabet. `column` counts characters from 0.
    UnexpectedCharacter { ch: char, column: usize, line: String },
    /// A declaration rule required a token that was not there.
    Grammar { expected: String, found: String, line: String },
    /// The documentation no longer has the shape the scraper relies on.
    Structure { page: String, message: String },
    /// A documentation page is not well-formed XHTML.
    Markup { page: String, message: String },
    Io { path: PathBuf, source: io::Error },
}

impl Error {
    pub(crate) fn structure(page: &str, message: impl Into<String>) -> Error {
        Error::Structure {
            page: page.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnterminatedComment { line } => write!(f, "unterminated block comment in `{}`", line),
            Error::UnterminatedString { line } => write!(f, "unterminated string literal in `{}`", line),
            Error::UnexpectedCharacter { ch, column, line } => {
                write!(f, "unexpected character '{}' at column {} in `{}`", ch, column, line)
            },
            Error::Grammar { expected, found, line } => {
                write!(f, "expected {}, got {} in `{}`", expected, found, line)
            },
            Error::Structure { page, message } => write!(f, "{}: {}", page, message),
            Error::Markup { page, message } => write!(f, "{}: malformed markup: {}", page, message),
            Error::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
