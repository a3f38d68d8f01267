//! Defines the [`Macro`] type, which names a placeholder in a template and
//! the value that replaces it. Also defines the command-line encoding of
//! macros (`#key=value` and `$key=path`) and its [`ParseError`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const SEPARATOR: char = '=';
const LITERAL_PREFIX: char = '#';
const FILE_PREFIX: char = '$';

/// The replacement for a macro key. A literal is used as-is; a file is read
/// at the time the macro is applied and its contents are used instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MacroValue {
    Literal(String),
    File(PathBuf),
}

/// A named placeholder and its replacement. Every occurrence of `key` in a
/// template is replaced (see [`crate::render::substitute`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Macro {
    /// The literal text to search for. Never empty.
    pub key: String,

    /// The text (or source of the text) that replaces `key`.
    pub value: MacroValue,
}

impl Macro {
    /// Creates a macro whose replacement is `value` verbatim.
    pub fn literal<K: Into<String>, V: Into<String>>(key: K, value: V) -> Macro {
        Macro {
            key: key.into(),
            value: MacroValue::Literal(value.into()),
        }
    }

    /// Creates a macro whose replacement is the contents of the file at
    /// `path`.
    pub fn file<K: Into<String>, P: AsRef<Path>>(key: K, path: P) -> Macro {
        Macro {
            key: key.into(),
            value: MacroValue::File(path.as_ref().to_owned()),
        }
    }
}

impl FromStr for Macro {
    type Err = ParseError;

    /// Parses a macro from its command-line form. `#key=value` is a literal
    /// macro and `$key=path` is a file-sourced macro. Leading `#` and `$`
    /// characters are not part of the key.
    fn from_str(s: &str) -> Result<Macro, ParseError> {
        let mut pieces = s.split(SEPARATOR);
        let (key, value) = match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(key), Some(value), None) => (key, value),
            _ => return Err(ParseError::new(s, ParseErrorKind::Separator)),
        };

        let is_file = if key.starts_with(LITERAL_PREFIX) {
            false
        } else if key.starts_with(FILE_PREFIX) {
            true
        } else {
            return Err(ParseError::new(s, ParseErrorKind::KeyType));
        };

        let key = key.trim_start_matches(&[LITERAL_PREFIX, FILE_PREFIX][..]);
        if let Some(kind) = check_key(key) {
            return Err(ParseError::new(s, kind));
        }

        Ok(match is_file {
            true => Macro::file(key, value),
            false => Macro::literal(key, value),
        })
    }
}

/// Checks that `key` can be used as a macro key: it must be non-empty and must
/// not contain the `#` or `$` prefixes.
pub fn check_key(key: &str) -> Option<ParseErrorKind> {
    if key.is_empty() {
        Some(ParseErrorKind::EmptyKey)
    } else if key.contains(&[LITERAL_PREFIX, FILE_PREFIX][..]) {
        Some(ParseErrorKind::KeyDelimiter)
    } else {
        None
    }
}

/// Parses every argument in `args` as a [`Macro`], preserving their order.
/// Fails on the first malformed argument.
pub fn parse_macros<I, S>(args: I) -> Result<Vec<Macro>, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().map(|arg| arg.as_ref().parse()).collect()
}

/// The ways a macro argument can be malformed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The argument didn't contain exactly one `=`.
    Separator,

    /// The key didn't start with `#` or `$`.
    KeyType,

    /// Nothing was left of the key after removing its `#`/`$` prefix.
    EmptyKey,

    /// The key contained `#` or `$` after its prefix.
    KeyDelimiter,
}

/// Returned when a command-line macro argument can't be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// The offending argument.
    pub argument: String,

    /// What was wrong with it.
    pub kind: ParseErrorKind,
}

impl ParseError {
    fn new(argument: &str, kind: ParseErrorKind) -> ParseError {
        ParseError {
            argument: argument.to_owned(),
            kind,
        }
    }
}

impl fmt::Display for ParseError {
    /// Displays a [`ParseError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let reason = match self.kind {
            ParseErrorKind::Separator => "there may be a single `=`",
            ParseErrorKind::KeyType => "key must start with `#` (literal) or `$` (file)",
            ParseErrorKind::EmptyKey => "key is empty",
            ParseErrorKind::KeyDelimiter => "key may not contain `#` or `$` after its prefix",
        };
        write!(f, "invalid macro `{}`: {}", self.argument, reason)
    }
}

impl std::error::Error for ParseError {}
