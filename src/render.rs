//! The macro substitution engine. [`render`] loads a template, applies an
//! ordered list of [`Macro`]s to it, and writes the result to disk.
//!
//! Substitution is cascading: each macro replaces every occurrence of its key
//! in the output of the previous macro, so a later macro also rewrites any of
//! its keys that an earlier macro inserted. Macros are applied in exactly the
//! order they're given.

use crate::macros::{check_key, Macro, MacroValue, ParseError};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Renders the template at `template_path` into `destination_path`.
///
/// The template and any file-sourced macros are read fresh on every call. All
/// missing parent directories of `destination_path` are created. The output
/// is staged in a temporary file beside the destination and then moved over
/// it, so a failed render never leaves a partially written destination.
pub fn render<T: AsRef<Path>, D: AsRef<Path>>(
    template_path: T,
    destination_path: D,
    macros: &[Macro],
) -> Result<()> {
    check_keys(macros)?;
    let template = load_template(template_path.as_ref())?;
    let contents = substitute(&template, macros)?;
    persist(destination_path.as_ref(), &contents)
}

/// Applies `macros` to `template` in order and returns the result. Each
/// macro replaces every occurrence of its key in the current document.
pub fn substitute(template: &str, macros: &[Macro]) -> Result<String> {
    check_keys(macros)?;
    let mut document = template.to_owned();
    for m in macros {
        let value = resolve(m)?;
        document = document.replace(&m.key, &value);
    }
    Ok(document)
}

// An empty key matches between every pair of characters.
fn check_keys(macros: &[Macro]) -> Result<()> {
    for m in macros {
        if let Some(kind) = check_key(&m.key) {
            return Err(Error::MacroArgumentMalformed(ParseError {
                argument: match &m.value {
                    MacroValue::Literal(value) => format!("#{}={}", m.key, value),
                    MacroValue::File(path) => format!("${}={}", m.key, path.display()),
                },
                kind,
            }));
        }
    }
    Ok(())
}

fn load_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => Error::TemplateNotFound {
            path: path.to_owned(),
            err,
        },
        _ => Error::TemplateUnreadable {
            path: path.to_owned(),
            err,
        },
    })
}

fn resolve(m: &Macro) -> Result<Cow<'_, str>> {
    match &m.value {
        MacroValue::Literal(value) => Ok(Cow::Borrowed(value)),
        MacroValue::File(path) => match fs::read_to_string(path) {
            Ok(contents) => Ok(Cow::Owned(contents)),
            Err(err) => Err(match err.kind() {
                io::ErrorKind::NotFound => Error::MacroFileNotFound {
                    key: m.key.clone(),
                    path: path.clone(),
                    err,
                },
                _ => Error::MacroFileUnreadable {
                    key: m.key.clone(),
                    path: path.clone(),
                    err,
                },
            }),
        },
    }
}

fn persist(path: &Path, contents: &str) -> Result<()> {
    let annotate = |err: io::Error| Error::DestinationWrite {
        path: path.to_owned(),
        err,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(annotate)?;
        }
    }

    // Write through symlinks: the rename below would otherwise replace the
    // link itself.
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_owned());
    let directory = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(directory).map_err(annotate)?;
    staged.write_all(contents.as_bytes()).map_err(annotate)?;

    // Temporary files are created owner-only; keep the destination's mode if
    // it has one.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = match fs::metadata(&target) {
            Ok(metadata) => metadata.permissions(),
            Err(_) => fs::Permissions::from_mode(0o644),
        };
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(annotate)?;
    }

    staged.persist(&target).map_err(|e| annotate(e.error))?;
    Ok(())
}

/// The result of a fallible render operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed render. Every variant names the path (and, for macro
/// failures, the key) involved so the caller can report it.
#[derive(Debug)]
pub enum Error {
    /// Returned when the template file doesn't exist.
    TemplateNotFound { path: PathBuf, err: io::Error },

    /// Returned when the template file exists but can't be read (including
    /// when it isn't valid UTF-8).
    TemplateUnreadable { path: PathBuf, err: io::Error },

    /// Returned when a macro is malformed.
    MacroArgumentMalformed(ParseError),

    /// Returned when a file-sourced macro's file doesn't exist.
    MacroFileNotFound {
        key: String,
        path: PathBuf,
        err: io::Error,
    },

    /// Returned when a file-sourced macro's file can't be read.
    MacroFileUnreadable {
        key: String,
        path: PathBuf,
        err: io::Error,
    },

    /// Returned when the destination (or one of its directories) can't be
    /// written.
    DestinationWrite { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::TemplateNotFound { path, err } => {
                write!(f, "Could not find template file '{}': {}", path.display(), err)
            }
            Error::TemplateUnreadable { path, err } => {
                write!(f, "Could not read template file '{}': {}", path.display(), err)
            }
            Error::MacroArgumentMalformed(err) => err.fmt(f),
            Error::MacroFileNotFound { key, path, err } => write!(
                f,
                "Could not find file '{}' for macro `{}`: {}",
                path.display(),
                key,
                err
            ),
            Error::MacroFileUnreadable { key, path, err } => write!(
                f,
                "Could not read file '{}' for macro `{}`: {}",
                path.display(),
                key,
                err
            ),
            Error::DestinationWrite { path, err } => write!(
                f,
                "Could not write destination file '{}': {}",
                path.display(),
                err
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::TemplateNotFound { err, .. } => Some(err),
            Error::TemplateUnreadable { err, .. } => Some(err),
            Error::MacroArgumentMalformed(err) => Some(err),
            Error::MacroFileNotFound { err, .. } => Some(err),
            Error::MacroFileUnreadable { err, .. } => Some(err),
            Error::DestinationWrite { err, .. } => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts a [`ParseError`] into an [`Error`]. This allows us to use the
    /// `?` operator when parsing command-line macros.
    fn from(err: ParseError) -> Error {
        Error::MacroArgumentMalformed(err)
    }
}
