//! Defines the [`Article`] type and the logic for loading article metadata
//! from the articles directory. The directory holds an `articles.json` file
//! listing article IDs in publication order (oldest first) and one
//! `{id}.json` metadata file per article, e.g.:
//!
//! ```json
//! {
//!     "title": "Hello, world!",
//!     "preview": "The first article on this blog",
//!     "keywords": ["greet", "meta"],
//!     "date": { "day": 16, "month": "April", "year": 2021 },
//!     "last-modified": { "day": 2, "month": 5, "year": 2021 }
//! }
//! ```

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use std::convert::TryFrom;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// The name of the file that lists the articles in publication order.
pub const LISTING_FILE: &str = "articles.json";

/// The metadata for a single article.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Article {
    /// The article's ID. This is the base name of its metadata file and of its
    /// output page. It isn't part of the metadata file itself.
    #[serde(skip)]
    pub id: String,

    pub title: String,

    /// A short teaser shown on index and archive pages.
    pub preview: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// The publication date.
    pub date: Date,

    #[serde(rename = "last-modified")]
    pub last_modified: Date,
}

impl Article {
    /// The article's keywords as they're displayed on its page.
    pub fn keywords_text(&self) -> String {
        self.keywords.join(", ")
    }
}

/// A calendar date as written in article metadata. Displays as e.g.
/// `April 16, 2021`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Date {
    pub day: u32,
    pub month: Month,
    pub year: i32,
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}, {}", self.month, self.day, self.year)
    }
}

/// The name of a month. Metadata may give either the name itself (used
/// verbatim) or the month number, 1 through 12.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Month(pub String);

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Month, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u8),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Name(name) => Ok(Month(name)),
            Raw::Number(number) => match chrono::Month::try_from(number) {
                Ok(month) => Ok(Month(month.name().to_owned())),
                Err(_) => Err(D::Error::custom(format!(
                    "invalid month number {}; expected 1 through 12",
                    number
                ))),
            },
        }
    }
}

/// Loads every article listed in `{directory}/articles.json`, in listing
/// order. All IDs are validated before any metadata file is opened.
pub fn load_articles(directory: &Path) -> Result<Vec<Article>> {
    let ids = load_listing(directory)?;
    ids.iter().map(|id| load_article(directory, id)).collect()
}

/// Loads the list of article IDs from `{directory}/articles.json`.
pub fn load_listing(directory: &Path) -> Result<Vec<String>> {
    let ids: Vec<String> = read_json(&directory.join(LISTING_FILE))?;
    if let Some(id) = ids.iter().find(|id| !is_valid_id(id)) {
        return Err(Error::InvalidArticleId(id.clone()));
    }
    Ok(ids)
}

/// Loads the metadata for the article `id` from `{directory}/{id}.json`.
pub fn load_article(directory: &Path, id: &str) -> Result<Article> {
    if !is_valid_id(id) {
        return Err(Error::InvalidArticleId(id.to_owned()));
    }
    let mut article: Article = read_json(&directory.join(format!("{}.json", id)))?;
    article.id = id.to_owned();
    Ok(article)
}

/// Article IDs become file names and URL path segments, so they must already
/// be slugs (e.g., `hello-world-2`).
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && slug::slugify(id) == id
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|err| Error::Json {
        path: path.to_owned(),
        err,
    })
}

/// Represents the result of loading article metadata.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading article metadata.
#[derive(Debug)]
pub enum Error {
    /// Returned when a metadata file can't be opened.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when a metadata file isn't valid JSON or is missing fields.
    Json {
        path: PathBuf,
        err: serde_json::Error,
    },

    /// Returned when an article ID isn't a slug.
    InvalidArticleId(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => {
                write!(f, "Opening article file '{}': {}", path.display(), err)
            }
            Error::Json { path, err } => {
                write!(f, "Parsing article file '{}': {}", path.display(), err)
            }
            Error::InvalidArticleId(id) => write!(
                f,
                "invalid article id `{}`: ids must be lowercase words separated by `-`",
                id
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { err, .. } => Some(err),
            Error::Json { err, .. } => Some(err),
            Error::InvalidArticleId(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    const HELLO: &str = r#"{
        "title": "Hello, world!",
        "preview": "The first article",
        "keywords": ["greet", "meta"],
        "date": { "day": 16, "month": "April", "year": 2021 },
        "last-modified": { "day": 2, "month": 5, "year": 2021 }
    }"#;

    #[test]
    fn test_load_article() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("hello-world.json"), HELLO)?;
        let article = load_article(dir.path(), "hello-world")?;
        assert_eq!("hello-world", article.id);
        assert_eq!("Hello, world!", article.title);
        assert_eq!("April 16, 2021", article.date.to_string());
        assert_eq!("May 2, 2021", article.last_modified.to_string());
        assert_eq!("greet, meta", article.keywords_text());
        Ok(())
    }

    #[test]
    fn test_load_articles_in_listing_order() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(LISTING_FILE), r#"["second", "first"]"#)?;
        fs::write(dir.path().join("first.json"), HELLO)?;
        fs::write(dir.path().join("second.json"), HELLO)?;
        let ids: Vec<String> = load_articles(dir.path())?
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(vec!["second", "first"], ids);
        Ok(())
    }

    #[test]
    fn test_invalid_id_is_rejected_before_loading() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(LISTING_FILE), r#"["ok", "../escape"]"#)?;
        match load_articles(dir.path()) {
            Err(Error::InvalidArticleId(id)) => assert_eq!("../escape", id),
            other => panic!("wanted InvalidArticleId; found {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_article_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        match load_article(dir.path(), "missing") {
            Err(Error::Io { path, .. }) => assert_eq!(dir.path().join("missing.json"), path),
            other => panic!("wanted Io; found {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_month_number_out_of_range() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("late.json"),
            HELLO.replace("\"month\": 5", "\"month\": 13"),
        )?;
        match load_article(dir.path(), "late") {
            Err(Error::Json { .. }) => {}
            other => panic!("wanted Json; found {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_month_from_name_or_number() -> std::result::Result<(), serde_json::Error> {
        assert_eq!(Month(String::from("March")), serde_json::from_str::<Month>("3")?);
        assert_eq!(Month(String::from("Mar.")), serde_json::from_str::<Month>("\"Mar.\"")?);
        assert!(serde_json::from_str::<Month>("0").is_err());
        Ok(())
    }

    #[test]
    fn test_keywords_default_to_empty() -> std::result::Result<(), serde_json::Error> {
        let article: Article = serde_json::from_str(
            r#"{
                "title": "t",
                "preview": "p",
                "date": { "day": 1, "month": 1, "year": 2000 },
                "last-modified": { "day": 1, "month": "Jan", "year": 2000 }
            }"#,
        )?;
        assert_eq!("", article.keywords_text());
        assert_eq!("January 1, 2000", article.date.to_string());
        assert_eq!("Jan 1, 2000", article.last_modified.to_string());
        Ok(())
    }
}
