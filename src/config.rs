//! Loads the site configuration from an `inkpot.yaml` project file, e.g.:
//!
//! ```yaml
//! site_root: https://example.org/
//! templates:
//!   index: html/templates/index.html
//!   archive: html/templates/archive.html
//!   article: html/templates/article.html
//! partials:
//!   - key: M_NAVIGATION_BAR
//!     path: html/navigation_bar.html
//!   - key: M_COPYRIGHT
//!     path: html/copyright.html
//! ```
//!
//! Relative paths are resolved against the directory containing the project
//! file.

use crate::macros::{check_key, Macro};
use crate::util::open;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "inkpot.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct Templates {
    index: PathBuf,
    archive: PathBuf,
    article: PathBuf,
}

#[derive(Deserialize)]
struct Partial {
    key: String,
    path: PathBuf,
}

#[derive(Deserialize)]
struct Project {
    site_root: Url,

    #[serde(default = "default_articles_directory")]
    articles_directory: PathBuf,

    #[serde(default = "default_article_contents_directory")]
    article_contents_directory: PathBuf,

    templates: Templates,

    #[serde(default)]
    partials: Vec<Partial>,

    #[serde(default = "default_latest_articles")]
    latest_articles: usize,

    #[serde(default = "default_latest_columns")]
    latest_columns: usize,

    #[serde(default)]
    archive_page_size: PageSize,
}

fn default_articles_directory() -> PathBuf {
    PathBuf::from("articles")
}

fn default_article_contents_directory() -> PathBuf {
    PathBuf::from("html/articles")
}

fn default_latest_articles() -> usize {
    4
}

fn default_latest_columns() -> usize {
    2
}

/// Everything [`crate::build::build_site`] needs to know about a site. All
/// paths are resolved.
#[derive(Clone, Debug)]
pub struct Config {
    /// The URL the output directory is served from. Always ends in `/`.
    pub site_root: Url,

    /// Holds `articles.json` and the per-article metadata files.
    pub articles_directory: PathBuf,

    /// Holds each article's body as `{id}.html`.
    pub article_contents_directory: PathBuf,

    pub index_template: PathBuf,
    pub archive_template: PathBuf,
    pub article_template: PathBuf,

    /// File-sourced macros applied to every page before its own macros.
    pub partials: Vec<Macro>,

    /// The directory that pages are written into.
    pub output_directory: PathBuf,

    /// The number of articles shown on the index page, newest first.
    pub latest_articles: usize,

    /// The number of articles per row on the index page.
    pub latest_columns: usize,

    /// The number of articles per archive page.
    pub archive_page_size: usize,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a project file and
    /// loads the first one found. See [`Config::from_project_file`].
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let dir = dir
            .canonicalize()
            .with_context(|| format!("Resolving project directory `{}`", dir.display()))?;
        let path = find_project_file(&dir)?;
        match Config::from_project_file(&path, output_directory) {
            Ok(config) => Ok(config),
            Err(e) => Err(anyhow!("Loading configuration: {:#}", e)),
        }
    }

    /// Loads the project file at `path`. Pages are written into
    /// `output_directory` if given and into the project directory otherwise.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)
            .map_err(|e| anyhow!("Parsing project file `{}`: {}", path.display(), e))?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => {
                let config = Config {
                    site_root: with_trailing_slash(project.site_root),
                    articles_directory: project_root.join(project.articles_directory),
                    article_contents_directory: project_root
                        .join(project.article_contents_directory),
                    index_template: project_root.join(project.templates.index),
                    archive_template: project_root.join(project.templates.archive),
                    article_template: project_root.join(project.templates.article),
                    partials: project
                        .partials
                        .into_iter()
                        .map(|p| Macro::file(p.key, project_root.join(p.path)))
                        .collect(),
                    output_directory: match output_directory {
                        Some(dir) => dir.to_owned(),
                        None => project_root.to_owned(),
                    },
                    latest_articles: project.latest_articles,
                    latest_columns: project.latest_columns,
                    archive_page_size: project.archive_page_size.0,
                };
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Checks the settings that page building depends on. Called when a
    /// project file is loaded and again by [`crate::build::build_site`].
    pub fn validate(&self) -> Result<()> {
        if self.archive_page_size < 1 {
            return Err(anyhow!("`archive_page_size` must be at least 1"));
        }

        // Index slots are named `M_PAGE_{row}{column}`, so rows and columns
        // must stay single digits for the keys to be unambiguous.
        if !(1..=9).contains(&self.latest_columns) {
            return Err(anyhow!("`latest_columns` must be between 1 and 9"));
        }
        if self.latest_articles > 9 * self.latest_columns {
            return Err(anyhow!(
                "`latest_articles` may be at most {} with {} columns",
                9 * self.latest_columns,
                self.latest_columns
            ));
        }

        for partial in &self.partials {
            if let Some(kind) = check_key(&partial.key) {
                return Err(anyhow!("partial `{}`: {:?}", partial.key, kind));
            }
        }
        Ok(())
    }
}

fn find_project_file(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(PROJECT_FILE);
    if path.exists() {
        Ok(path)
    } else {
        match dir.parent() {
            Some(parent) => find_project_file(parent),
            None => Err(anyhow!(
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            )),
        }
    }
}

// Without a trailing slash, [`Url::join`] treats the last path segment as a
// file name and replaces it.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
