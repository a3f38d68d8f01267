//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: loading the article metadata
//! ([`crate::article`]) and rendering the index page, the archive pages, and
//! one page per article ([`crate::render`]).
//!
//! Every page is a single [`render`] call. The first failure stops the build;
//! pages written before it are left in place.

use crate::article::{self, Article, Error as ArticleError};
use crate::config::Config;
use crate::listing::{article_summary, page_count, pagination_item};
use crate::macros::Macro;
use crate::render::{render, Error as RenderError};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Builds the site from a [`Config`] object. Pages are written into
/// `config.output_directory` in this order: `index.html`, `archive{n}.html`,
/// and `pages/{id}.html`.
pub fn build_site(config: &Config) -> Result<()> {
    config.validate().map_err(Error::Config)?;
    let articles = article::load_articles(&config.articles_directory)?;
    debug!(
        "Loaded {} articles from '{}'",
        articles.len(),
        config.articles_directory.display()
    );

    let site = Site { config };
    site.build_index(&articles)?;
    site.build_archive(&articles)?;
    site.build_pages(&articles)?;
    Ok(())
}

struct Site<'a> {
    config: &'a Config,
}

impl Site<'_> {
    /// Renders `index.html` with the most recent articles, newest first. The
    /// article at position `i` fills the slot `M_PAGE_{row}{column}`; slots
    /// without an article are emptied.
    fn build_index(&self, articles: &[Article]) -> Result<()> {
        debug!("Building index page");
        let mut latest = articles.iter().rev();
        let mut macros = Vec::with_capacity(self.config.latest_articles);
        for slot in 0..self.config.latest_articles {
            let key = format!(
                "M_PAGE_{}{}",
                slot / self.config.latest_columns + 1,
                slot % self.config.latest_columns + 1
            );
            macros.push(match latest.next() {
                Some(article) => {
                    Macro::literal(key, article_summary(article, &self.article_url(article)?))
                }
                None => Macro::literal(key, ""),
            });
        }

        self.write_page(
            &self.config.index_template,
            &self.config.output_directory.join("index.html"),
            macros,
        )
    }

    /// Renders `archive{n}.html` for each page of `archive_page_size`
    /// articles, in listing order.
    fn build_archive(&self, articles: &[Article]) -> Result<()> {
        let total_pages = page_count(articles.len(), self.config.archive_page_size);
        debug!("Building {} archive pages", total_pages);

        let urls = (1..=total_pages)
            .map(|number| self.archive_url(number))
            .collect::<Result<Vec<Url>>>()?;

        for (i, chunk) in articles.chunks(self.config.archive_page_size).enumerate() {
            let summaries = chunk
                .iter()
                .map(|article| Ok(article_summary(article, &self.article_url(article)?)))
                .collect::<Result<Vec<String>>>()?;
            let pagination: Vec<String> = urls
                .iter()
                .enumerate()
                .map(|(j, url)| pagination_item(j + 1, i == j, url))
                .collect();

            self.write_page(
                &self.config.archive_template,
                &self
                    .config
                    .output_directory
                    .join(format!("archive{}.html", i + 1)),
                vec![
                    Macro::literal("M_ARTICLES", summaries.join("\n")),
                    Macro::literal("M_PAGINATION", pagination.join("\n")),
                ],
            )?;
        }
        Ok(())
    }

    /// Renders `pages/{id}.html` for every article.
    fn build_pages(&self, articles: &[Article]) -> Result<()> {
        debug!("Building {} article pages", articles.len());
        for article in articles {
            self.write_page(
                &self.config.article_template,
                &self
                    .config
                    .output_directory
                    .join("pages")
                    .join(format!("{}.html", article.id)),
                vec![
                    Macro::literal("M_TITLE", article.title.as_str()),
                    Macro::literal("M_DATE", article.date.to_string()),
                    Macro::literal("M_KEYWORDS", article.keywords_text()),
                    Macro::literal("M_LAST_MODIFIED", article.last_modified.to_string()),
                    Macro::file(
                        "M_CONTENTS",
                        self.config
                            .article_contents_directory
                            .join(format!("{}.html", article.id)),
                    ),
                ],
            )?;
        }
        Ok(())
    }

    /// Renders a single page. The configured partials are applied before
    /// `macros`.
    fn write_page(&self, template: &Path, destination: &Path, macros: Vec<Macro>) -> Result<()> {
        let mut all = self.config.partials.clone();
        all.extend(macros);
        render(template, destination, &all).map_err(|err| Error::Render {
            page: destination.to_owned(),
            err,
        })?;
        info!("Wrote '{}'", destination.display());
        Ok(())
    }

    fn article_url(&self, article: &Article) -> Result<Url> {
        Ok(self
            .config
            .site_root
            .join(&format!("pages/{}.html", article.id))?)
    }

    fn archive_url(&self, number: usize) -> Result<Url> {
        Ok(self
            .config
            .site_root
            .join(&format!("archive{}.html", number))?)
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during loading article
/// metadata, building URLs, or rendering pages.
#[derive(Debug)]
pub enum Error {
    /// Returned when the configuration isn't usable for building pages.
    Config(anyhow::Error),

    /// Returned for errors loading article metadata.
    Article(ArticleError),

    /// Returned when an article or archive URL can't be built.
    UrlParse(url::ParseError),

    /// Returned when a page can't be rendered.
    Render { page: PathBuf, err: RenderError },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(err) => write!(f, "Invalid configuration: {:#}", err),
            Error::Article(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Render { page, err } => {
                write!(f, "Building page '{}': {}", page.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(&**err),
            Error::Article(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Render { page: _, err } => Some(err),
        }
    }
}

impl From<ArticleError> for Error {
    /// Converts [`ArticleError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: ArticleError) -> Error {
        Error::Article(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    /// Lays out a small site with `count` articles named `article-{n}`, oldest
    /// first.
    fn site(root: &Path, count: usize) -> std::io::Result<Config> {
        let articles = root.join("articles");
        let contents = root.join("html").join("articles");
        let templates = root.join("html").join("templates");
        fs::create_dir_all(&articles)?;
        fs::create_dir_all(&contents)?;
        fs::create_dir_all(&templates)?;

        let ids: Vec<String> = (1..=count).map(|n| format!("article-{}", n)).collect();
        fs::write(
            articles.join("articles.json"),
            serde_json::to_string(&ids)?,
        )?;
        for (n, id) in ids.iter().enumerate() {
            fs::write(
                articles.join(format!("{}.json", id)),
                format!(
                    r#"{{
                        "title": "Title {n}",
                        "preview": "Preview {n}",
                        "keywords": ["rust", "blog"],
                        "date": {{ "day": {day}, "month": 1, "year": 2024 }},
                        "last-modified": {{ "day": {day}, "month": "February", "year": 2024 }}
                    }}"#,
                    n = n + 1,
                    day = n + 1,
                ),
            )?;
            fs::write(
                contents.join(format!("{}.html", id)),
                format!("<p>Body of M_TITLE ({})</p>", id),
            )?;
        }

        fs::write(root.join("html").join("nav.html"), "<nav/>")?;
        fs::write(
            templates.join("index.html"),
            "M_NAV|M_PAGE_11|M_PAGE_12|M_PAGE_21|M_PAGE_22",
        )?;
        fs::write(templates.join("archive.html"), "M_NAV\nM_ARTICLES\n--\nM_PAGINATION")?;
        fs::write(
            templates.join("article.html"),
            "M_NAV<h1>M_TITLE</h1><p>M_DATE / M_LAST_MODIFIED</p><p>M_KEYWORDS</p>M_CONTENTS",
        )?;

        Ok(Config {
            site_root: Url::parse("https://example.org/")
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?,
            articles_directory: articles,
            article_contents_directory: contents,
            index_template: templates.join("index.html"),
            archive_template: templates.join("archive.html"),
            article_template: templates.join("article.html"),
            partials: vec![Macro::file("M_NAV", root.join("html").join("nav.html"))],
            output_directory: root.join("out"),
            latest_articles: 4,
            latest_columns: 2,
            archive_page_size: 10,
        })
    }

    #[test]
    fn test_build_site() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = site(dir.path(), 12)?;
        build_site(&config)?;

        let out = &config.output_directory;
        let index = fs::read_to_string(out.join("index.html"))?;
        let slots: Vec<&str> = index.split('|').collect();
        assert_eq!("<nav/>", slots[0]);
        assert!(slots[1].contains("Title 12"));
        assert!(slots[2].contains("Title 11"));
        assert!(slots[3].contains("Title 10"));
        assert!(slots[4].contains("Title 9"));
        assert!(slots[1].contains("https://example.org/pages/article-12.html"));

        let first = fs::read_to_string(out.join("archive1.html"))?;
        assert!(first.starts_with("<nav/>\n"));
        assert_eq!(10, first.matches("pages-item").count());
        assert!(first.contains("Title 1<"));
        assert!(first.contains(
            "<li class=\"active\">\n    <a class=\"page-link\" href=\"https://example.org/archive1.html\">1</a>"
        ));
        assert!(first.contains(
            "<li >\n    <a class=\"page-link\" href=\"https://example.org/archive2.html\">2</a>"
        ));

        let second = fs::read_to_string(out.join("archive2.html"))?;
        assert_eq!(2, second.matches("pages-item").count());
        assert!(second.contains("<li class=\"active\">\n    <a class=\"page-link\" href=\"https://example.org/archive2.html\">2</a>"));
        assert!(!out.join("archive3.html").exists());

        assert_eq!(
            "<nav/><h1>Title 3</h1><p>January 3, 2024 / February 3, 2024</p><p>rust, blog</p><p>Body of M_TITLE (article-3)</p>",
            fs::read_to_string(out.join("pages").join("article-3.html"))?
        );
        Ok(())
    }

    #[test]
    fn test_index_with_fewer_articles_than_slots() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = site(dir.path(), 1)?;
        build_site(&config)?;
        let index = fs::read_to_string(config.output_directory.join("index.html"))?;
        let slots: Vec<&str> = index.split('|').collect();
        assert!(slots[1].contains("Title 1"));
        assert_eq!(vec!["", "", ""], slots[2..].to_vec());
        Ok(())
    }

    #[test]
    fn test_no_articles() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = site(dir.path(), 0)?;
        build_site(&config)?;
        assert_eq!(
            "<nav/>||||",
            fs::read_to_string(config.output_directory.join("index.html"))?
        );
        assert!(!config.output_directory.join("archive1.html").exists());
        Ok(())
    }

    #[test]
    fn test_stops_at_first_failure() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = site(dir.path(), 3)?;
        fs::remove_file(config.article_contents_directory.join("article-2.html"))?;

        match build_site(&config) {
            Err(Error::Render {
                page,
                err: RenderError::MacroFileNotFound { key, .. },
            }) => {
                assert_eq!(
                    config.output_directory.join("pages").join("article-2.html"),
                    page
                );
                assert_eq!("M_CONTENTS", key);
            }
            other => panic!("wanted MacroFileNotFound; found {:?}", other),
        }

        let pages = config.output_directory.join("pages");
        assert!(pages.join("article-1.html").exists());
        assert!(!pages.join("article-2.html").exists());
        assert!(!pages.join("article-3.html").exists());
        Ok(())
    }

    #[test]
    fn test_unusable_config_is_rejected() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut config = site(dir.path(), 3)?;
        config.archive_page_size = 0;
        match build_site(&config) {
            Err(Error::Config(_)) => {}
            other => panic!("wanted Config; found {:?}", other),
        }

        let mut config = site(dir.path(), 3)?;
        config.latest_columns = 0;
        match build_site(&config) {
            Err(Error::Config(_)) => {}
            other => panic!("wanted Config; found {:?}", other),
        }
        assert!(!config.output_directory.exists());
        Ok(())
    }

    #[test]
    fn test_invalid_article_id_writes_nothing() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = site(dir.path(), 2)?;
        fs::write(
            config.articles_directory.join("articles.json"),
            r#"["article-1", "Not A Slug"]"#,
        )?;
        match build_site(&config) {
            Err(Error::Article(ArticleError::InvalidArticleId(id))) => {
                assert_eq!("Not A Slug", id)
            }
            other => panic!("wanted InvalidArticleId; found {:?}", other),
        }
        assert!(!config.output_directory.exists());
        Ok(())
    }
}
