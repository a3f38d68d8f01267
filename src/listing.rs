//! HTML fragments for the index and archive pages. These are substituted into
//! templates as literal macros.

use crate::article::Article;
use url::Url;

/// Renders the summary card for `article`, linking to its page at `url`.
pub fn article_summary(article: &Article, url: &Url) -> String {
    format!(
        r#"<div class="pages-item">
    <h2 lang="ro">{title}</h2>
    <p>{date}</p>
    <p lang="ro">{preview}...</p>
    <div class="read-page-container">
        <a class="item-link read-page" href="{url}">
            Read Page
        </a>
    </div>
</div>"#,
        title = article.title,
        date = article.date,
        preview = article.preview,
        url = url,
    )
}

/// Renders the pagination item for archive page `number` (1-based), linking
/// to it at `url`. The item for the page being rendered is `active`.
pub fn pagination_item(number: usize, active: bool, url: &Url) -> String {
    format!(
        r#"<li {class}>
    <a class="page-link" href="{url}">{number}</a>
</li>"#,
        class = if active { r#"class="active""# } else { "" },
        url = url,
        number = number,
    )
}

/// The number of pages needed to show `total` items `page_size` at a time.
pub fn page_count(total: usize, page_size: usize) -> usize {
    match total % page_size {
        0 => total / page_size,
        _ => total / page_size + 1,
    }
}
