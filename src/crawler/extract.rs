//! Article content extraction
//!
//! The document-parser seam for the article side of a crawl: locating the
//! content region with a CSS selector and flattening its paragraphs to text.

use scraper::{Html, Selector};

/// Parses the configured content selector once per engine
///
/// Selector parse failures carry no useful source position, so the error is
/// reduced to a message string.
pub fn parse_content_selector(raw: &str) -> Result<Selector, String> {
    Selector::parse(raw).map_err(|e| e.to_string())
}

/// Extracts the article body from a page
///
/// Finds the first element matching `content_selector`, collects the text of
/// its `<p>` descendants in order, and joins non-empty paragraphs with
/// newlines. Returns None when the region is absent or holds no text; such
/// entries are skipped and never counted toward the budget.
pub fn extract_content(html: &str, content_selector: &Selector) -> Option<String> {
    let document = Html::parse_document(html);

    let region = document.select(content_selector).next()?;

    let paragraph_selector = Selector::parse("p").ok()?;

    let paragraphs: Vec<String> = region
        .select(&paragraph_selector)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if paragraphs.is_empty() {
        return None;
    }

    Some(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> Selector {
        parse_content_selector("div.article-content").unwrap()
    }

    #[test]
    fn test_extract_paragraphs_in_order() {
        let html = r#"<html><body>
            <div class="article-content">
                <p>First paragraph.</p>
                <p>Second paragraph.</p>
            </div>
        </body></html>"#;
        let content = extract_content(html, &selector()).unwrap();
        assert_eq!(content, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_missing_region_returns_none() {
        let html = r#"<html><body><div class="sidebar"><p>Ad</p></div></body></html>"#;
        assert!(extract_content(html, &selector()).is_none());
    }

    #[test]
    fn test_empty_region_returns_none() {
        let html = r#"<div class="article-content"><p>   </p><p></p></div>"#;
        assert!(extract_content(html, &selector()).is_none());
    }

    #[test]
    fn test_skips_blank_paragraphs() {
        let html = r#"<div class="article-content">
            <p>Kept.</p>
            <p>  </p>
            <p>Also kept.</p>
        </div>"#;
        let content = extract_content(html, &selector()).unwrap();
        assert_eq!(content, "Kept.\nAlso kept.");
    }

    #[test]
    fn test_ignores_text_outside_region() {
        let html = r#"<body>
            <p>Navigation junk</p>
            <div class="article-content"><p>Body text.</p></div>
            <p>Footer junk</p>
        </body>"#;
        let content = extract_content(html, &selector()).unwrap();
        assert_eq!(content, "Body text.");
    }

    #[test]
    fn test_nested_markup_flattened() {
        let html = r#"<div class="article-content">
            <p>Shares <strong>rose</strong> sharply.</p>
        </div>"#;
        let content = extract_content(html, &selector()).unwrap();
        assert_eq!(content, "Shares rose sharply.");
    }

    #[test]
    fn test_custom_selector() {
        let sel = parse_content_selector("article#main").unwrap();
        let html = r#"<article id="main"><p>Custom region.</p></article>"#;
        assert_eq!(
            extract_content(html, &sel).as_deref(),
            Some("Custom region.")
        );
    }

    #[test]
    fn test_invalid_selector_rejected() {
        assert!(parse_content_selector("div..[").is_err());
    }
}
