//! Video element fallback for pages the extractor cannot handle

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

/// Matches a `<video src>` or a `<source src>` nested in a `<video>`
const VIDEO_SOURCE_SELECTOR: &str = "video[src], video source[src]";

/// Most page bytes read before parsing; the rest of the body is dropped
pub const MAX_PAGE_BYTES: usize = 4 * 1024 * 1024;

/// Fetches a page and pulls the first video source out of its markup
///
/// This only sees media present in the static HTML. Pages that build the
/// player in script will not yield anything.
#[derive(Clone, Debug)]
pub struct PageScraper {
    client: reqwest::Client,
    user_agent: String,
}

impl PageScraper {
    /// Create a scraper with its own HTTP client
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        Ok(Self::with_client(
            super::build_client()?,
            config.scrape_user_agent.clone(),
        ))
    }

    /// Create a scraper around an existing client
    pub fn with_client(client: reqwest::Client, user_agent: String) -> Self {
        Self { client, user_agent }
    }

    /// Resolve `page_url` to the URL of its first video source
    ///
    /// Relative sources are resolved against the page URL. Returns
    /// [`Error::NotFound`] when the page has no usable video element.
    pub async fn resolve_direct_url(&self, page_url: &str) -> Result<String> {
        debug!(%page_url, "scraping page for video element");

        let response = self
            .client
            .get(page_url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "HTTP {} fetching page {}",
                status, page_url
            )));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_markup(content_type) {
                return Err(Error::NotFound(format!(
                    "{} is served as {}, not a page",
                    page_url, content_type
                )));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let room = MAX_PAGE_BYTES - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                debug!(%page_url, limit = MAX_PAGE_BYTES, "page truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }
        let html = String::from_utf8_lossy(&body);
        let base = Url::parse(page_url).ok();

        // Html is !Send; parse only after the last await
        match find_video_source(&html, base.as_ref())? {
            Some(found) => {
                info!(%page_url, resolved = %found, "found video source in page");
                Ok(found)
            }
            None => Err(Error::NotFound(format!(
                "no video element found on {}",
                page_url
            ))),
        }
    }
}

/// Whether a `Content-Type` value can carry HTML markup
fn is_markup(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("text/") || mime.contains("html") || mime.contains("xml")
}

/// First video source in `html`, resolved against `base` when relative
///
/// Empty and `blob:` sources are skipped since they cannot be fetched.
pub fn find_video_source(html: &str, base: Option<&Url>) -> Result<Option<String>> {
    let selector = Selector::parse(VIDEO_SOURCE_SELECTOR)
        .map_err(|e| Error::Other(format!("invalid video selector: {}", e)))?;
    let document = Html::parse_document(html);

    for element in document.select(&selector) {
        let Some(raw) = element.value().attr("src") else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with("blob:") {
            continue;
        }

        let resolved = match base {
            Some(base) => match base.join(raw) {
                Ok(url) => url.to_string(),
                Err(_) => continue,
            },
            None => raw.to_string(),
        };
        return Ok(Some(resolved));
    }

    Ok(None)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn base() -> Url {
        Url::parse("https://site.example/videos/page.html").unwrap()
    }

    #[test]
    fn finds_src_on_video_element() {
        let html = r#"<html><body><video src="https://cdn.example/a.mp4"></video></body></html>"#;
        assert_eq!(
            find_video_source(html, Some(&base())).unwrap().as_deref(),
            Some("https://cdn.example/a.mp4")
        );
    }

    #[test]
    fn finds_nested_source_element() {
        let html = r#"<video controls><source src="/media/b.mp4" type="video/mp4"></video>"#;
        assert_eq!(
            find_video_source(html, Some(&base())).unwrap().as_deref(),
            Some("https://site.example/media/b.mp4")
        );
    }

    #[test]
    fn resolves_path_relative_source() {
        let html = r#"<video src="clip.mp4"></video>"#;
        assert_eq!(
            find_video_source(html, Some(&base())).unwrap().as_deref(),
            Some("https://site.example/videos/clip.mp4")
        );
    }

    #[test]
    fn first_match_in_document_order_wins() {
        let html = r#"
            <video src="https://cdn.example/first.mp4"></video>
            <video><source src="https://cdn.example/second.mp4"></video>
        "#;
        assert_eq!(
            find_video_source(html, Some(&base())).unwrap().as_deref(),
            Some("https://cdn.example/first.mp4")
        );
    }

    #[test]
    fn skips_blob_and_empty_sources() {
        let html = r#"
            <video src="blob:https://site.example/1234"></video>
            <video src="   "></video>
            <video src="https://cdn.example/real.mp4"></video>
        "#;
        assert_eq!(
            find_video_source(html, Some(&base())).unwrap().as_deref(),
            Some("https://cdn.example/real.mp4")
        );
    }

    #[test]
    fn ignores_source_outside_video() {
        let html = r#"<audio><source src="https://cdn.example/song.mp3"></audio>"#;
        assert_eq!(find_video_source(html, Some(&base())).unwrap(), None);
    }

    #[test]
    fn page_without_video_yields_none() {
        let html = "<html><body><p>nothing here</p></body></html>";
        assert_eq!(find_video_source(html, Some(&base())).unwrap(), None);
    }

    #[test]
    fn without_base_returns_raw_source() {
        let html = r#"<video src="/relative.mp4"></video>"#;
        assert_eq!(
            find_video_source(html, None).unwrap().as_deref(),
            Some("/relative.mp4")
        );
    }

    #[tokio::test]
    async fn resolve_fetches_page_with_generic_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    r#"<video><source src="/media/clip.mp4"></video>"#,
                    "text/html; charset=utf-8",
                ),
            )
            .expect(1)
            .mount(&server)
            .await;

        let scraper = PageScraper::with_client(reqwest::Client::new(), "Mozilla/5.0".into());
        let resolved = scraper
            .resolve_direct_url(&format!("{}/watch", server.uri()))
            .await
            .unwrap();

        assert_eq!(resolved, format!("{}/media/clip.mp4", server.uri()));
    }

    #[tokio::test]
    async fn resolve_without_video_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>no media</p>"))
            .mount(&server)
            .await;

        let scraper = PageScraper::with_client(reqwest::Client::new(), "Mozilla/5.0".into());
        let result = scraper
            .resolve_direct_url(&format!("{}/plain", server.uri()))
            .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn resolve_on_error_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let scraper = PageScraper::with_client(reqwest::Client::new(), "Mozilla/5.0".into());
        let result = scraper.resolve_direct_url(&server.uri()).await;

        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[test]
    fn markup_content_types_are_accepted() {
        assert!(is_markup("text/html"));
        assert!(is_markup("text/html; charset=UTF-8"));
        assert!(is_markup("application/xhtml+xml"));
        assert!(is_markup("text/plain"));
        assert!(!is_markup("video/mp4"));
        assert!(!is_markup("application/octet-stream"));
    }

    #[tokio::test]
    async fn binary_response_is_not_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 64 * 1024], "video/mp4"))
            .mount(&server)
            .await;

        let scraper = PageScraper::with_client(reqwest::Client::new(), "Mozilla/5.0".into());
        let result = scraper
            .resolve_direct_url(&format!("{}/stream", server.uri()))
            .await;

        match result {
            Err(Error::NotFound(msg)) => assert!(msg.contains("video/mp4"), "{msg}"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_page_is_read_up_to_limit() {
        let mut page = String::from(r#"<html><body><video src="/early.mp4"></video>"#);
        page.push_str(&"<p>filler</p>".repeat(MAX_PAGE_BYTES / 10));
        page.push_str(r#"<video src="/late.mp4"></video></body></html>"#);
        assert!(page.len() > MAX_PAGE_BYTES);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(page, "text/html"))
            .mount(&server)
            .await;

        let scraper = PageScraper::with_client(reqwest::Client::new(), "Mozilla/5.0".into());
        let resolved = scraper
            .resolve_direct_url(&format!("{}/big", server.uri()))
            .await
            .unwrap();

        assert_eq!(resolved, format!("{}/early.mp4", server.uri()));
    }
}
