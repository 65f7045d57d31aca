use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument};

use crate::error::{AppError, Result};

/// Some origins refuse requests that don't look like they come from a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

pub const NO_TITLE: &str = "No title found";

/// Elements whose subtrees carry nothing worth summarizing.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "img", "input"];

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to parse body selector"));

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to parse title selector"));

/// A fetched and cleaned page. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub text: String,
}

impl Document {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Response body as received, before any markup handling.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub content_type: Option<String>,
    pub html: String,
}

pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<RawPage>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, url: &str) -> Result<RawPage> {
        (**self).fetch(url)
    }
}

/// Plain GET over a blocking client carrying the browser user agent.
/// No timeout or retry is configured beyond the client defaults.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(BROWSER_USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<RawPage> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FetchError(format!(
                "GET {} returned status {}",
                url, status
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let html = response.text()?;

        Ok(RawPage {
            url: url.to_string(),
            content_type,
            html,
        })
    }
}

/// Fetch `url` and turn the response into a [`Document`].
#[instrument(skip(fetcher))]
pub fn load<F: Fetch + ?Sized>(fetcher: &F, url: &str) -> Result<Document> {
    let page = fetcher.fetch(url)?;
    debug!(bytes = page.html.len(), content_type = ?page.content_type, "page fetched");
    parse_page(page)
}

pub fn parse_page(page: RawPage) -> Result<Document> {
    if let Some(content_type) = page.content_type.as_deref() {
        if !is_markup(content_type) {
            return Err(AppError::ParseError(format!(
                "Response from {} is not markup (content type {})",
                page.url, content_type
            )));
        }
    }

    let document = Html::parse_document(&page.html);

    let title = extract_title(&document);
    let body = document.select(&BODY_SELECTOR).next().ok_or_else(|| {
        AppError::ParseError(format!("No <body> element found in {}", page.url))
    })?;
    let text = extract_text(body);

    Ok(Document {
        url: page.url,
        title,
        text,
    })
}

fn is_markup(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    matches!(mime.as_str(), "" | "text/html" | "text/plain" | "text/xml" | "application/xml")
        || mime.ends_with("+xml")
}

/// Text of the first `<title>`, as written. Only a missing element falls back to [`NO_TITLE`].
fn extract_title(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| title.text().collect::<String>())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

/// Trimmed text nodes under `body`, one per line, with skipped subtrees left out.
pub fn extract_text(body: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    collect_text(body, &mut lines);
    lines.join("\n")
}

fn collect_text<'a>(element: ElementRef<'a>, lines: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed);
                }
            }
            Node::Element(el) if SKIPPED_ELEMENTS.iter().any(|name| *name == el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, lines);
                }
            }
            _ => {}
        }
    }
}
