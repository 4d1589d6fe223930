use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use crate::{
    config::FetchConfig,
    domain::{FieldKind, FormDescriptor, PageMetadata},
};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("valid title selector"));
static FORM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("form").expect("valid form selector"));
static INPUT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input").expect("valid input selector"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Retrieves a page and reduces it to the metadata the heuristics inspect.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageMetadata, FetchError>;
}

pub struct HttpPageFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpPageFetcher {
    pub fn new(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, raw_url: &str) -> Result<PageMetadata, FetchError> {
        let url = Url::parse(raw_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(url.scheme().to_string()));
        }

        let timeout = self.config.timeout;
        let as_fetch_error = |err: reqwest::Error| {
            if err.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::Request(err)
            }
        };

        let mut response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(as_fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let limit = self.config.max_body_bytes;
        let mut bytes = Vec::new();
        while bytes.len() < limit {
            match response.chunk().await.map_err(as_fetch_error)? {
                Some(chunk) => bytes.extend_from_slice(&chunk),
                None => break,
            }
        }
        if bytes.len() >= limit {
            tracing::debug!(target: "fetch", url = %url, limit, "page body capped");
            bytes.truncate(limit);
        }

        let mut body = String::from_utf8_lossy(&bytes).into_owned();
        body.truncate(floor_char_boundary(&body, limit));

        let metadata = parse_page(&body);
        tracing::debug!(
            target: "fetch",
            url = %url,
            title = %metadata.title,
            forms = metadata.forms.len(),
            "page fetched"
        );
        Ok(metadata)
    }
}

/// Extracts the `<title>` text and the input kinds of every `<form>`.
pub fn parse_page(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let forms = document
        .select(&FORM_SELECTOR)
        .map(|form| {
            FormDescriptor::from_kinds(
                form.select(&INPUT_SELECTOR)
                    .map(|input| FieldKind::from_type_attr(input.value().attr("type"))),
            )
        })
        .collect();

    PageMetadata::new(title, forms)
}

fn floor_char_boundary(text: &str, max: usize) -> usize {
    let mut end = max.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}
