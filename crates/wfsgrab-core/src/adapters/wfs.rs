use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::HarvestConfig;
use crate::domain::LayerName;
use crate::feature_source::{FeaturePage, FeatureSource, PageRequest, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpError, HttpErrorKind, HttpRequest};

const DATA_OUTPUT_FORMAT: &str = "application/json";

/// Where and how the WFS endpoint is queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WfsEndpoint {
    pub base_url: String,
    pub version: String,
    pub sort_by: String,
}

impl WfsEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            version: String::from("2.0.0"),
            sort_by: String::from("objectid"),
        }
    }

    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            version: config.wfs_version.clone(),
            sort_by: config.sort_by.clone(),
        }
    }

    /// `resultType=hits` query: totals only, no features.
    pub fn count_url(&self, layer: &LayerName) -> String {
        format!(
            "{}SERVICE=WFS&REQUEST=GetFeature&resultType=hits&typeNames={}&VERSION={}",
            self.query_prefix(),
            urlencoding::encode(layer.as_str()),
            urlencoding::encode(&self.version),
        )
    }

    /// `resultType=results` query for one window, sorted for stable paging.
    pub fn page_url(&self, request: &PageRequest) -> String {
        format!(
            "{}SERVICE=WFS&REQUEST=GetFeature&count={}&resultType=results&typeNames={}\
&startIndex={}&sortBy={}&VERSION={}&outputFormat={}",
            self.query_prefix(),
            request.window.count,
            urlencoding::encode(request.layer.as_str()),
            request.window.start,
            urlencoding::encode(&self.sort_by),
            urlencoding::encode(&self.version),
            urlencoding::encode(DATA_OUTPUT_FORMAT),
        )
    }

    fn query_prefix(&self) -> String {
        let base = self.base_url.trim();
        if base.ends_with('?') || base.ends_with('&') {
            base.to_string()
        } else if base.contains('?') {
            format!("{base}&")
        } else {
            format!("{base}?")
        }
    }
}

/// WFS 2.0 `GetFeature` adapter.
#[derive(Clone)]
pub struct WfsSource {
    endpoint: WfsEndpoint,
    http_client: Arc<dyn HttpClient>,
    page_timeout: Duration,
    count_timeout: Duration,
}

impl WfsSource {
    pub fn new(endpoint: WfsEndpoint, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            endpoint,
            http_client,
            page_timeout: Duration::from_secs(60),
            count_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &HarvestConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            page_timeout: config.page_timeout(),
            count_timeout: config.count_timeout(),
            ..Self::new(WfsEndpoint::from_config(config), http_client)
        }
    }

    pub fn endpoint(&self) -> &WfsEndpoint {
        &self.endpoint
    }
}

impl FeatureSource for WfsSource {
    fn count_features<'a>(&'a self, layer: &'a LayerName) -> SourceFuture<'a, Option<u64>> {
        Box::pin(async move {
            let url = self.endpoint.count_url(layer);
            debug!(%layer, %url, "requesting feature count");

            let request = HttpRequest::get(&url).with_timeout(self.count_timeout);
            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(source_error)?;

            if !response.is_success() {
                return Err(SourceError::rejected(format!(
                    "count query for {layer} returned status {}",
                    response.status
                )));
            }

            Ok(parse_number_matched(&response.body))
        })
    }

    fn fetch_page<'a>(&'a self, request: &'a PageRequest) -> SourceFuture<'a, FeaturePage> {
        Box::pin(async move {
            let url = self.endpoint.page_url(request);
            debug!(layer = %request.layer, window = %request.window, %url, "requesting page");

            let http_request = HttpRequest::get(&url)
                .with_header("accept", DATA_OUTPUT_FORMAT)
                .with_timeout(self.page_timeout);
            let response = self
                .http_client
                .execute(http_request)
                .await
                .map_err(source_error)?;

            if !response.is_success() {
                return Err(SourceError::rejected(format!(
                    "page {} of {} returned status {}",
                    request.window, request.layer, response.status
                )));
            }

            decode_page(&response.body)
        })
    }

    fn page_url(&self, request: &PageRequest) -> String {
        self.endpoint.page_url(request)
    }
}

fn source_error(error: HttpError) -> SourceError {
    match error.kind() {
        HttpErrorKind::Timeout => SourceError::timeout(error.message()),
        HttpErrorKind::Connect => SourceError::connect(error.message()),
        HttpErrorKind::Other => SourceError::rejected(error.message()),
    }
}

#[derive(Debug, Deserialize)]
struct PageBody {
    #[serde(default)]
    features: Option<Vec<Value>>,
}

fn decode_page(body: &str) -> Result<FeaturePage, SourceError> {
    let page: PageBody = serde_json::from_str(body)
        .map_err(|e| SourceError::decode(format!("failed to parse feature page: {e}")))?;
    Ok(FeaturePage::new(page.features.unwrap_or_default()))
}

/// Reads the `numberMatched` attribute of the root element of a
/// `resultType=hits` response. `"unknown"` and a missing attribute both give
/// `None`.
pub fn parse_number_matched(xml: &str) -> Option<u64> {
    let tag = root_start_tag(xml)?;
    attribute_value(tag, "numberMatched")?.trim().parse().ok()
}

fn root_start_tag(xml: &str) -> Option<&str> {
    let mut rest = xml;
    loop {
        let open = rest.find('<')?;
        rest = &rest[open..];
        if rest.starts_with("<?") {
            let end = rest.find("?>")?;
            rest = &rest[end + 2..];
        } else if rest.starts_with("<!--") {
            let end = rest.find("-->")?;
            rest = &rest[end + 3..];
        } else if rest.starts_with("<!") {
            let end = rest.find('>')?;
            rest = &rest[end + 1..];
        } else {
            let end = tag_end(rest)?;
            return Some(&rest[1..end]);
        }
    }
}

/// Offset of the `>` closing the tag at the start of `tag`, skipping any
/// `>` inside quoted attribute values.
fn tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;
    for (offset, ch) in tag.char_indices() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(open), _) if ch == open => quote = None,
            (None, '>') => return Some(offset),
            _ => {}
        }
    }
    None
}

/// Value of the attribute whose local name is `name`. Attributes are walked
/// in order, so text inside other attribute values never matches and
/// `xmlns:` declarations are ignored.
fn attribute_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let name_end = tag.find(|ch: char| ch.is_whitespace() || ch == '/')?;
    let mut rest = &tag[name_end..];

    loop {
        rest = rest.trim_start_matches(|ch: char| ch.is_whitespace() || ch == '/');
        if rest.is_empty() {
            return None;
        }

        let key_end = rest.find(|ch: char| ch == '=' || ch.is_whitespace())?;
        let key = &rest[..key_end];
        let after_key = rest[key_end..].trim_start().strip_prefix('=')?.trim_start();

        let quote = after_key.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let value_and_rest = &after_key[1..];
        let value_end = value_and_rest.find(quote)?;
        let value = &value_and_rest[..value_end];
        rest = &value_and_rest[value_end + 1..];

        let local = key.rsplit(':').next().unwrap_or(key);
        if local == name && !key.starts_with("xmlns") {
            return Some(value);
        }
    }
}
