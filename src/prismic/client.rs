//! HTTP implementation of [`ContentSource`] for the Prismic v2 REST API

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{ContentError, ContentResult, ContentSource, Document, Predicate, Query, ResultsPage};

#[derive(Debug, Deserialize)]
struct ApiRefDto {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

#[derive(Debug, Deserialize)]
struct ApiDto {
    refs: Vec<ApiRefDto>,
}

/// Content source backed by a Prismic repository
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    endpoint: String,
    access_token: Option<String>,
    client: Client,
}

impl HttpContentSource {
    /// Create a client for the API entry point `endpoint`
    pub fn new(endpoint: impl Into<String>, access_token: Option<String>) -> ContentResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
            client,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/documents/search", self.endpoint)
    }

    /// GET `url` and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> ContentResult<T> {
        let mut request = self.client.get(url).query(params);
        if let Some(token) = &self.access_token {
            if !url.contains("access_token=") {
                request = request.query(&[("access_token", token)]);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Resolve the master ref, the id of the currently published content
    async fn master_ref(&self) -> ContentResult<String> {
        let api: ApiDto = self.get_json(&self.endpoint, &[]).await?;
        api.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| ContentError::NoMasterRef(self.endpoint.clone()))
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn query(&self, query: &Query) -> ContentResult<ResultsPage> {
        let master_ref = self.master_ref().await?;

        let mut params = vec![
            ("ref", master_ref),
            ("q", query.q()),
            ("pageSize", query.page_size.to_string()),
        ];
        if !query.fetch.is_empty() {
            params.push(("fetch", query.fetch.join(",")));
        }

        tracing::debug!("Querying {} with q={}", self.endpoint, query.q());
        self.get_json(&self.search_url(), &params).await
    }

    async fn fetch_page(&self, cursor: &str) -> ContentResult<ResultsPage> {
        tracing::debug!("Fetching next page: {}", cursor);
        self.get_json(cursor, &[]).await
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> ContentResult<Document> {
        let query = Query::new(vec![Predicate::uid(doc_type, uid)]).page_size(1);
        let page = self.query(&query).await?;

        page.results
            .into_iter()
            .next()
            .ok_or_else(|| ContentError::not_found(doc_type, uid))
    }
}
