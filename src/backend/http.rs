//! reqwest client for the `/query` endpoint.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::{QUERY_PATH, QueryBackend, QueryError, QueryRequest, QueryResponse};

/// HTTP implementation of [`QueryBackend`].
///
/// # Example
///
/// ```rust,no_run
/// use query_chat::backend::{HttpQueryClient, QueryBackend, QueryRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpQueryClient::new("http://127.0.0.1:8000")?;
/// let response = client.query(&QueryRequest::new("Hello")).await?;
/// println!("{:?}", response.answer_text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpQueryClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpQueryClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// Only the origin of `base_url` matters; the query path is absolute.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(base_url.as_ref())?.join(QUERY_PATH)?;
        Ok(Self { endpoint, http })
    }

    /// Full URL the query is posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryBackend for HttpQueryClient {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(QueryError::Network)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = %status, "Backend returned error status");
            return Err(QueryError::BadStatus { status });
        }

        let bytes = response.bytes().await.map_err(QueryError::Network)?;
        QueryResponse::from_slice(&bytes).map_err(QueryError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_origin() {
        let client = HttpQueryClient::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://127.0.0.1:8000/query");

        let client = HttpQueryClient::new("http://backend.local/api/v1/").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://backend.local/query");
    }

    #[test]
    fn test_relative_base_url_rejected() {
        assert!(HttpQueryClient::new("not a url").is_err());
        assert!(HttpQueryClient::new("/query").is_err());
    }
}
