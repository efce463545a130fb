//! `RemoteApi` implementation over HTTPS.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use hyper::{Body, Client, Request, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::debug;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::client::{ApiRequest, ApiResponse, RemoteApi, RemoteError, RemoteResult};

type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Media type GitHub recommends for REST calls.
pub const GITHUB_JSON: &str = "application/vnd.github+json";

/// `User-Agent` sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("github-toolsets/", env!("CARGO_PKG_VERSION"));

fn build_https_client() -> HyperClient {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));
    Client::builder().build::<_, Body>(connector)
}

/// Settings for [`HttpRemoteApi`].
#[derive(Clone, Debug)]
pub struct HttpConfig {
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpConfig {
    /// Settings for the public GitHub API.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the REST base URL, e.g. `https://ghe.example.com/api/v3`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Configuration`] when the URL is not an absolute
    /// `http(s)` URL.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> RemoteResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Overrides the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// REST base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GraphQL endpoint matching the REST base URL.
    #[must_use]
    pub fn graphql_url(&self) -> String {
        match self.base_url.strip_suffix("/api/v3") {
            Some(host) => format!("{host}/api/graphql"),
            None => format!("{}/graphql", self.base_url),
        }
    }
}

/// HTTPS client for the GitHub REST and GraphQL APIs. No credentials are
/// attached to requests.
pub struct HttpRemoteApi {
    client: HyperClient,
    config: HttpConfig,
    graphql: Uri,
}

impl fmt::Debug for HttpRemoteApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRemoteApi")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpRemoteApi {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Configuration`] if the GraphQL endpoint derived
    /// from the base URL is not a valid URI.
    pub fn new(config: HttpConfig) -> RemoteResult<Self> {
        let graphql = config.graphql_url().parse::<Uri>().map_err(|err| {
            RemoteError::configuration(format!("invalid GraphQL endpoint: {err}"))
        })?;
        Ok(Self {
            client: build_https_client(),
            config,
            graphql,
        })
    }

    fn uri(&self, request: &ApiRequest) -> RemoteResult<Uri> {
        let mut uri = format!("{}{}", self.config.base_url, request.path());
        for (index, (key, value)) in request.query_pairs().iter().enumerate() {
            uri.push(if index == 0 { '?' } else { '&' });
            uri.push_str(&urlencoding::encode(key));
            uri.push('=');
            uri.push_str(&urlencoding::encode(value));
        }
        uri.parse::<Uri>()
            .map_err(|err| RemoteError::configuration(format!("invalid request URI `{uri}`: {err}")))
    }

    fn build(&self, method: &str, uri: Uri, accept: &str, body: Option<&Value>) -> RemoteResult<Request<Body>> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACCEPT, accept)
            .header(USER_AGENT, self.config.user_agent.as_str());

        let request = match body {
            Some(body) => {
                let bytes = serde_json::to_vec(body).map_err(|err| {
                    RemoteError::configuration(format!("failed to encode request body: {err}"))
                })?;
                builder
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(bytes))
            }
            None => builder.body(Body::empty()),
        };
        request.map_err(|err| RemoteError::configuration(format!("failed to build request: {err}")))
    }

    async fn execute(&self, request: Request<Body>) -> RemoteResult<ApiResponse> {
        let response = timeout(self.config.timeout, self.client.request(request))
            .await
            .map_err(|_| RemoteError::transport("request timed out"))?
            .map_err(|err| RemoteError::transport(format!("request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body())
            .await
            .map_err(|err| RemoteError::transport(format!("failed to read response: {err}")))?;
        Ok(ApiResponse::new(
            status.as_u16(),
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn send(&self, request: ApiRequest) -> RemoteResult<ApiResponse> {
        let uri = self.uri(&request)?;
        debug!(method = %request.method(), %uri, "sending request");
        let accept = request.accept_header().unwrap_or(GITHUB_JSON);
        let http = self.build(request.method().as_str(), uri, accept, request.body())?;
        self.execute(http).await
    }

    async fn graphql(&self, query: &str, variables: Value) -> RemoteResult<Value> {
        let payload = json!({ "query": query, "variables": variables });
        let http = self.build("POST", self.graphql.clone(), GITHUB_JSON, Some(&payload))?;
        let response = self.execute(http).await?;
        decode_graphql(&response)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

fn decode_graphql(response: &ApiResponse) -> RemoteResult<Value> {
    if !(200..300).contains(&response.status()) {
        return Err(RemoteError::GraphQl {
            reason: format!("status {}: {}", response.status(), response.body()),
        });
    }
    let decoded: GraphQlResponse = serde_json::from_str(response.body())
        .map_err(|err| RemoteError::decode(err.to_string()))?;
    if !decoded.errors.is_empty() {
        let reason = decoded
            .errors
            .into_iter()
            .map(|err| err.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(RemoteError::GraphQl { reason });
    }
    decoded
        .data
        .ok_or_else(|| RemoteError::decode("response carries no data"))
}

fn sanitize_base_url(input: &str) -> RemoteResult<String> {
    let base = input.trim().trim_end_matches('/');
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(RemoteError::configuration(
            "base URL must start with http:// or https://",
        ));
    }
    base.parse::<Uri>()
        .map_err(|err| RemoteError::configuration(format!("invalid base URL: {err}")))?;
    Ok(base.to_owned())
}
