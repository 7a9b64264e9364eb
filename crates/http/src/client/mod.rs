//! Tether request gateway
//!
//! [`Gateway::send`] turns a [`RequestDescriptor`] into an HTTP call, attaches
//! the stored access token as a bearer credential and, when the server answers
//! 401, renews the token through the refresh endpoint and repeats the call
//! exactly once.
//!
//! Concurrent calls that hit 401 at the same time each run their own refresh.
//! Nothing coordinates them; the last refresh to finish decides which access
//! token stays in the store.

pub mod credentials;
pub mod error;
pub mod multipart;
pub mod navigator;
pub mod refresh;
pub mod request;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenPair};
pub use error::{ClientError, CredentialError};
pub use multipart::{FilePart, Part, PartValue};
pub use navigator::{LogNavigator, Navigator};
pub use request::{ProgressCallback, RequestDescriptor, UploadProgress};

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
};
use reqwest::{Client, ClientBuilder, Method, Response};
use tether_core::EndpointConfig;
use tracing::{debug, warn};

use self::multipart::{build_form, form_parts};
use self::request::ProgressTracker;

const DEFAULT_USER_AGENT: &str = concat!("tether/", env!("CARGO_PKG_VERSION"));

/// Authenticated request gateway
#[derive(Clone)]
pub struct Gateway {
    client: Client,
    endpoints: EndpointConfig,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

/// A descriptor resolved once per `send`, so a retry replays the identical request
struct PreparedRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    body: PreparedBody,
    on_upload_progress: Option<ProgressCallback>,
}

enum PreparedBody {
    Empty,
    Json(Bytes),
    /// Rebuilt into a fresh form on every attempt
    Multipart(Vec<Part>),
}

impl Gateway {
    /// Create a new gateway builder
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Issue a request, renewing the access token once on 401
    ///
    /// A successful response is returned untouched. A 401 triggers
    /// [`Gateway::refresh`]; with a new token the call is repeated once and its
    /// outcome returned, otherwise the original 401 is returned. Every other
    /// failure is returned as is.
    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<Response, ClientError> {
        let prepared = self.prepare(descriptor)?;
        let access_token = self.credentials.get().access_token;

        match self.dispatch(&prepared, access_token.as_deref()).await {
            Err(err) if err.is_auth_expired() => {
                warn!(url = %prepared.url, "Access token rejected, refreshing");
                match self.refresh().await {
                    Some(new_token) => self.dispatch(&prepared, Some(&new_token)).await,
                    None => Err(err),
                }
            }
            other => other,
        }
    }

    /// [`Gateway::send`] and decode the JSON body
    pub async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<T, ClientError> {
        let response = self.send(descriptor).await?;
        Ok(response.json().await?)
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }

    fn prepare(&self, descriptor: &RequestDescriptor) -> Result<PreparedRequest, ClientError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &descriptor.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(header_name, header_value);
        }

        let (base, body) = if descriptor.file {
            // The form sets its own multipart content type with the boundary
            headers.remove(CONTENT_TYPE);
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
            let parts = form_parts(&descriptor.data, &descriptor.attachments);
            (self.endpoints.file_url(), PreparedBody::Multipart(parts))
        } else if descriptor.carries_json_body() {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            let body = serde_json::to_vec(&descriptor.data)?;
            (self.endpoints.api_url.as_str(), PreparedBody::Json(Bytes::from(body)))
        } else {
            (self.endpoints.api_url.as_str(), PreparedBody::Empty)
        };

        Ok(PreparedRequest {
            method: descriptor.method.clone(),
            url: resolve(base, &descriptor.url),
            headers,
            params: descriptor.params.clone(),
            body,
            on_upload_progress: descriptor.on_upload_progress.clone(),
        })
    }

    async fn dispatch(
        &self,
        prepared: &PreparedRequest,
        access_token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut headers = prepared.headers.clone();
        if let Some(token) = access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ClientError::InvalidHeader(format!("authorization: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut request = self
            .client
            .request(prepared.method.clone(), &prepared.url)
            .headers(headers);

        if !prepared.params.is_empty() {
            request = request.query(&prepared.params);
        }

        request = match &prepared.body {
            PreparedBody::Empty => request,
            PreparedBody::Json(body) => match &prepared.on_upload_progress {
                Some(callback) => {
                    let tracker = ProgressTracker::new(body.len() as u64, callback.clone());
                    request
                        .header(CONTENT_LENGTH, body.len())
                        .body(tracker.body(body.clone()))
                }
                None => request.body(body.clone()),
            },
            PreparedBody::Multipart(parts) => {
                let tracker = prepared.on_upload_progress.as_ref().map(|callback| {
                    let total = parts.iter().map(Part::content_len).sum();
                    ProgressTracker::new(total, callback.clone())
                });
                request.multipart(build_form(parts, tracker.as_ref())?)
            }
        };

        debug!(
            method = %prepared.method,
            url = %prepared.url,
            authorized = access_token.is_some(),
            "Sending request"
        );

        check_status(request.send().await?).await
    }
}

/// Map a non-2xx response to a [`ClientError`] carrying the body text
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        Err(ClientError::from_status(status, message))
    }
}

/// Join a base URL and a resource path with exactly one slash
fn resolve(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Builder for [`Gateway`]
#[derive(Default)]
pub struct GatewayBuilder {
    api_url: Option<String>,
    file_url: Option<String>,
    login_route: Option<String>,
    credentials: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl GatewayBuilder {
    /// Take all endpoints from a loaded configuration
    pub fn endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.api_url = Some(endpoints.api_url);
        self.file_url = endpoints.file_url;
        self.login_route = Some(endpoints.login_route);
        self
    }

    /// Set the general API base
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the file-transfer base
    pub fn file_url(mut self, url: impl Into<String>) -> Self {
        self.file_url = Some(url.into());
        self
    }

    /// Set the route used after a failed refresh
    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = Some(route.into());
        self
    }

    pub fn credentials(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the gateway
    pub fn build(self) -> Result<Gateway, ClientError> {
        let api_url = self
            .api_url
            .ok_or_else(|| ClientError::Configuration("api_url is required".into()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| ClientError::Configuration("a credential store is required".into()))?;

        let mut endpoints = EndpointConfig::new(api_url);
        if let Some(file_url) = self.file_url {
            endpoints = endpoints.with_file_url(file_url);
        }
        if let Some(route) = self.login_route {
            endpoints = endpoints.with_login_route(route);
        }
        endpoints.validate()?;

        let mut client_builder = ClientBuilder::new();
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        );

        Ok(Gateway {
            client: client_builder.build()?,
            endpoints,
            credentials,
            navigator: self.navigator.unwrap_or_else(|| Arc::new(LogNavigator)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway() -> Gateway {
        Gateway::builder()
            .api_url("https://api.example.com/")
            .file_url("https://files.example.com")
            .credentials(Arc::new(MemoryCredentialStore::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn resolve_joins_with_one_slash() {
        assert_eq!(resolve("https://a.test/", "/x/"), "https://a.test/x/");
        assert_eq!(resolve("https://a.test", "x"), "https://a.test/x");
        assert_eq!(resolve("https://a.test/api", "items/1/"), "https://a.test/api/items/1/");
    }

    #[test]
    fn json_requests_go_to_the_api_base() {
        let prepared = gateway()
            .prepare(&RequestDescriptor::post("items/").field("title", "x"))
            .unwrap();
        assert_eq!(prepared.url, "https://api.example.com/items/");
        assert_eq!(prepared.headers[CONTENT_TYPE], "application/json");
        assert!(
            matches!(&prepared.body, PreparedBody::Json(body) if &body[..] == b"{\"title\":\"x\"}")
        );
    }

    #[test]
    fn get_requests_have_no_body() {
        let prepared = gateway().prepare(&RequestDescriptor::get("items/")).unwrap();
        assert!(matches!(prepared.body, PreparedBody::Empty));
        assert!(!prepared.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn file_requests_are_multipart_to_the_file_base() {
        let descriptor = RequestDescriptor::post("upload/")
            .header("Content-Type", "text/plain")
            .field("a", json!([1, 2]))
            .field("b", "x")
            .file(true);
        let prepared = gateway().prepare(&descriptor).unwrap();

        assert_eq!(prepared.url, "https://files.example.com/upload/");
        assert_eq!(prepared.headers[ACCEPT], "application/json");
        assert!(!prepared.headers.contains_key(CONTENT_TYPE));

        let PreparedBody::Multipart(parts) = prepared.body else {
            panic!("expected a multipart body");
        };
        let names: Vec<_> = parts.iter().map(|part| part.name.as_str()).collect();
        assert_eq!(names, vec!["a", "a", "b"]);
    }

    #[test]
    fn invalid_header_is_rejected() {
        let err = gateway()
            .prepare(&RequestDescriptor::get("x").header("bad header", "v"))
            .err()
            .unwrap();
        assert!(matches!(err, ClientError::InvalidHeader(_)));
    }

    #[test]
    fn builder_requires_api_url_and_store() {
        let missing_url = Gateway::builder()
            .credentials(Arc::new(MemoryCredentialStore::new()))
            .build();
        assert!(matches!(missing_url, Err(ClientError::Configuration(_))));

        let missing_store = Gateway::builder().api_url("https://a.test").build();
        assert!(matches!(missing_store, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn builder_rejects_invalid_base() {
        let result = Gateway::builder()
            .api_url("not a url")
            .credentials(Arc::new(MemoryCredentialStore::new()))
            .build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }
}
