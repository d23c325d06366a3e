//! Transport primitives underneath the request pipelines.
//!
//! The module exposes [`HttpTransport`] alongside [`WireRequest`] and [`WireResponse`] so
//! downstream crates can integrate custom HTTP clients without depending on reqwest
//! types. The broker routes every outbound call through this seam, including the refresh
//! and revoke calls issued while recovering a session, which keeps the recovery path
//! from ever intercepting its own traffic.

// self
use crate::{_prelude::*, auth::TokenSecret, error::TransportError};

/// Canonical header name for bearer credentials.
pub(crate) const AUTHORIZATION: &str = "authorization";
/// Canonical header name for media types.
pub(crate) const CONTENT_TYPE: &str = "content-type";

/// Boxed future returned by [`HttpTransport::dispatch`].
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of carrying the broker's requests.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared across broker
/// clones behind an `Arc`, and the returned futures must be `Send` so pipeline futures
/// inherit the same guarantee. The transport receives owned [`WireRequest`] values with
/// every header already attached; it never inspects or mutates credentials itself.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes a single HTTP request and returns the raw response.
	///
	/// Implementations must honor [`WireRequest::timeout`] when it is set and map
	/// expired limits to [`TransportError::Timeout`]. Redirects must not be followed;
	/// requests carry bearer credentials that must not travel to another origin.
	fn dispatch(&self, request: WireRequest) -> TransportFuture<'_, WireResponse>;
}

/// HTTP method subset used by the pipelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WireMethod {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
	/// HTTP PATCH.
	Patch,
	/// HTTP DELETE.
	Delete,
}
impl WireMethod {
	/// Returns the canonical uppercase method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			WireMethod::Get => "GET",
			WireMethod::Post => "POST",
			WireMethod::Put => "PUT",
			WireMethod::Patch => "PATCH",
			WireMethod::Delete => "DELETE",
		}
	}
}
impl Display for WireMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<WireMethod> for reqwest::Method {
	fn from(method: WireMethod) -> Self {
		match method {
			WireMethod::Get => reqwest::Method::GET,
			WireMethod::Post => reqwest::Method::POST,
			WireMethod::Put => reqwest::Method::PUT,
			WireMethod::Patch => reqwest::Method::PATCH,
			WireMethod::Delete => reqwest::Method::DELETE,
		}
	}
}

/// Client-agnostic HTTP request consumed by [`HttpTransport`] implementations.
#[derive(Clone)]
pub struct WireRequest {
	/// HTTP method.
	pub method: WireMethod,
	/// Fully resolved request URL.
	pub url: Url,
	/// Header name/value pairs in insertion order.
	pub headers: Vec<(String, String)>,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	/// Optional per-request time limit.
	pub timeout: Option<Duration>,
}
impl WireRequest {
	/// Creates a bodyless request for the provided method and URL.
	pub fn new(method: WireMethod, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None, timeout: None }
	}

	/// Appends a header pair.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Appends an `Authorization: Bearer` header carrying the provided secret.
	pub fn with_bearer(self, token: &TokenSecret) -> Self {
		self.with_header(AUTHORIZATION, format!("Bearer {}", token.expose()))
	}

	/// Attaches a request body.
	pub fn with_body(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);

		self
	}

	/// Applies a per-request time limit.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Returns the first header whose name matches case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}
impl Debug for WireRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers: Vec<(&str, &str)> = self
			.headers
			.iter()
			.map(|(name, value)| {
				if name.eq_ignore_ascii_case(AUTHORIZATION) {
					(name.as_str(), "<redacted>")
				} else {
					(name.as_str(), value.as_str())
				}
			})
			.collect();

		f.debug_struct("WireRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Raw response surfaced by [`HttpTransport`] implementations.
///
/// Bodies may carry freshly minted credentials, so the `Debug` implementation prints only
/// the body length.
#[derive(Clone)]
pub struct WireResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl WireResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when the backend rejected the request's credential.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}
}
impl Debug for WireResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WireResponse")
			.field("status", &self.status)
			.field("body_len", &self.body.len())
			.finish()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client disables redirect following: pipeline requests carry bearer
/// credentials and a redirect could replay them against another origin. Configure any
/// custom [`ReqwestClient`] passed to [`with_client`](Self::with_client) the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Default for ReqwestTransport {
	fn default() -> Self {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build the default Reqwest client.");

		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn dispatch(&self, request: WireRequest) -> TransportFuture<'_, WireResponse> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.request(request.method.into(), request.url.clone());

			for (name, value) in &request.headers {
				builder = builder.header(name, value);
			}
			if let Some(limit) =
				request.timeout.and_then(|t| std::time::Duration::try_from(t).ok())
			{
				builder = builder.timeout(limit);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(WireResponse { status, body })
		})
	}
}
