//! REST pipeline: bearer attachment, 401 detection, and a single silent replay.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{CONTENT_TYPE, HttpTransport, WireMethod, WireRequest, WireResponse},
	obs::{self, PipelineKind, PipelineOutcome, PipelineSpan},
	pipeline::{SessionBroker, common},
};

/// REST request value owned by the caller until dispatch.
///
/// Paths are joined against the descriptor's REST base URL with [`Url::join`]
/// semantics, so relative paths extend the base while a leading `/` replaces its path.
#[derive(Clone, Debug)]
pub struct RestRequest {
	/// HTTP method.
	pub method: WireMethod,
	/// Path joined against the descriptor's REST base URL.
	pub path: String,
	/// Extra header pairs appended after the bearer.
	pub headers: Vec<(String, String)>,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
}
impl RestRequest {
	/// Creates a bodyless request for the provided method and path.
	pub fn new(method: WireMethod, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), headers: Vec::new(), body: None }
	}

	/// Creates a GET request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(WireMethod::Get, path)
	}

	/// Creates a POST request carrying a JSON body.
	pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
		Self::new(WireMethod::Post, path).with_body(body)
	}

	/// Creates a PUT request carrying a JSON body.
	pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
		Self::new(WireMethod::Put, path).with_body(body)
	}

	/// Creates a DELETE request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(WireMethod::Delete, path)
	}

	/// Appends a header pair.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Attaches (or replaces) the JSON body.
	pub fn with_body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}
}

/// Raw REST response handed back to the caller.
#[derive(Clone)]
pub struct RestResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl RestResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body as JSON, reporting the serde path on failure.
	pub fn json<D>(&self) -> Result<D>
	where
		D: DeserializeOwned,
	{
		common::decode_json(&WireResponse { status: self.status, body: self.body.clone() })
	}
}
impl From<WireResponse> for RestResponse {
	fn from(response: WireResponse) -> Self {
		Self { status: response.status, body: response.body }
	}
}
impl Debug for RestResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RestResponse")
			.field("status", &self.status)
			.field("body_len", &self.body.len())
			.finish()
	}
}

impl<T> SessionBroker<T>
where
	T: ?Sized + HttpTransport,
{
	/// Dispatches a REST request with bearer attachment and silent 401 recovery.
	///
	/// The stored access token is attached optimistically, expired or not; the backend
	/// is the authority on validity. Responses other than 401 pass through unmodified,
	/// whatever their status. A 401 triggers one refresh followed by one replay of the
	/// original request with the fresh bearer; if the refresh yields nothing the broker
	/// runs its logout fallback and surfaces the original rejection, and if the replay
	/// is rejected again the failure is final. There is no second refresh per call.
	pub async fn send(&self, request: RestRequest) -> Result<RestResponse> {
		const KIND: PipelineKind = PipelineKind::Rest;

		let span = PipelineSpan::new(KIND, "send");

		obs::record_pipeline_outcome(KIND, PipelineOutcome::Attempt);

		let result = span.instrument(self.send_inner(request)).await;

		match &result {
			Ok(_) => obs::record_pipeline_outcome(KIND, PipelineOutcome::Success),
			Err(_) => obs::record_pipeline_outcome(KIND, PipelineOutcome::Failure),
		}

		result
	}

	async fn send_inner(&self, request: RestRequest) -> Result<RestResponse> {
		let wire = self.assemble(&request)?;
		let first = match common::load_stored(self).await {
			Some(pair) => wire.clone().with_bearer(&pair.access),
			None => wire.clone(),
		};
		let response = self.transport.dispatch(first).await?;

		if !response.is_unauthorized() {
			return Ok(response.into());
		}

		let Some(minted) = self.refresh_session().await else {
			self.run_logout_fallback().await;

			return Err(Error::Unauthenticated {
				status: response.status,
				reason: common::body_preview(&response.body),
			});
		};
		let replayed = self.transport.dispatch(wire.with_bearer(&minted.access)).await?;

		if replayed.is_unauthorized() {
			return Err(Error::Unauthenticated {
				status: replayed.status,
				reason: common::body_preview(&replayed.body),
			});
		}

		Ok(replayed.into())
	}

	fn assemble(&self, request: &RestRequest) -> Result<WireRequest> {
		let url = self.descriptor.rest_base.join(&request.path).map_err(|source| {
			ConfigError::InvalidRequestPath { path: request.path.clone(), source }
		})?;
		let mut wire = WireRequest::new(request.method, url);

		for (name, value) in &request.headers {
			wire = wire.with_header(name.clone(), value.clone());
		}

		if let Some(body) = &request.body {
			let bytes = serde_json::to_vec(body)
				.map_err(|source| ConfigError::RequestEncode { source })?;

			wire = wire.with_header(CONTENT_TYPE, "application/json").with_body(bytes);
		}

		Ok(wire)
	}
}
