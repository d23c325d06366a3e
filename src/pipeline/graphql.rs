//! GraphQL pipeline: validity-gated bearer attachment and auth-error classification.

// self
use crate::{
	_prelude::*,
	http::{HttpTransport, WireResponse},
	obs::{self, PipelineKind, PipelineOutcome, PipelineSpan},
	pipeline::{SessionBroker, common, wire},
};

/// Extension code GraphQL backends attach to credential rejections.
const UNAUTHENTICATED_CODE: &str = "UNAUTHENTICATED";

/// GraphQL operation submitted through the broker.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
	/// Query or mutation document text.
	pub query: String,
	/// Operation to run when the document defines several.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub operation_name: Option<String>,
	/// Variables object referenced by the document.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub variables: Option<serde_json::Value>,
}
impl GraphqlRequest {
	/// Creates a request for the provided document.
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), operation_name: None, variables: None }
	}

	/// Names the operation to run.
	pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
		self.operation_name = Some(name.into());

		self
	}

	/// Attaches (or replaces) the variables object.
	pub fn with_variables(mut self, variables: serde_json::Value) -> Self {
		self.variables = Some(variables);

		self
	}
}

/// Reply envelope surfaced to callers.
///
/// Mixed replies are forwarded as-is: `data` and `errors` can both be populated, and
/// non-auth errors are the caller's to interpret.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphqlReply {
	/// Operation data, when the backend produced any.
	#[serde(default)]
	pub data: Option<serde_json::Value>,
	/// Error entries accompanying (or replacing) the data.
	#[serde(default)]
	pub errors: Vec<GraphqlErrorEntry>,
}
impl GraphqlReply {
	/// Classifies this reply's error list at the transport boundary.
	///
	/// An entry signals a rejected credential when its `extensions.code` equals
	/// `UNAUTHENTICATED` or its message contains the literal substring `401`. Only the
	/// first matching entry is reported; later entries in the same reply never drive a
	/// second recovery cycle. This is the only place that inspects GraphQL error
	/// shapes; the pipeline dispatches on the returned enum alone.
	pub fn classify(&self) -> FailureClass {
		let rejection = self.errors.iter().find(|entry| {
			entry.extensions.code.as_deref() == Some(UNAUTHENTICATED_CODE)
				|| entry.message.contains("401")
		});

		match rejection {
			Some(entry) => FailureClass::AuthRejected { reason: entry.message.clone() },
			None => FailureClass::Other,
		}
	}
}

/// Single error entry from a GraphQL reply.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphqlErrorEntry {
	/// Human-readable error message.
	#[serde(default)]
	pub message: String,
	/// Structured extensions; `code` is the part the broker understands.
	#[serde(default)]
	pub extensions: GraphqlErrorExtensions,
}

/// Machine-readable extensions carried by a GraphQL error entry.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphqlErrorExtensions {
	/// Error code, `UNAUTHENTICATED` for credential rejections.
	#[serde(default)]
	pub code: Option<String>,
}

/// Closed classification of a reply's error list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureClass {
	/// The backend rejected the operation's credential.
	AuthRejected {
		/// Message of the first auth-related error entry.
		reason: String,
	},
	/// No credential rejection; the reply belongs to the caller untouched.
	Other,
}

enum ScreenedReply {
	Clean(GraphqlReply),
	Rejected { status: u16, reason: String },
}

impl<T> SessionBroker<T>
where
	T: ?Sized + HttpTransport,
{
	/// Executes a GraphQL operation with silent credential recovery.
	///
	/// The stored access token is attached only while it is outside the expiry leeway;
	/// a token known to be stale is withheld so the backend's rejection stays
	/// authoritative. A rejection (HTTP 401, or a reply error classified as
	/// [`FailureClass::AuthRejected`]) triggers one refresh followed by one forward of
	/// the operation with the fresh bearer; if the refresh yields nothing the broker
	/// runs its logout fallback and the original rejection reaches the caller. Replies
	/// without a credential rejection pass through unmodified, error entries included.
	pub async fn execute(&self, request: GraphqlRequest) -> Result<GraphqlReply> {
		const KIND: PipelineKind = PipelineKind::Graphql;

		let span = PipelineSpan::new(KIND, "execute");

		obs::record_pipeline_outcome(KIND, PipelineOutcome::Attempt);

		let result = span.instrument(self.execute_inner(request)).await;

		match &result {
			Ok(_) => obs::record_pipeline_outcome(KIND, PipelineOutcome::Success),
			Err(_) => obs::record_pipeline_outcome(KIND, PipelineOutcome::Failure),
		}

		result
	}

	async fn execute_inner(&self, request: GraphqlRequest) -> Result<GraphqlReply> {
		let wire = wire::graphql_post(&self.descriptor.graphql, &request)?;
		let now = OffsetDateTime::now_utc();
		let first = match common::load_stored(self).await {
			Some(pair) if !pair.access_expired_at(now) => wire.clone().with_bearer(&pair.access),
			_ => wire.clone(),
		};
		let response = self.transport.dispatch(first).await?;
		let (status, reason) = match Self::screen(&response)? {
			ScreenedReply::Clean(reply) => return Ok(reply),
			ScreenedReply::Rejected { status, reason } => (status, reason),
		};

		let Some(minted) = self.refresh_session().await else {
			self.run_logout_fallback().await;

			return Err(Error::Unauthenticated { status, reason });
		};
		let forwarded = self.transport.dispatch(wire.with_bearer(&minted.access)).await?;

		match Self::screen(&forwarded)? {
			ScreenedReply::Clean(reply) => Ok(reply),
			ScreenedReply::Rejected { status, reason } =>
				Err(Error::Unauthenticated { status, reason }),
		}
	}

	/// Splits a response into a clean reply or a credential rejection.
	///
	/// An HTTP 401 short-circuits before decoding since its body need not be a GraphQL
	/// envelope; everything else must decode, and the decoded error list is classified
	/// via [`GraphqlReply::classify`].
	fn screen(response: &WireResponse) -> Result<ScreenedReply> {
		if response.is_unauthorized() {
			return Ok(ScreenedReply::Rejected {
				status: response.status,
				reason: common::body_preview(&response.body),
			});
		}

		let reply: GraphqlReply = common::decode_json(response)?;

		Ok(match reply.classify() {
			FailureClass::AuthRejected { reason } =>
				ScreenedReply::Rejected { status: response.status, reason },
			FailureClass::Other => ScreenedReply::Clean(reply),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn entry(message: &str, code: Option<&str>) -> GraphqlErrorEntry {
		GraphqlErrorEntry {
			message: message.into(),
			extensions: GraphqlErrorExtensions { code: code.map(Into::into) },
		}
	}

	#[test]
	fn classify_detects_the_unauthenticated_code() {
		let reply = GraphqlReply {
			data: None,
			errors: vec![entry("not signed in", Some(UNAUTHENTICATED_CODE))],
		};

		assert_eq!(reply.classify(), FailureClass::AuthRejected {
			reason: "not signed in".into()
		});
	}

	#[test]
	fn classify_detects_the_401_substring() {
		let reply = GraphqlReply {
			data: None,
			errors: vec![entry("Received status code 401", None)],
		};

		assert_eq!(reply.classify(), FailureClass::AuthRejected {
			reason: "Received status code 401".into()
		});
	}

	#[test]
	fn classify_reports_only_the_first_auth_rejection() {
		let reply = GraphqlReply {
			data: None,
			errors: vec![
				entry("field `artist` is required", None),
				entry("first rejection", Some(UNAUTHENTICATED_CODE)),
				entry("second rejection", Some(UNAUTHENTICATED_CODE)),
			],
		};

		assert_eq!(reply.classify(), FailureClass::AuthRejected {
			reason: "first rejection".into()
		});
	}

	#[test]
	fn classify_passes_ordinary_errors_through() {
		let reply = GraphqlReply {
			data: Some(serde_json::json!({ "bookings": [] })),
			errors: vec![entry("field `artist` is required", Some("BAD_USER_INPUT"))],
		};

		assert_eq!(reply.classify(), FailureClass::Other);
	}

	#[test]
	fn reply_envelope_decodes_with_defaults() {
		let reply: GraphqlReply = serde_json::from_str(r#"{"data":{"ok":true}}"#)
			.expect("Envelope without errors should decode.");

		assert!(reply.errors.is_empty());
		assert_eq!(reply.data, Some(serde_json::json!({ "ok": true })));

		let reply: GraphqlReply =
			serde_json::from_str(r#"{"errors":[{"message":"boom","extensions":{"code":"INTERNAL"}}]}"#)
				.expect("Envelope without data should decode.");

		assert_eq!(reply.data, None);
		assert_eq!(reply.errors[0].extensions.code.as_deref(), Some("INTERNAL"));
	}
}
