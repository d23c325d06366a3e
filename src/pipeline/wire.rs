//! Wire payloads for the refresh and revoke routes.
//!
//! Both routes exist in a REST and a GraphQL shape; the descriptor picks one per
//! backend. Requests built here are dispatched through the raw transport, never
//! through the instrumented pipelines, so a rejected refresh can never recurse into
//! another refresh.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	backend::{RefreshRoute, RevokeRoute},
	error::ConfigError,
	http::{CONTENT_TYPE, WireMethod, WireRequest, WireResponse},
	pipeline::{common, graphql::GraphqlRequest},
};

pub(crate) const REFRESH_MUTATION: &str = "mutation RefreshToken($input: RefreshTokenInput!) { refreshToken(input: $input) { jwt refreshToken } }";
pub(crate) const REVOKE_MUTATION: &str =
	"mutation LogoutWithRefresh($input: RefreshTokenInput!) { logoutWithRefresh(input: $input) }";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenInput<'a> {
	refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintedPair {
	jwt: String,
	refresh_token: String,
}
impl From<MintedPair> for TokenPair {
	fn from(minted: MintedPair) -> Self {
		Self::new(minted.jwt, minted.refresh_token)
	}
}

#[derive(Deserialize)]
struct RefreshEnvelope {
	#[serde(default)]
	data: Option<RefreshData>,
	#[serde(default)]
	errors: Vec<EnvelopeError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshData {
	#[serde(default)]
	refresh_token: Option<MintedPair>,
}

#[derive(Deserialize)]
struct EnvelopeError {
	#[serde(default)]
	message: String,
}

/// Builds the POST carrying a GraphQL request document to the provided endpoint.
pub(crate) fn graphql_post(url: &Url, request: &GraphqlRequest) -> Result<WireRequest> {
	let body =
		serde_json::to_vec(request).map_err(|source| ConfigError::RequestEncode { source })?;

	Ok(WireRequest::new(WireMethod::Post, url.clone())
		.with_header(CONTENT_TYPE, "application/json")
		.with_body(body))
}

/// Builds the refresh call for the descriptor's route shape.
pub(crate) fn refresh_request(
	route: &RefreshRoute,
	refresh_token: &str,
	timeout: Option<Duration>,
) -> Result<WireRequest> {
	let request = match route {
		RefreshRoute::Rest(url) => rest_token_post(url, refresh_token)?,
		RefreshRoute::Graphql(url) => graphql_token_post(url, REFRESH_MUTATION, refresh_token)?,
	};

	Ok(match timeout {
		Some(timeout) => request.with_timeout(timeout),
		None => request,
	})
}

/// Decodes the refresh reply for the descriptor's route shape into a fresh pair.
pub(crate) fn decode_refresh_reply(
	route: &RefreshRoute,
	response: &WireResponse,
) -> Result<TokenPair> {
	if !response.is_success() {
		return Err(Error::Upstream {
			status: response.status,
			preview: common::body_preview(&response.body),
		});
	}

	match route {
		RefreshRoute::Rest(_) => {
			let minted: MintedPair = common::decode_json(response)?;

			Ok(minted.into())
		},
		RefreshRoute::Graphql(_) => {
			let envelope: RefreshEnvelope = common::decode_json(response)?;

			if let Some(error) = envelope.errors.into_iter().next() {
				return Err(Error::Upstream { status: response.status, preview: error.message });
			}

			envelope.data.and_then(|data| data.refresh_token).map(TokenPair::from).ok_or_else(
				|| Error::Upstream {
					status: response.status,
					preview: "refresh mutation returned no token pair".into(),
				},
			)
		},
	}
}

/// Builds the revocation call for the descriptor's route shape.
pub(crate) fn revoke_request(
	route: &RevokeRoute,
	refresh_token: &str,
	timeout: Option<Duration>,
) -> Result<WireRequest> {
	let request = match route {
		RevokeRoute::Rest(url) => rest_token_post(url, refresh_token)?,
		RevokeRoute::Graphql(url) => graphql_token_post(url, REVOKE_MUTATION, refresh_token)?,
	};

	Ok(match timeout {
		Some(timeout) => request.with_timeout(timeout),
		None => request,
	})
}

fn rest_token_post(url: &Url, refresh_token: &str) -> Result<WireRequest> {
	let body = serde_json::to_vec(&RefreshTokenInput { refresh_token })
		.map_err(|source| ConfigError::RequestEncode { source })?;

	Ok(WireRequest::new(WireMethod::Post, url.clone())
		.with_header(CONTENT_TYPE, "application/json")
		.with_body(body))
}

fn graphql_token_post(url: &Url, mutation: &str, refresh_token: &str) -> Result<WireRequest> {
	let variables = serde_json::json!({ "input": RefreshTokenInput { refresh_token } });
	let request = GraphqlRequest::new(mutation).with_variables(variables);

	graphql_post(url, &request)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rest_refresh_request_carries_the_expected_payload() {
		let url = Url::parse("https://backend.test/auth/refresh").expect("URL fixture is valid.");
		let request =
			refresh_request(&RefreshRoute::Rest(url), "refresh-secret", Some(Duration::seconds(10)))
				.expect("REST refresh request should build.");

		assert_eq!(request.method, WireMethod::Post);
		assert_eq!(request.header(CONTENT_TYPE), Some("application/json"));
		assert_eq!(request.timeout, Some(Duration::seconds(10)));

		let body: serde_json::Value =
			serde_json::from_slice(request.body.as_deref().expect("Body should be present."))
				.expect("Body should be JSON.");

		assert_eq!(body, serde_json::json!({ "refreshToken": "refresh-secret" }));
	}

	#[test]
	fn graphql_refresh_request_wraps_the_mutation_envelope() {
		let url = Url::parse("https://backend.test/graphql").expect("URL fixture is valid.");
		let request = refresh_request(&RefreshRoute::Graphql(url), "refresh-secret", None)
			.expect("GraphQL refresh request should build.");
		let body: serde_json::Value =
			serde_json::from_slice(request.body.as_deref().expect("Body should be present."))
				.expect("Body should be JSON.");

		assert_eq!(body["query"], REFRESH_MUTATION);
		assert_eq!(body["variables"]["input"]["refreshToken"], "refresh-secret");
		assert_eq!(request.timeout, None);
	}

	#[test]
	fn rest_refresh_reply_decodes_into_a_pair() {
		let route = RefreshRoute::Rest(
			Url::parse("https://backend.test/auth/refresh").expect("URL fixture is valid."),
		);
		let response = WireResponse {
			status: 200,
			body: br#"{"jwt":"new-access","refreshToken":"new-refresh"}"#.to_vec(),
		};
		let pair = decode_refresh_reply(&route, &response).expect("Reply should decode.");

		assert_eq!(pair.access.expose(), "new-access");
		assert_eq!(pair.refresh.expose(), "new-refresh");
	}

	#[test]
	fn graphql_refresh_reply_requires_data_and_no_errors() {
		let route = RefreshRoute::Graphql(
			Url::parse("https://backend.test/graphql").expect("URL fixture is valid."),
		);
		let minted = WireResponse {
			status: 200,
			body: br#"{"data":{"refreshToken":{"jwt":"new-access","refreshToken":"new-refresh"}}}"#
				.to_vec(),
		};
		let pair = decode_refresh_reply(&route, &minted).expect("Reply should decode.");

		assert_eq!(pair.access.expose(), "new-access");

		let errored = WireResponse {
			status: 200,
			body: br#"{"data":null,"errors":[{"message":"refresh token expired"}]}"#.to_vec(),
		};
		let error = decode_refresh_reply(&route, &errored)
			.expect_err("Errors in the envelope should fail the refresh.");

		assert!(matches!(
			&error,
			Error::Upstream { status: 200, preview } if preview == "refresh token expired"
		));

		let empty = WireResponse { status: 200, body: br#"{"data":{}}"#.to_vec() };
		let error = decode_refresh_reply(&route, &empty)
			.expect_err("A reply without the minted pair should fail the refresh.");

		assert!(matches!(error, Error::Upstream { status: 200, .. }));
	}

	#[test]
	fn refresh_reply_rejects_non_success_statuses() {
		let route = RefreshRoute::Rest(
			Url::parse("https://backend.test/auth/refresh").expect("URL fixture is valid."),
		);
		let response = WireResponse { status: 401, body: b"refresh token revoked".to_vec() };
		let error = decode_refresh_reply(&route, &response)
			.expect_err("Rejected refresh should surface as an upstream error.");

		assert!(matches!(
			&error,
			Error::Upstream { status: 401, preview } if preview == "refresh token revoked"
		));
	}

	#[test]
	fn revoke_request_uses_the_logout_mutation() {
		let url = Url::parse("https://backend.test/graphql/auth").expect("URL fixture is valid.");
		let request = revoke_request(&RevokeRoute::Graphql(url), "refresh-secret", None)
			.expect("GraphQL revoke request should build.");
		let body: serde_json::Value =
			serde_json::from_slice(request.body.as_deref().expect("Body should be present."))
				.expect("Body should be JSON.");

		assert_eq!(body["query"], REVOKE_MUTATION);
		assert_eq!(body["variables"]["input"]["refreshToken"], "refresh-secret");
	}
}
