//! Backend descriptor data structures and validation shared by both pipelines.
//!
//! A descriptor names the REST base URL, the GraphQL endpoint, and the auth routes
//! (refresh, optional revoke) the broker dials when a credential is rejected. Every
//! endpoint is validated to use HTTPS at build time so tokens never travel in clear.

// self
use crate::_prelude::*;

/// Wire shape of the token refresh route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshRoute {
	/// REST endpoint accepting `{"refreshToken"}` and answering `{"jwt","refreshToken"}`.
	Rest(Url),
	/// GraphQL endpoint accepting the `RefreshToken` mutation.
	Graphql(Url),
}
impl RefreshRoute {
	/// Returns the route's URL regardless of wire shape.
	pub fn url(&self) -> &Url {
		match self {
			Self::Rest(url) | Self::Graphql(url) => url,
		}
	}
}

/// Wire shape of the refresh token revocation route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevokeRoute {
	/// REST endpoint accepting `{"refreshToken"}`.
	Rest(Url),
	/// GraphQL endpoint accepting the `LogoutWithRefresh` mutation.
	Graphql(Url),
}
impl RevokeRoute {
	/// Returns the route's URL regardless of wire shape.
	pub fn url(&self) -> &Url {
		match self {
			Self::Rest(url) | Self::Graphql(url) => url,
		}
	}
}

/// Immutable backend descriptor consumed by the pipelines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
	/// Base URL that REST request paths are joined against.
	pub rest_base: Url,
	/// GraphQL endpoint receiving operation POSTs.
	pub graphql: Url,
	/// Route used to exchange a refresh token for a fresh pair.
	pub refresh: RefreshRoute,
	/// Optional route used to invalidate the refresh token server-side on sign-out.
	pub revoke: Option<RevokeRoute>,
}
impl BackendDescriptor {
	/// Creates a new empty builder.
	pub fn builder() -> BackendDescriptorBuilder {
		BackendDescriptorBuilder::new()
	}
}

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum BackendDescriptorError {
	/// REST base URL is mandatory; the REST pipeline joins request paths against it.
	#[error("Missing REST base URL.")]
	MissingRestBase,
	/// GraphQL endpoint is mandatory for the GraphQL pipeline.
	#[error("Missing GraphQL endpoint.")]
	MissingGraphqlEndpoint,
	/// A refresh route is mandatory; without one a 401 can never recover silently.
	#[error("Missing refresh route.")]
	MissingRefreshRoute,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Builder for [`BackendDescriptor`] values.
#[derive(Debug, Default)]
pub struct BackendDescriptorBuilder {
	/// Base URL that REST request paths are joined against.
	pub rest_base: Option<Url>,
	/// GraphQL endpoint receiving operation POSTs.
	pub graphql: Option<Url>,
	/// Route used to exchange a refresh token for a fresh pair.
	pub refresh: Option<RefreshRoute>,
	/// Optional route used to invalidate the refresh token server-side.
	pub revoke: Option<RevokeRoute>,
}
impl BackendDescriptorBuilder {
	/// Creates a new empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the REST base URL.
	pub fn rest_base(mut self, url: Url) -> Self {
		self.rest_base = Some(url);

		self
	}

	/// Sets the GraphQL endpoint.
	pub fn graphql_endpoint(mut self, url: Url) -> Self {
		self.graphql = Some(url);

		self
	}

	/// Sets the refresh route.
	pub fn refresh_route(mut self, route: RefreshRoute) -> Self {
		self.refresh = Some(route);

		self
	}

	/// Sets the optional revoke route.
	pub fn revoke_route(mut self, route: RevokeRoute) -> Self {
		self.revoke = Some(route);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<BackendDescriptor, BackendDescriptorError> {
		let rest_base = self.rest_base.ok_or(BackendDescriptorError::MissingRestBase)?;
		let graphql = self.graphql.ok_or(BackendDescriptorError::MissingGraphqlEndpoint)?;
		let refresh = self.refresh.ok_or(BackendDescriptorError::MissingRefreshRoute)?;
		let descriptor = BackendDescriptor { rest_base, graphql, refresh, revoke: self.revoke };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl BackendDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), BackendDescriptorError> {
		validate_endpoint("REST base", &self.rest_base)?;
		validate_endpoint("GraphQL", &self.graphql)?;
		validate_endpoint("refresh", self.refresh.url())?;

		if let Some(revoke) = self.revoke.as_ref() {
			validate_endpoint("revoke", revoke.url())?;
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), BackendDescriptorError> {
	if url.scheme() != "https" {
		Err(BackendDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
