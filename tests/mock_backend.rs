// self
use session_broker::{
	_preludet::*,
	backend::{BackendDescriptor, BackendDescriptorError, RefreshRoute, RevokeRoute},
};

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse mock backend URL.")
}

#[test]
fn descriptor_rejects_missing_endpoints() {
	let err = BackendDescriptor::builder()
		.graphql_endpoint(url("https://backend.example.com/graphql"))
		.refresh_route(RefreshRoute::Rest(url("https://backend.example.com/auth/refresh")))
		.build()
		.expect_err("Descriptor builder should reject a missing REST base URL.");

	assert!(matches!(err, BackendDescriptorError::MissingRestBase));

	let err = BackendDescriptor::builder()
		.rest_base(url("https://backend.example.com/api/"))
		.refresh_route(RefreshRoute::Rest(url("https://backend.example.com/auth/refresh")))
		.build()
		.expect_err("Descriptor builder should reject a missing GraphQL endpoint.");

	assert!(matches!(err, BackendDescriptorError::MissingGraphqlEndpoint));

	let err = BackendDescriptor::builder()
		.rest_base(url("https://backend.example.com/api/"))
		.graphql_endpoint(url("https://backend.example.com/graphql"))
		.build()
		.expect_err("Descriptor builder should reject a missing refresh route.");

	assert!(matches!(err, BackendDescriptorError::MissingRefreshRoute));
}

#[test]
fn descriptor_rejects_insecure_endpoints() {
	let err = BackendDescriptor::builder()
		.rest_base(url("http://backend.example.com/api/"))
		.graphql_endpoint(url("https://backend.example.com/graphql"))
		.refresh_route(RefreshRoute::Rest(url("https://backend.example.com/auth/refresh")))
		.build()
		.expect_err("Descriptor builder should reject an insecure REST base URL.");

	assert!(matches!(err, BackendDescriptorError::InsecureEndpoint { endpoint: "REST base", .. }));

	let err = BackendDescriptor::builder()
		.rest_base(url("https://backend.example.com/api/"))
		.graphql_endpoint(url("https://backend.example.com/graphql"))
		.refresh_route(RefreshRoute::Graphql(url("http://backend.example.com/graphql")))
		.build()
		.expect_err("Descriptor builder should reject an insecure refresh route.");

	assert!(matches!(err, BackendDescriptorError::InsecureEndpoint { endpoint: "refresh", .. }));

	let err = BackendDescriptor::builder()
		.rest_base(url("https://backend.example.com/api/"))
		.graphql_endpoint(url("https://backend.example.com/graphql"))
		.refresh_route(RefreshRoute::Rest(url("https://backend.example.com/auth/refresh")))
		.revoke_route(RevokeRoute::Rest(url("http://backend.example.com/auth/logout")))
		.build()
		.expect_err("Descriptor builder should reject an insecure revoke route.");

	assert!(matches!(err, BackendDescriptorError::InsecureEndpoint { endpoint: "revoke", .. }));
}

#[test]
fn descriptor_exposes_validated_routes() {
	let descriptor = BackendDescriptor::builder()
		.rest_base(url("https://backend.example.com/api/"))
		.graphql_endpoint(url("https://backend.example.com/graphql"))
		.refresh_route(RefreshRoute::Graphql(url("https://backend.example.com/graphql")))
		.revoke_route(RevokeRoute::Graphql(url("https://backend.example.com/graphql")))
		.build()
		.expect("Descriptor builder should succeed for secure endpoints.");

	assert_eq!(descriptor.rest_base.as_str(), "https://backend.example.com/api/");
	assert_eq!(descriptor.graphql.as_str(), "https://backend.example.com/graphql");
	assert_eq!(descriptor.refresh.url().as_str(), "https://backend.example.com/graphql");
	assert_eq!(
		descriptor
			.revoke
			.as_ref()
			.expect("Revoke route should be populated when configured.")
			.url()
			.as_str(),
		"https://backend.example.com/graphql",
	);
}

#[test]
fn descriptor_revoke_route_stays_optional() {
	let descriptor = BackendDescriptor::builder()
		.rest_base(url("https://backend.example.com/api/"))
		.graphql_endpoint(url("https://backend.example.com/graphql"))
		.refresh_route(RefreshRoute::Rest(url("https://backend.example.com/auth/refresh")))
		.build()
		.expect("Descriptor builder should succeed without a revoke route.");

	assert!(descriptor.revoke.is_none());
}
