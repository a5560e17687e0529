//! Demonstrates concurrent protected calls that hit an expired token: one refresh is issued, the
//! calls wait in the pending queue, and all of them are replayed with the new credential.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_coordinator::{
	Coordinator,
	auth::AccessToken,
	event::AuthEvent,
	http::{HttpTarget, ReqwestTransport},
	request::RequestDescriptor,
	store::{MemoryTokenStore, TokenStore},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer expired-access");
			then.status(401);
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let _profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer demo-access");
			then.status(200).body("{\"name\":\"demo\"}");
		})
		.await;
	let store = Arc::new(MemoryTokenStore::with_token(
		AccessToken::new("expired-access").with_refresh_token("demo-refresh"),
	));
	let token_url = Url::parse(&server.url("/token"))?;
	let coordinator = Coordinator::<ReqwestTransport>::builder(
		ReqwestTransport::try_current()?,
		store.clone(),
		move |current: &AccessToken| -> oauth2_coordinator::error::Result<_> {
			let refresh =
				current.refresh_token.as_ref().map(|secret| secret.expose()).unwrap_or_default();

			Ok(RequestDescriptor::public(HttpTarget::post_form(
				token_url.clone(),
				[("grant_type", "refresh_token"), ("refresh_token", refresh)],
			)))
		},
	)
	.notifier(Arc::new(|event: &AuthEvent| println!("Coordinator event: {event}.")))
	.build();
	let profile = Url::parse(&server.url("/profile"))?;
	let calls = (0..3)
		.map(|_| coordinator.send(RequestDescriptor::authorized(HttpTarget::get(profile.clone()))))
		.collect::<Vec<_>>();

	for (i, call) in calls.into_iter().enumerate() {
		let response = call.await?;

		println!(
			"Call {i} returned {}: {}.",
			response.status,
			String::from_utf8_lossy(&response.body)
		);
	}

	if let Some(token) = store.access_token() {
		println!("Stored access token: {}.", token.access_token.expose());
	}

	token_mock.assert_async().await;

	Ok(())
}
