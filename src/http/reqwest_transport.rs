//! Reqwest-backed [`Transport`] that runs each call as a task on a tokio runtime.

// crates.io
use reqwest::{
	Method,
	header::{AUTHORIZATION, CONTENT_LENGTH},
};
use tokio::runtime::Handle;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::TransportError,
	http::{
		CancelHandle, Completion, Failure, HttpTarget, Progress, ProgressSink, Response,
		Transport,
	},
};

/// Thin wrapper around [`ReqwestClient`] that executes [`HttpTarget`]s.
///
/// Non-2xx responses are reported as failures that keep the response, so challenge
/// classification can inspect the status and body. Cancelling a call aborts its task.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	runtime: Handle,
}
impl ReqwestTransport {
	/// Builds a transport with a default client that spawns onto the current tokio runtime.
	pub fn try_current() -> Result<Self, TransportError> {
		let runtime = Handle::try_current()
			.map_err(|e| TransportError::Other { message: format!("no tokio runtime: {e}") })?;

		Ok(Self::with_client(ReqwestClient::default(), runtime))
	}

	/// Wraps an existing client and runtime handle.
	pub fn with_client(client: ReqwestClient, runtime: Handle) -> Self {
		Self { client, runtime }
	}

	async fn run(
		client: ReqwestClient,
		target: HttpTarget,
		authorization: Option<String>,
		progress: Option<ProgressSink>,
	) -> Result<Response, Failure> {
		let method = Method::from_bytes(target.method.as_bytes()).map_err(|e| {
			Failure::new(TransportError::Other { message: format!("invalid method: {e}") })
		})?;
		let mut request = client.request(method, target.url);

		for (name, value) in target.headers {
			request = request.header(name, value);
		}
		if let Some(value) = authorization {
			request = request.header(AUTHORIZATION, value);
		}
		if let Some(body) = target.body {
			request = request.body(body);
		}

		let mut response = request.send().await.map_err(TransportError::from)?;
		let status = response.status().as_u16();
		let headers = response
			.headers()
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
			})
			.collect::<Vec<_>>();
		let total = response
			.headers()
			.get(CONTENT_LENGTH)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.parse::<u64>().ok());
		let mut body = Vec::new();

		while let Some(chunk) = response.chunk().await.map_err(TransportError::from)? {
			body.extend_from_slice(&chunk);

			if let Some(sink) = &progress {
				sink(Progress { completed: body.len() as u64, total });
			}
		}

		let response = Response { status, headers, body };

		if response.is_success() { Ok(response) } else { Err(Failure::from_response(response)) }
	}
}
impl Transport for ReqwestTransport {
	type Target = HttpTarget;

	fn execute(
		&self,
		target: &Self::Target,
		credential: Option<&AccessToken>,
		progress: Option<ProgressSink>,
		completion: Completion,
	) -> CancelHandle {
		let client = self.client.clone();
		let target = target.clone();
		let authorization = credential.map(AccessToken::authorization_header);
		let task = self.runtime.spawn(async move {
			let outcome = Self::run(client, target, authorization, progress).await;

			completion.complete(outcome);
		});
		let abort = task.abort_handle();

		// An aborted task drops its completion, which reports `Abandoned`.
		Box::new(move || abort.abort())
	}
}
