//! Transport contract consumed by the coordinator.
//!
//! The module exposes [`Transport`] alongside the [`Response`]/[`Failure`] outcome types and the
//! single-use [`Completion`] slot, so downstream crates can plug in any HTTP stack. A transport
//! receives the request target, the bearer credential chosen by the coordinator (if the request
//! needs one), an optional progress sink, and a [`Completion`]. It must resolve the completion
//! exactly once, from any thread; dropping it unresolved reports [`TransportError::Abandoned`]
//! so callers are never left waiting.

#[cfg(feature = "reqwest")] mod reqwest_transport;

#[cfg(feature = "reqwest")] pub use reqwest_transport::ReqwestTransport;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{OAuthError, TransportError},
};

/// Boxed cancellation handle returned by [`Transport::execute`].
pub type CancelHandle = Box<dyn Cancellable>;
/// Shared progress callback handed to transports.
pub type ProgressSink = Arc<dyn Fn(Progress) + Send + Sync>;
/// Terminal transport outcome.
pub type Outcome = Result<Response, Failure>;

type CompletionFn = Box<dyn FnOnce(Outcome) + Send>;

/// Abstraction over HTTP stacks capable of executing request targets asynchronously.
///
/// Implementations must be `Send + Sync + 'static`; the coordinator shares them across
/// threads and calls [`execute`](Transport::execute) from caller threads as well as from
/// completion callbacks of earlier requests.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Transport-specific description of one call (URL, method, body, ...).
	type Target: 'static + Clone + Send + Sync;

	/// Starts executing `target`.
	///
	/// # Contract
	///
	/// - Attach `credential` (see [`AccessToken::authorization_header`]) when it is `Some`.
	/// - Resolve `completion` exactly once, on any thread, possibly before returning.
	/// - Support cancellation through the returned handle until the completion resolves.
	fn execute(
		&self,
		target: &Self::Target,
		credential: Option<&AccessToken>,
		progress: Option<ProgressSink>,
		completion: Completion,
	) -> CancelHandle;
}

/// Something that can stop an in-flight call.
pub trait Cancellable
where
	Self: Send + Sync,
{
	/// Requests cancellation. Must be idempotent.
	fn cancel(&self);
}
impl<F> Cancellable for F
where
	F: Fn() + Send + Sync,
{
	fn cancel(&self) {
		self()
	}
}

/// Cancellation handle for calls that cannot be interrupted.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCancel;
impl Cancellable for NoopCancel {
	fn cancel(&self) {}
}

/// Transfer progress reported by transports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
	/// Bytes transferred so far.
	pub completed: u64,
	/// Expected total, when the transport knows it.
	pub total: Option<u64>,
}

/// HTTP response handed back by transports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
	/// HTTP status code.
	pub status: u16,
	/// Response headers in arrival order.
	pub headers: Vec<(String, String)>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl Response {
	/// Creates a response with the provided status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Vec::new(), body: body.into() }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Returns the first header matching `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Deserializes the body as JSON, reporting the failing path.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
	}

	/// Parses an RFC 6749 §5.2 error document from the body, if it is one.
	pub fn oauth_error(&self) -> Option<OAuthError> {
		#[derive(Deserialize)]
		struct ErrorDocument {
			error: String,
			#[serde(default)]
			error_description: Option<String>,
		}

		let document: ErrorDocument = serde_json::from_slice(&self.body).ok()?;

		OAuthError::from_code(&document.error, document.error_description.as_deref())
	}
}

/// Failed transport outcome; keeps the response when the server answered.
#[derive(Clone, Debug)]
pub struct Failure {
	/// Transport-level error.
	pub error: TransportError,
	/// Response that produced the failure, if any.
	pub response: Option<Response>,
}
impl Failure {
	/// Failure without a response (network errors, cancellation, ...).
	pub fn new(error: impl Into<TransportError>) -> Self {
		Self { error: error.into(), response: None }
	}

	/// Failure caused by a non-success response.
	pub fn from_response(response: Response) -> Self {
		Self { error: TransportError::Status { status: response.status }, response: Some(response) }
	}

	/// HTTP status of the failure, from the response or the error.
	pub fn status(&self) -> Option<u16> {
		self.response.as_ref().map(|response| response.status).or_else(|| self.error.status())
	}
}
impl From<TransportError> for Failure {
	fn from(error: TransportError) -> Self {
		Self::new(error)
	}
}

/// Single-use completion slot for one transport call.
///
/// Consuming the slot delivers the outcome; the type system rules out a second delivery. If
/// the slot is dropped unresolved it reports [`TransportError::Abandoned`].
pub struct Completion(Option<CompletionFn>);
impl Completion {
	/// Wraps the callback that receives the outcome.
	pub fn new<F>(f: F) -> Self
	where
		F: 'static + Send + FnOnce(Outcome),
	{
		Self(Some(Box::new(f)))
	}

	/// Delivers `outcome`.
	pub fn complete(mut self, outcome: Outcome) {
		if let Some(f) = self.0.take() {
			f(outcome);
		}
	}

	/// Delivers a successful response.
	pub fn succeed(self, response: Response) {
		self.complete(Ok(response));
	}

	/// Delivers a failure.
	pub fn fail(self, failure: impl Into<Failure>) {
		self.complete(Err(failure.into()));
	}
}
impl Drop for Completion {
	fn drop(&mut self) {
		if let Some(f) = self.0.take() {
			f(Err(Failure::new(TransportError::Abandoned)));
		}
	}
}
impl Debug for Completion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Completion").field(&self.0.as_ref().map(|_| "pending")).finish()
	}
}

/// Plain HTTP request description usable by any [`Transport`] over HTTP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpTarget {
	/// Upper-case HTTP method.
	pub method: String,
	/// Absolute request URL.
	pub url: Url,
	/// Extra request headers.
	pub headers: Vec<(String, String)>,
	/// Request body.
	pub body: Option<Vec<u8>>,
}
impl HttpTarget {
	/// Creates a target for `method` + `url`.
	pub fn new(method: impl AsRef<str>, url: Url) -> Self {
		Self {
			method: method.as_ref().to_ascii_uppercase(),
			url,
			headers: Vec::new(),
			body: None,
		}
	}

	/// `GET` target.
	pub fn get(url: Url) -> Self {
		Self::new("GET", url)
	}

	/// `POST` target with an `application/x-www-form-urlencoded` body.
	pub fn post_form<'a, I>(url: Url, pairs: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();

		Self::new("POST", url)
			.with_header("content-type", "application/x-www-form-urlencoded")
			.with_body(body)
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Replaces the body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}
}
