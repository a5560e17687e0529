#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicU64, AtomicUsize, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
// self
use oauth2_coordinator::{
	Coordinator,
	auth::AccessToken,
	error::{Result, TransportError},
	event::{AuthEvent, EventNotifier},
	http::{CancelHandle, Completion, Failure, Outcome, ProgressSink, Response, Transport},
	request::RequestDescriptor,
	store::{MemoryTokenStore, TokenStore},
};

pub const TOKEN_PATH: &str = "/token";

type Responder = dyn Fn(&str, Option<&str>) -> Option<Outcome> + Send + Sync;

/// One recorded `execute` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
	pub target: String,
	pub credential: Option<String>,
}

struct PendingCall {
	seq: u64,
	call: Call,
	completion: Completion,
}

#[derive(Default)]
struct Shared {
	log: Mutex<Vec<Call>>,
	pending: Mutex<VecDeque<PendingCall>>,
	responder: Mutex<Option<Arc<Responder>>>,
	next_seq: AtomicU64,
	cancelled: AtomicUsize,
}

/// Transport driven by the test: calls stay pending until completed by hand, unless the
/// responder answers them synchronously.
#[derive(Clone, Default)]
pub struct ScriptedTransport(Arc<Shared>);
impl ScriptedTransport {
	pub fn with_responder<F>(self, responder: F) -> Self
	where
		F: 'static + Send + Sync + Fn(&str, Option<&str>) -> Option<Outcome>,
	{
		*self.0.responder.lock() = Some(Arc::new(responder));

		self
	}

	pub fn calls(&self) -> Vec<Call> {
		self.0.log.lock().clone()
	}

	pub fn calls_to(&self, target: &str) -> Vec<Call> {
		self.calls().into_iter().filter(|call| call.target == target).collect()
	}

	pub fn pending_targets(&self) -> Vec<String> {
		self.0.pending.lock().iter().map(|pending| pending.call.target.clone()).collect()
	}

	pub fn cancelled(&self) -> usize {
		self.0.cancelled.load(Ordering::SeqCst)
	}

	/// Completes the oldest pending call to `target`; returns its credential.
	pub fn complete(&self, target: &str, outcome: Outcome) -> Option<String> {
		let pending = {
			let mut queue = self.0.pending.lock();
			let position = queue.iter().position(|pending| pending.call.target == target)?;

			queue.remove(position)?
		};
		let credential = pending.call.credential.clone();

		pending.completion.complete(outcome);

		Some(credential.unwrap_or_default())
	}

	/// Completes every pending call to `target` with an outcome derived from its credential.
	pub fn complete_all<F>(&self, target: &str, outcome: F) -> usize
	where
		F: Fn(Option<&str>) -> Outcome,
	{
		let mut completed = 0;

		loop {
			let pending = {
				let mut queue = self.0.pending.lock();
				let Some(position) = queue.iter().position(|pending| pending.call.target == target)
				else {
					break;
				};

				queue.remove(position)
			};
			let Some(pending) = pending else { break };
			let result = outcome(pending.call.credential.as_deref());

			pending.completion.complete(result);

			completed += 1;
		}

		completed
	}
}
impl Transport for ScriptedTransport {
	type Target = String;

	fn execute(
		&self,
		target: &String,
		credential: Option<&AccessToken>,
		_: Option<ProgressSink>,
		completion: Completion,
	) -> CancelHandle {
		let call = Call {
			target: target.clone(),
			credential: credential.map(|token| token.access_token.expose().to_owned()),
		};

		self.0.log.lock().push(call.clone());

		let responder = self.0.responder.lock().clone();

		if let Some(outcome) =
			responder.and_then(|responder| responder(&call.target, call.credential.as_deref()))
		{
			completion.complete(outcome);

			return Box::new(|| {});
		}

		let seq = self.0.next_seq.fetch_add(1, Ordering::SeqCst);

		self.0.pending.lock().push_back(PendingCall { seq, call, completion });

		let shared = self.0.clone();

		Box::new(move || {
			let removed = {
				let mut queue = shared.pending.lock();

				queue
					.iter()
					.position(|pending| pending.seq == seq)
					.and_then(|position| queue.remove(position))
			};

			if let Some(pending) = removed {
				shared.cancelled.fetch_add(1, Ordering::SeqCst);
				pending.completion.fail(TransportError::Cancelled);
			}
		})
	}
}

/// Captures event labels in emission order.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<&'static str>>>);
impl EventLog {
	pub fn labels(&self) -> Vec<&'static str> {
		self.0.lock().clone()
	}
}
impl EventNotifier for EventLog {
	fn emit(&self, event: &AuthEvent) {
		self.0.lock().push(event.as_str());
	}
}

/// Collects callback outcomes keyed by a test label.
#[derive(Clone, Default)]
pub struct Outcomes(Arc<Mutex<Vec<(String, Result<Response>)>>>);
impl Outcomes {
	pub fn callback(
		&self,
		label: impl Into<String>,
	) -> impl 'static + Send + FnOnce(Result<Response>) {
		let sink = self.0.clone();
		let label = label.into();

		move |outcome| sink.lock().push((label, outcome))
	}

	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	pub fn labels(&self) -> Vec<String> {
		self.0.lock().iter().map(|(label, _)| label.clone()).collect()
	}

	pub fn take(&self) -> Vec<(String, Result<Response>)> {
		std::mem::take(&mut *self.0.lock())
	}
}

pub fn ok(body: &str) -> Outcome {
	Ok(Response::new(200, body))
}

pub fn status(code: u16, body: &str) -> Outcome {
	Err(Failure::from_response(Response::new(code, body)))
}

pub fn unauthorized() -> Outcome {
	status(401, "")
}

pub fn token_body(access: &str, refresh: Option<&str>) -> String {
	match refresh {
		Some(refresh) => format!(
			r#"{{"access_token":"{access}","token_type":"Bearer","expires_in":3600,"refresh_token":"{refresh}"}}"#
		),
		None => format!(r#"{{"access_token":"{access}","token_type":"Bearer","expires_in":3600}}"#),
	}
}

pub fn refresh_request(_: &AccessToken) -> Result<RequestDescriptor<String>> {
	Ok(RequestDescriptor::public(TOKEN_PATH.to_owned()))
}

pub fn seeded_store(access: &str, refresh: Option<&str>) -> Arc<MemoryTokenStore> {
	let mut token = AccessToken::new(access).with_token_type("Bearer");

	if let Some(refresh) = refresh {
		token = token.with_refresh_token(refresh);
	}

	Arc::new(MemoryTokenStore::with_token(token))
}

pub fn stored_access(store: &dyn TokenStore) -> Option<String> {
	store.access_token().map(|token| token.access_token.expose().to_owned())
}

/// Coordinator over a scripted transport with an event log attached.
pub fn coordinator(
	transport: &ScriptedTransport,
	store: Arc<MemoryTokenStore>,
) -> (Coordinator<ScriptedTransport>, EventLog) {
	let events = EventLog::default();
	let coordinator =
		Coordinator::<ScriptedTransport>::builder(transport.clone(), store, refresh_request)
			.notifier(Arc::new(events.clone()))
			.build();

	(coordinator, events)
}
