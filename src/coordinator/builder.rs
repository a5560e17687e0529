//! Coordinator configuration.

// std
use std::sync::atomic::AtomicU64;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	coordinator::{Coordinator, CoordinatorMetrics, Inner, Phase, State, queue::PendingQueue},
	event::{EventNotifier, LifecycleHook, NoopNotifier},
	http::Transport,
	request::{ChallengeValidation, RequestDescriptor},
	store::TokenStore,
};

/// Builds the refresh call from the currently stored token.
///
/// The refresh response is always parsed as an access token and saved, whatever
/// [`TokenEffect`](crate::request::TokenEffect) the returned descriptor carries.
pub trait RefreshRequestFactory<R>
where
	Self: Send + Sync,
{
	/// Returns the descriptor of the refresh call for `current`.
	fn refresh_request(&self, current: &AccessToken) -> Result<RequestDescriptor<R>>;
}
impl<R, F> RefreshRequestFactory<R> for F
where
	F: Send + Sync + Fn(&AccessToken) -> Result<RequestDescriptor<R>>,
{
	fn refresh_request(&self, current: &AccessToken) -> Result<RequestDescriptor<R>> {
		self(current)
	}
}

/// Builder for [`Coordinator`] values.
pub struct CoordinatorBuilder<T>
where
	T: Transport,
{
	transport: Arc<T>,
	store: Arc<dyn TokenStore>,
	refresh_factory: Arc<dyn RefreshRequestFactory<T::Target>>,
	notifier: Arc<dyn EventNotifier>,
	lifecycle: Option<Arc<dyn LifecycleHook>>,
	default_validation: ChallengeValidation,
}
impl<T> CoordinatorBuilder<T>
where
	T: Transport,
{
	pub(crate) fn new(
		transport: Arc<T>,
		store: Arc<dyn TokenStore>,
		refresh_factory: Arc<dyn RefreshRequestFactory<T::Target>>,
	) -> Self {
		Self {
			transport,
			store,
			refresh_factory,
			notifier: Arc::new(NoopNotifier),
			lifecycle: None,
			default_validation: ChallengeValidation::default(),
		}
	}

	/// Publishes lifecycle events to `notifier` (defaults to [`NoopNotifier`]).
	pub fn notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
		self.notifier = notifier;

		self
	}

	/// Invokes `hook` around every transport call.
	pub fn lifecycle(mut self, hook: Arc<dyn LifecycleHook>) -> Self {
		self.lifecycle = Some(hook);

		self
	}

	/// Challenge classification for descriptors that carry none (defaults to HTTP 401).
	pub fn default_validation(mut self, validation: ChallengeValidation) -> Self {
		self.default_validation = validation;

		self
	}

	/// Creates the coordinator in the `Authorized` phase.
	pub fn build(self) -> Coordinator<T> {
		let inner = Inner {
			transport: self.transport,
			store: self.store,
			refresh_factory: self.refresh_factory,
			notifier: self.notifier,
			lifecycle: self.lifecycle,
			default_validation: self.default_validation,
			metrics: Arc::new(CoordinatorMetrics::default()),
			state: Mutex::new(State {
				phase: Phase::Authorized,
				refresh_in_flight: false,
				reset_during_refresh: false,
				queue: PendingQueue::new(),
			}),
			next_id: AtomicU64::new(1),
		};

		Coordinator { inner: Arc::new(inner) }
	}
}
impl<T> Debug for CoordinatorBuilder<T>
where
	T: Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CoordinatorBuilder")
			.field("lifecycle_set", &self.lifecycle.is_some())
			.field("default_validation", &self.default_validation)
			.finish()
	}
}
