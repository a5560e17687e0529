//! OAuth 2.0 bearer coordinator for HTTP clients.
//!
//! Protected requests wait in a queue while a refresh is outstanding. Credentials rotate through a
//! single-flight refresh, and every request receives exactly one terminal outcome whatever
//! transport sits underneath.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod http;
pub mod obs;
pub mod request;
pub mod store;

pub use coordinator::{Coordinator, CoordinatorBuilder, RequestHandle, ResponseFuture};

mod _prelude {
	pub use std::{
		collections::VecDeque,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
