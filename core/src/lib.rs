//! Blocking client for the DataCite DOI registration API.
//!
//! # Overview
//! Reserves and mints DOIs, stores and fetches their XML metadata, and
//! manages media type/URL associations. All state lives at DataCite; the
//! client keeps nothing between calls besides its configuration.
//!
//! # Design
//! - `ClientConfig` is immutable; test mode and the production endpoint are
//!   presets resolved when it is built.
//! - Each operation is split into `build_*` (produces `HttpRequest`) and
//!   `parse_*` (consumes `HttpResponse`); the operation method runs both
//!   around a [`Transport`]. `UreqTransport` is the default.
//! - Unexpected statuses become `ApiError::Api` tagged with an
//!   `ApiErrorKind`. Nothing is retried.

pub mod client;
pub mod config;
pub mod doi;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::DataCiteClient;
pub use config::{ClientConfig, ClientConfigBuilder, Endpoint, Timeout};
pub use error::{ApiError, ApiErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{DoiAttributes, DoiDocument, DoiResource, DraftDoiRequest, LegacyMintRequest, MediaMap};
