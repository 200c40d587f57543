//! Request builders, response parsers and the operations combining them.
//!
//! # Design
//! Each DataCite operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`,
//! both free of I/O. The operation method itself (`resolve_doi`,
//! `draft_doi`, ...) runs build, hands the request to the configured
//! [`Transport`], and runs parse. Validation that can be done locally
//! happens in `build_*`, so a rejected argument never reaches the transport.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::doi;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{DoiDocument, DoiResource, DraftDoiRequest, LegacyMintRequest, MediaMap};

const JSON_API: &str = "application/vnd.api+json";
const TEXT_PLAIN: &str = "text/plain;charset=UTF-8";
const XML_UTF8: &str = "application/xml;charset=UTF-8";
const XML: &str = "application/xml";

/// Client for the DataCite DOI and metadata store endpoints.
///
/// Holds only immutable configuration and a transport, so a client can be
/// shared across threads whenever its transport can.
pub struct DataCiteClient<T = UreqTransport> {
    config: ClientConfig,
    authorization: String,
    transport: T,
}

impl DataCiteClient<UreqTransport> {
    /// Client sending requests over a blocking `ureq` agent.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(&config);
        Self::with_transport(config, transport)
    }
}

impl<T> DataCiteClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let credentials = format!("{}:{}", config.username(), config.password());
        Self {
            authorization: format!("Basic {}", BASE64.encode(credentials)),
            config,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_resolve_doi(&self, doi: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &doi::path("dois", doi), Vec::new(), None)
    }

    /// Without a suffix, or with a blank one, DataCite generates one under
    /// the configured prefix.
    pub fn build_draft_doi(&self, suffix: Option<&str>) -> Result<HttpRequest, ApiError> {
        let payload = match suffix.filter(|s| !s.trim().is_empty()) {
            Some(suffix) => DraftDoiRequest::with_doi(doi::qualify(self.config.prefix(), suffix)?),
            None => DraftDoiRequest::with_prefix(self.config.prefix()),
        };
        let body =
            serde_json::to_string(&payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(HttpMethod::Post, "dois", vec![content_type(JSON_API)], Some(body)))
    }

    pub fn build_mint_doi(&self, doi: &str, url: &str) -> Result<HttpRequest, ApiError> {
        let body = LegacyMintRequest {
            doi: doi.to_string(),
            url: url.to_string(),
        }
        .to_wire()?;
        Ok(self.request(HttpMethod::Post, "doi", vec![content_type(TEXT_PLAIN)], Some(body)))
    }

    pub fn build_get_metadata(&self, doi: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &doi::path("metadata", doi),
            vec![("accept".to_string(), XML.to_string())],
            None,
        )
    }

    /// The document is sent as-is; DataCite validates it against its schema.
    pub fn build_post_metadata(&self, metadata: &str) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            "metadata",
            vec![content_type(XML_UTF8)],
            Some(metadata.to_string()),
        )
    }

    pub fn build_delete_metadata(&self, doi: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &doi::path("metadata", doi), Vec::new(), None)
    }

    pub fn build_get_media(&self, doi: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &doi::path("media", doi), Vec::new(), None)
    }

    pub fn build_post_media(&self, doi: &str, media: &MediaMap) -> Result<HttpRequest, ApiError> {
        let body = media.to_wire()?;
        Ok(self.request(
            HttpMethod::Post,
            &doi::path("media", doi),
            vec![content_type(TEXT_PLAIN)],
            Some(body),
        ))
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        mut headers: Vec<(String, String)>,
        body: Option<String>,
    ) -> HttpRequest {
        headers.push(("authorization".to_string(), self.authorization.clone()));
        HttpRequest {
            method,
            url: format!("{}{path}", self.config.base_url()),
            headers,
            body,
        }
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_resolve_doi(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response, 200)?;
        let document: DoiDocument = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        document.data.attributes.url.ok_or_else(|| {
            ApiError::Deserialization("DOI record has no registered url".to_string())
        })
    }

    pub fn parse_draft_doi(&self, response: HttpResponse) -> Result<DoiResource, ApiError> {
        check_status(&response, 201)?;
        let document: DoiDocument = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        Ok(document.data)
    }

    /// Returns the body unchanged. DataCite answers 201 both for a new DOI
    /// (`CREATED`) and for an existing one (`HANDLE_ALREADY_EXISTS`).
    pub fn parse_mint_doi(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response, 201)?;
        Ok(response.body)
    }

    pub fn parse_get_metadata(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response, 200)?;
        Ok(response.body)
    }

    pub fn parse_post_metadata(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response, 201)?;
        Ok(response.body)
    }

    pub fn parse_delete_metadata(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response, 200)?;
        Ok(response.body)
    }

    pub fn parse_get_media(&self, response: HttpResponse) -> Result<MediaMap, ApiError> {
        check_status(&response, 200)?;
        MediaMap::from_wire(&response.body)
    }

    pub fn parse_post_media(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response, 200)?;
        Ok(response.body)
    }
}

impl<T: Transport> DataCiteClient<T> {
    /// URL the DOI currently resolves to.
    pub fn resolve_doi(&self, doi: &str) -> Result<String, ApiError> {
        let response = self.send(self.build_resolve_doi(doi))?;
        self.parse_resolve_doi(response)
    }

    /// Reserve a draft DOI. `suffix` may be bare or carry the configured
    /// prefix. Not idempotent without a suffix: each call reserves a new DOI.
    pub fn draft_doi(&self, suffix: Option<&str>) -> Result<DoiResource, ApiError> {
        let response = self.send(self.build_draft_doi(suffix)?)?;
        self.parse_draft_doi(response)
    }

    /// Mint `doi` pointing at `url` through the legacy endpoint.
    pub fn mint_doi(&self, doi: &str, url: &str) -> Result<String, ApiError> {
        let response = self.send(self.build_mint_doi(doi, url)?)?;
        self.parse_mint_doi(response)
    }

    /// Raw XML metadata of `doi`.
    pub fn get_metadata(&self, doi: &str) -> Result<String, ApiError> {
        let response = self.send(self.build_get_metadata(doi))?;
        self.parse_get_metadata(response)
    }

    /// Create or replace metadata. The DOI is read from the document itself.
    pub fn post_metadata(&self, metadata: &str) -> Result<String, ApiError> {
        let response = self.send(self.build_post_metadata(metadata))?;
        self.parse_post_metadata(response)
    }

    /// Mark the metadata of `doi` inactive. The DOI itself stays registered.
    pub fn delete_metadata(&self, doi: &str) -> Result<String, ApiError> {
        let response = self.send(self.build_delete_metadata(doi))?;
        self.parse_delete_metadata(response)
    }

    pub fn get_media(&self, doi: &str) -> Result<MediaMap, ApiError> {
        let response = self.send(self.build_get_media(doi))?;
        self.parse_get_media(response)
    }

    pub fn post_media(&self, doi: &str, media: &MediaMap) -> Result<String, ApiError> {
        let response = self.send(self.build_post_media(doi, media)?)?;
        self.parse_post_media(response)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending DataCite request");
        self.transport.execute(request)
    }
}

impl<T> fmt::Display for DataCiteClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<DataCiteClient: {}>", self.config.username())
    }
}

impl<T: fmt::Debug> fmt::Debug for DataCiteClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataCiteClient")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

fn content_type(value: &str) -> (String, String) {
    ("content-type".to_string(), value.to_string())
}

/// Map any status other than `expected` to a classified `ApiError`.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    let err = ApiError::classify(response.status, response.body.clone());
    warn!(status = response.status, expected, error = %err, "DataCite returned an error status");
    Err(err)
}
