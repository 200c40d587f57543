//! Request and response payloads for the DataCite endpoints.
//!
//! # Design
//! The REST `dois` endpoints speak JSON:API, modelled here with serde. The
//! legacy MDS endpoints speak `key=value` lines joined with CRLF; those
//! payloads get explicit `to_wire`/`from_wire` functions instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// JSON:API resource type for DOIs.
pub const DOI_RESOURCE_TYPE: &str = "dois";

const CRLF: &str = "\r\n";

/// Body of `POST dois`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftDoiRequest {
    pub data: DraftDoiData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftDoiData {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: DraftDoiAttributes,
}

/// Exactly one of the two fields is set: `doi` for an explicit identifier,
/// `prefix` to let DataCite generate the suffix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftDoiAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl DraftDoiRequest {
    pub fn with_doi(doi: impl Into<String>) -> Self {
        Self::from_attributes(DraftDoiAttributes {
            doi: Some(doi.into()),
            prefix: None,
        })
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::from_attributes(DraftDoiAttributes {
            doi: None,
            prefix: Some(prefix.into()),
        })
    }

    fn from_attributes(attributes: DraftDoiAttributes) -> Self {
        Self {
            data: DraftDoiData {
                kind: DOI_RESOURCE_TYPE.to_string(),
                attributes,
            },
        }
    }
}

/// Top-level JSON:API document returned by the `dois` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoiDocument {
    pub data: DoiResource,
}

/// A DOI record. Fields DataCite omits deserialize to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DoiResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: DoiAttributes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DoiAttributes {
    pub doi: String,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    /// Registered landing page; `None` for drafts that have none yet.
    pub url: Option<String>,
    /// `draft`, `registered` or `findable`.
    pub state: Option<String>,
}

/// Body of the legacy `POST doi` mint call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMintRequest {
    pub doi: String,
    pub url: String,
}

impl LegacyMintRequest {
    pub fn to_wire(&self) -> Result<String, ApiError> {
        if self.doi.trim().is_empty() || self.url.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "legacy mint needs both a DOI and a URL".to_string(),
            ));
        }
        check_line_value("doi", &self.doi)?;
        check_line_value("url", &self.url)?;
        Ok(format!("doi={}{CRLF}url={}", self.doi, self.url))
    }
}

/// Media type to URL associations of a DOI.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MediaMap(BTreeMap<String, String>);

impl MediaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mime_type: impl Into<String>, url: impl Into<String>) -> Option<String> {
        self.0.insert(mime_type.into(), url.into())
    }

    pub fn get(&self, mime_type: &str) -> Option<&str> {
        self.0.get(mime_type).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode as `mimetype=url` lines joined with CRLF.
    ///
    /// A MIME type containing `=` or any value containing a line break
    /// cannot be represented and is rejected.
    pub fn to_wire(&self) -> Result<String, ApiError> {
        let mut lines = Vec::with_capacity(self.0.len());
        for (mime_type, url) in self.iter() {
            if mime_type.is_empty() || mime_type.contains('=') {
                return Err(ApiError::InvalidArgument(format!(
                    "media type {mime_type:?} cannot be empty or contain '='"
                )));
            }
            check_line_value("media type", mime_type)?;
            check_line_value("media url", url)?;
            lines.push(format!("{mime_type}={url}"));
        }
        Ok(lines.join(CRLF))
    }

    /// Decode a `GET media/{doi}` body.
    ///
    /// Each line is split at its first `=`, so URLs may contain `=`. Blank
    /// lines are skipped. A non-blank line without `=` rejects the whole
    /// body; no partial map is returned.
    pub fn from_wire(body: &str) -> Result<Self, ApiError> {
        let mut media = MediaMap::new();
        for (index, line) in body.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (mime_type, url) = line.split_once('=').ok_or_else(|| {
                ApiError::Deserialization(format!(
                    "media line {} has no '=' separator: {line:?}",
                    index + 1
                ))
            })?;
            media.insert(mime_type, url);
        }
        Ok(media)
    }
}

impl<K, V> FromIterator<(K, V)> for MediaMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for MediaMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

fn check_line_value(field: &str, value: &str) -> Result<(), ApiError> {
    if value.contains(['\r', '\n']) {
        return Err(ApiError::InvalidArgument(format!(
            "{field} must not contain line breaks"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_with_prefix_omits_doi() {
        let body = serde_json::to_value(DraftDoiRequest::with_prefix("10.5072")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"data": {"type": "dois", "attributes": {"prefix": "10.5072"}}})
        );
    }

    #[test]
    fn draft_with_doi_omits_prefix() {
        let body = serde_json::to_value(DraftDoiRequest::with_doi("10.5072/abc")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"data": {"type": "dois", "attributes": {"doi": "10.5072/abc"}}})
        );
    }

    #[test]
    fn sparse_doi_document_deserializes() {
        let doc: DoiDocument =
            serde_json::from_str(r#"{"data":{"attributes":{"url":"http://x.org"}}}"#).unwrap();
        assert_eq!(doc.data.attributes.url.as_deref(), Some("http://x.org"));
        assert!(doc.data.id.is_empty());
    }

    #[test]
    fn legacy_mint_uses_crlf() {
        let req = LegacyMintRequest {
            doi: "10.5072/abc".to_string(),
            url: "https://example.org/a?b=c".to_string(),
        };
        assert_eq!(req.to_wire().unwrap(), "doi=10.5072/abc\r\nurl=https://example.org/a?b=c");
    }

    #[test]
    fn legacy_mint_rejects_missing_fields() {
        let req = LegacyMintRequest {
            doi: "10.5072/abc".to_string(),
            url: String::new(),
        };
        assert!(matches!(req.to_wire(), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn legacy_mint_rejects_injected_lines() {
        let req = LegacyMintRequest {
            doi: "10.5072/abc".to_string(),
            url: "https://example.org\r\ndoi=10.5072/other".to_string(),
        };
        assert!(matches!(req.to_wire(), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn media_round_trips() {
        let media: MediaMap = [
            ("text/plain", "http://example.org/a"),
            ("application/pdf", "http://example.org/b"),
        ]
        .into_iter()
        .collect();
        let parsed = MediaMap::from_wire(&media.to_wire().unwrap()).unwrap();
        assert_eq!(parsed, media);
        let pairs: Vec<(&str, &str)> = parsed.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("application/pdf", "http://example.org/b"),
                ("text/plain", "http://example.org/a"),
            ]
        );
    }

    #[test]
    fn media_splits_on_first_equals() {
        let media = MediaMap::from_wire("text/html=http://example.org/?a=1&b=2\n").unwrap();
        assert_eq!(media.get("text/html"), Some("http://example.org/?a=1&b=2"));
    }

    #[test]
    fn media_skips_blank_lines() {
        let media = MediaMap::from_wire("text/plain=http://a\r\n\r\napplication/pdf=http://b\r\n").unwrap();
        assert_eq!(media.len(), 2);
    }

    #[test]
    fn media_rejects_line_without_separator() {
        let err = MediaMap::from_wire("text/plain=http://a\ngarbage\n").unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(msg) if msg.contains("line 2")));
    }

    #[test]
    fn empty_media_body_is_empty_map() {
        assert!(MediaMap::from_wire("").unwrap().is_empty());
    }

    #[test]
    fn media_type_with_equals_cannot_be_encoded() {
        let media: MediaMap = [("text=plain", "http://a")].into_iter().collect();
        assert!(matches!(media.to_wire(), Err(ApiError::InvalidArgument(_))));
    }
}
