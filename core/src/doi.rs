//! DOI composition against the configured prefix and encoding into request paths.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::ApiError;

/// Characters that cannot appear raw inside one path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Join `resource` and `doi` into a request path, percent-encoding each
/// `/`-separated part of the DOI so `?`, `#` and `%` stay inside it.
pub fn path(resource: &str, doi: &str) -> String {
    let segments: Vec<String> = doi
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect();
    format!("{resource}/{}", segments.join("/"))
}

/// Turn a bare suffix or a fully qualified DOI into `<prefix>/<suffix>`.
///
/// A fully qualified DOI must carry `prefix`; anything else is rejected
/// with `InvalidArgument` so that no request is sent for it.
pub fn qualify(prefix: &str, doi_or_suffix: &str) -> Result<String, ApiError> {
    let doi_or_suffix = doi_or_suffix.trim();
    match doi_or_suffix.split_once('/') {
        Some((given, suffix)) => {
            if given != prefix {
                return Err(ApiError::InvalidArgument(format!(
                    "DOI {doi_or_suffix} does not use the configured prefix {prefix}"
                )));
            }
            if suffix.is_empty() {
                return Err(ApiError::InvalidArgument(format!(
                    "DOI {doi_or_suffix} has an empty suffix"
                )));
            }
            Ok(doi_or_suffix.to_string())
        }
        None if doi_or_suffix.is_empty() => {
            Err(ApiError::InvalidArgument("DOI suffix is empty".to_string()))
        }
        None => Ok(format!("{prefix}/{doi_or_suffix}")),
    }
}
