//! In-memory imitation of the DataCite REST and MDS endpoints.
//!
//! Serves the `dois`, `doi`, `metadata` and `media` routes the client talks
//! to, behind HTTP Basic auth with [`MOCK_USERNAME`]/[`MOCK_PASSWORD`].

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MOCK_USERNAME: &str = "DATACITE.MOCK";
pub const MOCK_PASSWORD: &str = "mock-password";
pub const MOCK_PREFIX: &str = "10.5072";

/// One DOI as the mock stores it.
#[derive(Clone, Debug, Default)]
pub struct Record {
    pub url: Option<String>,
    pub state: String,
    pub metadata: Option<String>,
    pub metadata_active: bool,
    pub media: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoiDocument {
    pub data: DoiData,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoiData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: DoiAttributes,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoiAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<String, Record>>>;

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Router over an existing store, so tests can seed or inspect it.
pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/dois", post(create_draft))
        .route("/dois/{*doi}", get(get_doi))
        .route("/doi", post(mint_doi))
        .route("/metadata", post(post_metadata))
        .route("/metadata/{*doi}", get(get_metadata).delete(delete_metadata))
        .route("/media/{*doi}", get(get_media).post(post_media))
        .layer(middleware::from_fn(require_basic_auth))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// The `Authorization` value the mock accepts.
pub fn expected_authorization() -> String {
    format!("Basic {}", BASE64.encode(format!("{MOCK_USERNAME}:{MOCK_PASSWORD}")))
}

async fn require_basic_auth(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected_authorization());
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Bad credentials").into_response();
    }
    next.run(request).await
}

fn document(doi: &str, record: &Record) -> DoiDocument {
    let (prefix, suffix) = doi.split_once('/').unwrap_or((doi, ""));
    DoiDocument {
        data: DoiData {
            id: Some(doi.to_string()),
            kind: "dois".to_string(),
            attributes: DoiAttributes {
                doi: Some(doi.to_string()),
                prefix: Some(prefix.to_string()),
                suffix: Some(suffix.to_string()),
                url: record.url.clone(),
                state: Some(record.state.clone()),
            },
        },
    }
}

async fn get_doi(State(db): State<Db>, Path(doi): Path<String>) -> Result<Json<DoiDocument>, StatusCode> {
    let records = db.read().await;
    records
        .get(&doi)
        .map(|record| Json(document(&doi, record)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_draft(State(db): State<Db>, body: String) -> Response {
    let input: DoiDocument = match serde_json::from_str(&body) {
        Ok(input) => input,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    };
    let doi = match (input.data.attributes.doi, input.data.attributes.prefix) {
        (Some(doi), _) => doi,
        (None, Some(prefix)) => {
            let generated = Uuid::new_v4().simple().to_string();
            format!("{prefix}/{}", &generated[..8])
        }
        (None, None) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, "doi or prefix is required").into_response()
        }
    };

    let mut records = db.write().await;
    if records.contains_key(&doi) {
        return (StatusCode::CONFLICT, "This DOI has already been taken").into_response();
    }
    let record = Record {
        state: "draft".to_string(),
        ..Record::default()
    };
    let created = document(&doi, &record);
    records.insert(doi, record);
    (StatusCode::CREATED, Json(created)).into_response()
}

/// Parse `key=value` lines, splitting at the first `=`.
pub fn parse_pairs(body: &str) -> Option<Vec<(String, String)>> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

async fn mint_doi(State(db): State<Db>, body: String) -> (StatusCode, String) {
    let Some(pairs) = parse_pairs(&body) else {
        return (StatusCode::BAD_REQUEST, "Bad Request: malformed body".to_string());
    };
    let field = |name: &str| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());
    let (Some(doi), Some(url)) = (field("doi"), field("url")) else {
        return (StatusCode::BAD_REQUEST, "Bad Request: doi and url are required".to_string());
    };

    let mut records = db.write().await;
    let record = records.entry(doi).or_default();
    let existed = record.url.is_some();
    record.url = Some(url);
    record.state = "findable".to_string();
    if existed {
        (StatusCode::CREATED, "HANDLE_ALREADY_EXISTS".to_string())
    } else {
        (StatusCode::CREATED, "CREATED".to_string())
    }
}

/// Pull the DOI out of `<identifier identifierType="DOI">...</identifier>`.
pub fn identifier_from_xml(xml: &str) -> Option<String> {
    let marker = "identifierType=\"DOI\"";
    let after = &xml[xml.find(marker)? + marker.len()..];
    let start = after.find('>')? + 1;
    let end = after[start..].find('<')? + start;
    let doi = after[start..end].trim();
    (!doi.is_empty()).then(|| doi.to_string())
}

async fn post_metadata(State(db): State<Db>, headers: HeaderMap, body: String) -> (StatusCode, String) {
    let is_xml = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/xml"));
    if !is_xml {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type".to_string());
    }
    let Some(doi) = identifier_from_xml(&body) else {
        return (StatusCode::BAD_REQUEST, "Bad Request: DOI identifier missing".to_string());
    };

    let mut records = db.write().await;
    let record = records.entry(doi.clone()).or_insert_with(|| Record {
        state: "draft".to_string(),
        ..Record::default()
    });
    record.metadata = Some(body);
    record.metadata_active = true;
    (StatusCode::CREATED, format!("CREATED - OK ({doi})"))
}

async fn get_metadata(State(db): State<Db>, Path(doi): Path<String>) -> Response {
    let records = db.read().await;
    match records.get(&doi) {
        Some(Record {
            metadata: Some(xml),
            metadata_active: true,
            ..
        }) => ([(header::CONTENT_TYPE, "application/xml")], xml.clone()).into_response(),
        Some(Record { metadata: Some(_), .. }) => {
            (StatusCode::GONE, "DOI is inactive").into_response()
        }
        _ => (StatusCode::NOT_FOUND, "DOI not found").into_response(),
    }
}

async fn delete_metadata(State(db): State<Db>, Path(doi): Path<String>) -> (StatusCode, &'static str) {
    let mut records = db.write().await;
    match records.get_mut(&doi) {
        Some(record) if record.metadata.is_some() => {
            record.metadata_active = false;
            (StatusCode::OK, "OK")
        }
        _ => (StatusCode::NOT_FOUND, "DOI not found"),
    }
}

async fn get_media(State(db): State<Db>, Path(doi): Path<String>) -> (StatusCode, String) {
    let records = db.read().await;
    match records.get(&doi) {
        Some(record) if !record.media.is_empty() => {
            let lines: Vec<String> = record.media.iter().map(|(k, v)| format!("{k}={v}")).collect();
            (StatusCode::OK, lines.join("\r\n"))
        }
        _ => (StatusCode::NOT_FOUND, "No media for the DOI".to_string()),
    }
}

async fn post_media(State(db): State<Db>, Path(doi): Path<String>, body: String) -> (StatusCode, String) {
    let Some(pairs) = parse_pairs(&body) else {
        return (StatusCode::BAD_REQUEST, "Bad Request: malformed media".to_string());
    };
    let mut records = db.write().await;
    let Some(record) = records.get_mut(&doi) else {
        return (StatusCode::NOT_FOUND, "DOI not found".to_string());
    };
    record.media.extend(pairs);
    (StatusCode::OK, "OK".to_string())
}
