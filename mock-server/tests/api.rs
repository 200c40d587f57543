use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, expected_authorization, DoiDocument};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn request(method: &str, uri: &str, content_type: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, expected_authorization());
    if let Some(content_type) = content_type {
        builder = builder.header(http::header::CONTENT_TYPE, content_type);
    }
    builder.body(body.to_string()).unwrap()
}

const METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<resource xmlns="http://datacite.org/schema/kernel-4">
  <identifier identifierType="DOI">10.5072/meta</identifier>
</resource>"#;

// --- auth ---

#[tokio::test]
async fn missing_credentials_return_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/dois/10.5072/abc").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_credentials_return_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/dois/10.5072/abc")
                .header(http::header::AUTHORIZATION, "Basic d3Jvbmc6d3Jvbmc=")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- dois ---

#[tokio::test]
async fn unknown_doi_returns_404() {
    let resp = app()
        .oneshot(request("GET", "/dois/10.5072/missing", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn draft_with_prefix_generates_suffix() {
    let resp = app()
        .oneshot(request(
            "POST",
            "/dois",
            Some("application/vnd.api+json"),
            r#"{"data":{"type":"dois","attributes":{"prefix":"10.5072"}}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let doc: DoiDocument = body_json(resp).await;
    let doi = doc.data.attributes.doi.unwrap();
    assert!(doi.starts_with("10.5072/"));
    assert_eq!(doi.len(), "10.5072/".len() + 8);
    assert_eq!(doc.data.attributes.state.as_deref(), Some("draft"));
}

#[tokio::test]
async fn malformed_draft_returns_422() {
    let resp = app()
        .oneshot(request("POST", "/dois", Some("application/vnd.api+json"), "{}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- metadata ---

#[tokio::test]
async fn metadata_without_identifier_returns_400() {
    let resp = app()
        .oneshot(request("POST", "/metadata", Some("application/xml;charset=UTF-8"), "<resource/>"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metadata_requires_xml_content_type() {
    let resp = app()
        .oneshot(request("POST", "/metadata", Some("text/plain"), METADATA))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn unknown_metadata_returns_404() {
    let resp = app()
        .oneshot(request("GET", "/metadata/10.5072/missing", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- media ---

#[tokio::test]
async fn media_for_unknown_doi_returns_404() {
    let resp = app()
        .oneshot(request("POST", "/media/10.5072/missing", Some("text/plain"), "text/plain=http://a"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn registration_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    async fn call(
        app: &mut axum::routing::RouterIntoService<String>,
        req: Request<String>,
    ) -> axum::response::Response {
        ServiceExt::ready(app).await.unwrap().call(req).await.unwrap()
    }

    // metadata first, as DataCite requires before minting
    let resp = call(&mut app, request("POST", "/metadata", Some("application/xml;charset=UTF-8"), METADATA)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_text(resp).await, "CREATED - OK (10.5072/meta)");

    // mint
    let resp = call(
        &mut app,
        request("POST", "/doi", Some("text/plain;charset=UTF-8"), "doi=10.5072/meta\r\nurl=https://example.org/meta"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_text(resp).await, "CREATED");

    // mint again reports the existing handle with a success status
    let resp = call(
        &mut app,
        request("POST", "/doi", Some("text/plain;charset=UTF-8"), "doi=10.5072/meta\r\nurl=https://example.org/moved"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_text(resp).await, "HANDLE_ALREADY_EXISTS");

    // resolve
    let resp = call(&mut app, request("GET", "/dois/10.5072/meta", None, "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: DoiDocument = body_json(resp).await;
    assert_eq!(doc.data.attributes.url.as_deref(), Some("https://example.org/moved"));

    // media
    let resp = call(
        &mut app,
        request("POST", "/media/10.5072/meta", Some("text/plain"), "application/pdf=https://example.org/meta.pdf"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = call(&mut app, request("GET", "/media/10.5072/meta", None, "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "application/pdf=https://example.org/meta.pdf");

    // deactivate, then metadata is gone
    let resp = call(&mut app, request("DELETE", "/metadata/10.5072/meta", None, "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = call(&mut app, request("GET", "/metadata/10.5072/meta", None, "")).await;
    assert_eq!(resp.status(), StatusCode::GONE);

    // drafting an existing DOI conflicts
    let resp = call(
        &mut app,
        request(
            "POST",
            "/dois",
            Some("application/vnd.api+json"),
            r#"{"data":{"type":"dois","attributes":{"doi":"10.5072/meta"}}}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
