//! End-to-end tests driving the assembled router in process.

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use bookshop_kernel::settings::Settings;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let settings = Settings::default();
    let registry = bookshop_app::build_registry(&settings);
    bookshop_http::build_router(&registry, &settings)
}

fn request(method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(AUTHORIZATION, auth);
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn xml_request(method: Method, uri: &str, auth: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, auth)
        .header(CONTENT_TYPE, "application/xml")
        .body(Body::from(body))
        .unwrap()
}

async fn create(app: &Router, title: &str, author: &str) -> i64 {
    let body = json!({ "title": title, "author": author, "price": 10.0, "currency": "EUR" });
    let response = send(app, request(Method::POST, "/v1/books", Some("42"), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["id"].as_i64().unwrap()
}

#[tokio::test]
async fn dune_lifecycle() {
    let app = app();

    let body = json!({ "title": "Dune", "author": "Herbert", "price": 12.5, "currency": "USD" });
    let response = send(&app, request(Method::POST, "/v1/books", Some("42"), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "Dune");
    assert_eq!(created["author"], "Herbert");
    assert_eq!(created["price"], 12.5);
    assert_eq!(created["currency"], "USD");

    let uri = format!("/v1/books/{id}");
    let response = send(&app, request(Method::GET, &uri, None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, created);

    let patch = json!({ "price": 9.99 });
    let response = send(&app, request(Method::PATCH, &uri, Some("42"), Some(patch))).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let fetched = json_body(send(&app, request(Method::GET, &uri, None, None)).await).await;
    assert_eq!(fetched["price"], 9.99);
    assert_eq!(fetched["title"], "Dune");
    assert_eq!(fetched["author"], "Herbert");
    assert_eq!(fetched["currency"], "USD");

    let response = send(&app, request(Method::DELETE, &uri, Some("wrong"), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, request(Method::DELETE, &uri, Some("42"), None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, request(Method::GET, &uri, None, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn list_filters_by_author_and_title() {
    let app = app();
    create(&app, "Dune", "Frank Herbert").await;
    create(&app, "Foundation", "Isaac Asimov").await;
    create(&app, "Dune Messiah", "Frank Herbert").await;

    let all = json_body(send(&app, request(Method::GET, "/v1/books", None, None)).await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let uri = "/v1/books?author=herBERT&title=";
    let herbert = json_body(send(&app, request(Method::GET, uri, None, None)).await).await;
    let titles: Vec<_> = herbert
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Dune", "Dune Messiah"]);

    let uri = "/v1/books?author=asimov&title=dune";
    let none = json_body(send(&app, request(Method::GET, uri, None, None)).await).await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn wrong_credential_beats_missing_id() {
    let app = app();
    let body = json!({ "title": "x" });

    for (method, body) in [
        (Method::DELETE, None),
        (Method::PUT, Some(body.clone())),
        (Method::PATCH, Some(body.clone())),
    ] {
        let response = send(&app, request(method.clone(), "/v1/books/404", Some("41"), body.clone())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method}");

        let response = send(&app, request(method.clone(), "/v1/books/404", None, body.clone())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method}");

        let response = send(&app, request(method.clone(), "/v1/books/404", Some("42"), body)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
    }

    let response = send(&app, request(Method::POST, "/v1/books", None, Some(body))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn put_replaces_with_empty_strings() {
    let app = app();
    let id = create(&app, "Dune", "Frank Herbert").await;
    let uri = format!("/v1/books/{id}");

    let body = json!({ "title": "", "author": "", "price": null, "currency": "" });
    let response = send(&app, request(Method::PUT, &uri, Some("42"), Some(body))).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let stored = json_body(send(&app, request(Method::GET, &uri, None, None)).await).await;
    assert_eq!(stored, json!({ "id": id, "title": "", "author": "", "currency": "" }));
}

#[tokio::test]
async fn patch_ignores_empty_text_and_keeps_zero_price() {
    let app = app();
    let id = create(&app, "Dune", "Frank Herbert").await;
    let uri = format!("/v1/books/{id}");

    let body = json!({ "title": "", "author": null, "price": 0 });
    let response = send(&app, request(Method::PATCH, &uri, Some("42"), Some(body))).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let stored = json_body(send(&app, request(Method::GET, &uri, None, None)).await).await;
    assert_eq!(stored["title"], "Dune");
    assert_eq!(stored["author"], "Frank Herbert");
    assert_eq!(stored["currency"], "EUR");
    assert_eq!(stored["price"], 0.0);
}

#[tokio::test]
async fn xml_in_and_out() {
    let app = app();

    let response = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/v1/books")
            .header(AUTHORIZATION, "42")
            .header(CONTENT_TYPE, "application/xml")
            .header(ACCEPT, "application/xml")
            .body(Body::from(
                "<book><title>Dune</title><author>Herbert</author><price>12.5</price><currency>USD</currency></book>",
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/xml");
    let xml = text_body(response).await;
    assert!(xml.starts_with("<book><id>1</id>"), "{xml}");
    assert!(xml.contains("<title>Dune</title>"), "{xml}");

    let response = send(
        &app,
        Request::builder()
            .uri("/v1/books")
            .header(ACCEPT, "text/xml")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let xml = text_body(response).await;
    assert!(xml.starts_with("<books><book>"), "{xml}");
    assert!(xml.ends_with("</book></books>"), "{xml}");

    let fetched = json_body(send(&app, request(Method::GET, "/v1/books/1", None, None)).await).await;
    assert_eq!(fetched["price"], 12.5);
}

#[tokio::test]
async fn xml_patch_keeps_empty_elements_and_takes_zero_price() {
    let app = app();
    let id = create(&app, "Dune", "Frank Herbert").await;
    let uri = format!("/v1/books/{id}");

    let body = "<book><title></title><author/><price>0</price></book>";
    let response = send(&app, xml_request(Method::PATCH, &uri, "42", body)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let stored = json_body(send(&app, request(Method::GET, &uri, None, None)).await).await;
    assert_eq!(stored["title"], "Dune");
    assert_eq!(stored["author"], "Frank Herbert");
    assert_eq!(stored["currency"], "EUR");
    assert_eq!(stored["price"], 0.0);
}

#[tokio::test]
async fn xml_put_overwrites_with_empty_elements() {
    let app = app();
    let id = create(&app, "Dune", "Frank Herbert").await;
    let uri = format!("/v1/books/{id}");

    let body = "<book><title></title><author/><currency/></book>";
    let response = send(&app, xml_request(Method::PUT, &uri, "42", body)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let stored = json_body(send(&app, request(Method::GET, &uri, None, None)).await).await;
    assert_eq!(stored, json!({ "id": id, "title": "", "author": "", "currency": "" }));
}

#[tokio::test]
async fn body_is_rejected_before_credential_is_checked() {
    let app = app();

    let response = send(
        &app,
        Request::builder()
            .method(Method::PUT)
            .uri("/v1/books/999")
            .header(AUTHORIZATION, "nope")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let response = send(
        &app,
        Request::builder()
            .method(Method::PATCH)
            .uri("/v1/books/999")
            .header(AUTHORIZATION, "nope")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A well-formed body reaches the credential check, which still precedes the lookup.
    let body = json!({ "price": 1.0 });
    let response = send(&app, request(Method::PATCH, "/v1/books/999", Some("nope"), Some(body))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_and_unsupported_bodies() {
    let app = app();

    let response = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/v1/books")
            .header(AUTHORIZATION, "42")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/v1/books")
            .header(AUTHORIZATION, "42")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("Dune"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn configured_secret_replaces_default() {
    let mut settings = Settings::default();
    settings.auth.shared_secret = "open-sesame".to_string();
    let registry = bookshop_app::build_registry(&settings);
    let app = bookshop_http::build_router(&registry, &settings);

    let body = json!({ "title": "Dune" });
    let response = send(&app, request(Method::POST, "/v1/books", Some("42"), Some(body.clone()))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, request(Method::POST, "/v1/books", Some("open-sesame"), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn openapi_lists_book_routes() {
    let app = app();
    let doc = json_body(send(&app, request(Method::GET, "/docs/openapi.json", None, None)).await).await;
    assert!(doc["paths"]["/v1/books"]["post"].is_object());
    assert!(doc["paths"]["/v1/books/{id}"]["patch"].is_object());
}
