use axum::{
    body::Body,
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mock_server::{
    app, AddFriendResponse, FeedQueue, FileDescriptor, FriendTokenResponse, GenerateResponse, NetworkDetails,
    UserDetails,
};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Routers share their state through an `Arc`, so a clone sees the same users.
async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

fn json_request(method: &str, uri: &str, auth: Option<&GenerateResponse>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header("X-User-Id", auth.id.to_string()).header("X-Token", &auth.token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, auth: Option<&GenerateResponse>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("X-User-Id", auth.id.to_string()).header("X-Token", &auth.token);
    }
    builder.body(Body::empty()).unwrap()
}

async fn register(app: &Router, nickname: &str) -> GenerateResponse {
    let body = format!(r#"{{"nickname":"{nickname}","description":"","interests":[],"avatar":null}}"#);
    let resp = send(app, json_request("POST", "/auth/generate", None, &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn generate_returns_credentials() {
    let app = app();
    let auth = register(&app, "alice").await;
    assert_eq!(auth.id, 1);
    assert_eq!(auth.access_hash.len(), 256);
    assert_eq!(auth.token.len(), 256);
}

#[tokio::test]
async fn generate_rejects_long_nickname() {
    let app = app();
    let body = format!(r#"{{"nickname":"{}","description":""}}"#, "n".repeat(257));
    let resp = send(&app, json_request("POST", "/auth/generate", None, &body)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_bytes(resp).await, "nickname too long");
}

#[tokio::test]
async fn generate_malformed_json_is_rejected() {
    let app = app();
    let resp = send(&app, json_request("POST", "/auth/generate", None, r#"{"nick":1}"#)).await;
    assert!(resp.status().is_client_error());
}

// --- users ---

#[tokio::test]
async fn self_details_requires_headers() {
    let app = app();
    register(&app, "alice").await;
    let resp = send(&app, get("/users/details", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn self_details_rejects_wrong_token() {
    let app = app();
    let mut auth = register(&app, "alice").await;
    auth.token = "x".repeat(256);
    let resp = send(&app, get("/users/details", Some(&auth))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_details_checks_access_hash() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let resp = send(&app, get(&format!("/users/details/{}/{}", bob.id, bob.access_hash), Some(&alice))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let details: UserDetails = body_json(resp).await;
    assert_eq!(details.nickname, "bob");

    let resp = send(&app, get(&format!("/users/details/{}/{}", bob.id, "0".repeat(256)), Some(&alice))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- friends ---

#[tokio::test]
async fn friend_token_is_single_use() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let carol = register(&app, "carol").await;

    let resp = send(&app, json_request("POST", "/friends/generate", Some(&alice), "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token: FriendTokenResponse = body_json(resp).await;

    let body = format!(r#"{{"token":"{}","userId":{}}}"#, token.token, alice.id);
    let resp = send(&app, json_request("POST", "/friends/add", Some(&bob), &body)).await;
    let outcome: AddFriendResponse = body_json(resp).await;
    assert_eq!(outcome.kind, "Success");

    let resp = send(&app, json_request("POST", "/friends/add", Some(&carol), &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: AddFriendResponse = body_json(resp).await;
    assert_eq!(outcome.kind, "FriendTokenExpired");

    let resp = send(&app, get("/network/details", Some(&alice))).await;
    let network: NetworkDetails = body_json(resp).await;
    assert_eq!(network.friends.len(), 1);
    assert_eq!(network.friends[0].id, bob.id);
}

#[tokio::test]
async fn friend_token_bound_to_issuer() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let carol = register(&app, "carol").await;

    let resp = send(&app, json_request("POST", "/friends/generate", Some(&alice), "")).await;
    let token: FriendTokenResponse = body_json(resp).await;

    let body = format!(r#"{{"token":"{}","userId":{}}}"#, token.token, carol.id);
    let resp = send(&app, json_request("POST", "/friends/add", Some(&bob), &body)).await;
    let outcome: AddFriendResponse = body_json(resp).await;
    assert_eq!(outcome.kind, "FriendTokenExpired");
}

#[tokio::test]
async fn mutual_requests_make_friends() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let to_bob = format!(r#"{{"userId":{},"userAccessHash":"{}"}}"#, bob.id, bob.access_hash);
    let to_alice = format!(r#"{{"userId":{},"userAccessHash":"{}"}}"#, alice.id, alice.access_hash);

    let resp = send(&app, json_request("POST", "/friends/request", Some(&alice), &to_bob)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, get("/network/details", Some(&bob))).await;
    let network: NetworkDetails = body_json(resp).await;
    assert!(network.friends.is_empty());

    let resp = send(&app, json_request("POST", "/friends/request", Some(&bob), &to_alice)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, get("/network/details", Some(&bob))).await;
    let network: NetworkDetails = body_json(resp).await;
    assert_eq!(network.friends[0].id, alice.id);
}

#[tokio::test]
async fn friend_request_unknown_user_is_404() {
    let app = app();
    let alice = register(&app, "alice").await;
    let body = format!(r#"{{"userId":99,"userAccessHash":"{}"}}"#, "0".repeat(256));
    let resp = send(&app, json_request("POST", "/friends/request", Some(&alice), &body)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn decline_removes_pending_request_once() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let to_bob = format!(r#"{{"userId":{},"userAccessHash":"{}"}}"#, bob.id, bob.access_hash);
    let from_alice = format!(r#"{{"userId":{},"userAccessHash":"{}"}}"#, alice.id, alice.access_hash);
    send(&app, json_request("POST", "/friends/request", Some(&alice), &to_bob)).await;

    let resp = send(&app, json_request("POST", "/friends/decline", Some(&bob), &from_alice)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, json_request("POST", "/friends/decline", Some(&bob), &from_alice)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- feed ---

#[tokio::test]
async fn feed_marks_extended_network() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let carol = register(&app, "carol").await;

    // alice <-> bob, bob <-> carol
    for (from, to) in [(&alice, &bob), (&bob, &alice), (&bob, &carol), (&carol, &bob)] {
        let body = format!(r#"{{"userId":{},"userAccessHash":"{}"}}"#, to.id, to.access_hash);
        let resp = send(&app, json_request("POST", "/friends/request", Some(from), &body)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = send(&app, get("/feed/queue", Some(&alice))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let feed: FeedQueue = body_json(resp).await;
    assert_eq!(feed.entries.len(), 1);
    let entry = &feed.entries[0];
    assert_eq!(entry.details.id, carol.id);
    assert!(entry.is_extended_network);
    assert_eq!(entry.common_friends[0].id, bob.id);
}

// --- files ---

#[tokio::test]
async fn upload_then_download() {
    let app = app();
    let body = "--B\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
hello\r\n\
--B--\r\n";
    let request = Request::builder()
        .method("POST")
        .uri("/files/upload")
        .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=B")
        .body(Body::from(body))
        .unwrap();
    let resp = send(&app, request).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let descriptor: FileDescriptor = body_json(resp).await;

    let resp = send(&app, get(&format!("/files/download/{}/{}", descriptor.id, descriptor.access_hash), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "text/plain");
    assert_eq!(body_bytes(resp).await, "hello");

    let resp = send(&app, get(&format!("/files/download/{}/{}", descriptor.id, "0".repeat(256)), None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_file_field_is_400() {
    let app = app();
    let body = "--B\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--B--\r\n";
    let request = Request::builder()
        .method("POST")
        .uri("/files/upload")
        .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=B")
        .body(Body::from(body))
        .unwrap();
    let resp = send(&app, request).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
