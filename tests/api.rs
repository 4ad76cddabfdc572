use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use vidtube::adapters::local::{FsMedia, Ffprobe};
use vidtube::adapters::memory::MemoryStore;
use vidtube::auth::TokenService;
use vidtube::{router, AppConfig, AppState, Services};

const BOUNDARY: &str = "vidtube-test-boundary";

struct TestApp {
    app: Router,
    _dir: TempDir,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().to_string_lossy().into_owned();
    let config = AppConfig::from_lookup(|key| match key {
        "STORE" => Some("memory".to_string()),
        "UPLOAD_DIR" => Some(upload_dir.clone()),
        "SECURE_COOKIES" => Some("false".to_string()),
        _ => None,
    })
    .unwrap();

    let media = FsMedia::new(config.media_dir(), config.public_url.clone(), Ffprobe);
    let services = Services::new(
        Arc::new(MemoryStore::new()),
        Arc::new(media),
        TokenService::new(&config.tokens),
    );
    TestApp {
        app: router(AppState::new(services, &config), &config),
        _dir: dir,
    }
}

fn multipart(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.send(request).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    async fn register(&self, username: &str, with_avatar: bool) -> (StatusCode, Value) {
        let email = format!("{}@example.com", username);
        let fields = [
            ("fullName", "Test User"),
            ("email", email.as_str()),
            ("username", username),
            ("password", "hunter22"),
        ];
        let avatar: &[u8] = b"not really a png";
        let files = if with_avatar {
            vec![("avatar", "me.png", avatar)]
        } else {
            Vec::new()
        };
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/users/register")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart(&fields, &files)))
            .unwrap();
        let response = self.send(request).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    async fn upload(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart(fields, files)))
            .unwrap();
        let response = self.send(request).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    /// Register and log in, returning the user id and access token.
    async fn sign_up(&self, username: &str) -> (String, String) {
        let (status, _) = self.register(username, true).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self
            .json(
                "POST",
                "/api/v1/users/login",
                None,
                Some(json!({ "username": username, "password": "hunter22" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["data"]["user"]["_id"].as_str().unwrap().to_string(),
            body["data"]["accessToken"].as_str().unwrap().to_string(),
        )
    }
}

async fn read_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_healthcheck() {
    let app = test_app();
    let (status, body) = app.json("GET", "/api/v1/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "OK");
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_register_validates_and_rejects_duplicates() {
    let app = test_app();
    let (status, body) = app.register("chai", false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Avatar file is required");

    let (status, body) = app.register("chai", true).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], "chai");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("refreshToken").is_none());

    let (status, body) = app.register("chai", true).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let app = test_app();
    let (status, body) = app.json("GET", "/api/v1/users/current-user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized request");

    let (status, _) = app
        .json("GET", "/api/v1/tweets", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_cookies_that_authenticate() {
    let app = test_app();
    app.register("chai", true).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/users/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "chai@example.com", "password": "hunter22" }).to_string(),
        ))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
    let access = cookies
        .iter()
        .find(|c| c.starts_with("accessToken="))
        .and_then(|c| c.split(';').next())
        .unwrap()
        .to_string();

    let request = Request::builder()
        .uri("/api/v1/users/current-user")
        .header(COOKIE, access)
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["email"], "chai@example.com");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = test_app();
    app.register("chai", true).await;
    let (status, body) = app
        .json(
            "POST",
            "/api/v1/users/login",
            None,
            Some(json!({ "username": "chai", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Password is incorrect");
}

#[tokio::test]
async fn test_avatar_is_served_from_local_media() {
    let app = test_app();
    let (status, body) = app.register("chai", true).await;
    assert_eq!(status, StatusCode::CREATED);
    let url = body["data"]["avatar"]["url"].as_str().unwrap().to_string();
    let path = &url[url.find("/media/").unwrap()..];

    let response = app
        .send(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"not really a png");
}

#[tokio::test]
async fn test_tweet_lifecycle() {
    let app = test_app();
    let (chai_id, chai) = app.sign_up("chai").await;
    let (_, fan) = app.sign_up("fan").await;

    let (status, body) = app
        .json(
            "POST",
            "/api/v1/tweets",
            Some(&chai),
            Some(json!({ "content": "first tweet" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let tweet_id = body["data"]["_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["userDetails"]["username"], "chai");

    let (status, body) = app
        .json(
            "GET",
            &format!("/api/v1/tweets/user/{}", chai_id),
            Some(&fan),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalDocs"], 1);
    assert_eq!(body["data"]["docs"][0]["content"], "first tweet");

    let (status, _) = app
        .json(
            "PATCH",
            &format!("/api/v1/tweets/{}", tweet_id),
            Some(&fan),
            Some(json!({ "content": "hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(
            "PATCH",
            &format!("/api/v1/tweets/{}", tweet_id),
            Some(&chai),
            Some(json!({ "content": "edited" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "edited");

    let (status, _) = app
        .json(
            "DELETE",
            &format!("/api/v1/tweets/{}", tweet_id),
            Some(&chai),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.json("GET", "/api/v1/tweets", Some(&chai), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No tweets found");
}

#[tokio::test]
async fn test_like_toggle_and_comments_on_tweets() {
    let app = test_app();
    let (_, chai) = app.sign_up("chai").await;
    let (_, body) = app
        .json(
            "POST",
            "/api/v1/tweets",
            Some(&chai),
            Some(json!({ "content": "like me" })),
        )
        .await;
    let tweet_id = body["data"]["_id"].as_str().unwrap().to_string();
    let like_uri = format!("/api/v1/likes/toggle/t/{}", tweet_id);

    let (status, body) = app.json("POST", &like_uri, Some(&chai), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["message"], "Tweet liked");
    let (_, body) = app.json("POST", &like_uri, Some(&chai), None).await;
    assert_eq!(body["data"]["liked"], false);

    let comments_uri = format!("/api/v1/comments/tweets/{}", tweet_id);
    let (status, _) = app
        .json(
            "POST",
            &comments_uri,
            Some(&chai),
            Some(json!({ "content": "self reply" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.json("GET", &comments_uri, Some(&chai), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["docs"][0]["content"], "self reply");
    assert_eq!(body["data"]["docs"][0]["owner"]["username"], "chai");

    let (status, body) = app
        .json("POST", "/api/v1/likes/toggle/v/not-an-id", Some(&chai), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid video id");
}

#[tokio::test]
async fn test_subscriptions_and_dashboard() {
    let app = test_app();
    let (chai_id, chai) = app.sign_up("chai").await;
    let (fan_id, fan) = app.sign_up("fan").await;

    let uri = format!("/api/v1/subscriptions/c/{}", chai_id);
    let (status, body) = app.json("POST", &uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["subscribed"], true);

    let (status, _) = app.json("POST", &uri, Some(&chai), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.json("GET", &uri, Some(&chai), None).await;
    assert_eq!(body["data"]["docs"][0]["username"], "fan");

    let (_, body) = app
        .json(
            "GET",
            &format!("/api/v1/subscriptions/u/{}", fan_id),
            Some(&fan),
            None,
        )
        .await;
    assert_eq!(body["data"]["docs"][0]["username"], "chai");

    let (_, body) = app
        .json("GET", "/api/v1/users/c/chai", Some(&fan), None)
        .await;
    assert_eq!(body["data"]["subscribersCount"], 1);
    assert_eq!(body["data"]["isSubscribed"], true);

    let (status, body) = app
        .json("GET", "/api/v1/dashboard/stats", Some(&chai), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalSubscribers"], 1);
    assert_eq!(body["data"]["totalVideos"], 0);
}

#[tokio::test]
async fn test_playlist_requires_fields() {
    let app = test_app();
    let (_, chai) = app.sign_up("chai").await;
    let (status, body) = app
        .json(
            "POST",
            "/api/v1/playlist",
            Some(&chai),
            Some(json!({ "name": "mix" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Description is required");

    let (status, body) = app
        .json(
            "POST",
            "/api/v1/playlist",
            Some(&chai),
            Some(json!({ "name": "mix", "description": "songs" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let playlist_id = body["data"]["_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .json(
            "GET",
            &format!("/api/v1/playlist/{}", playlist_id),
            Some(&chai),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "mix");
    assert_eq!(body["data"]["videos"], json!([]));
}

#[tokio::test]
async fn test_video_lifecycle_with_large_upload() {
    let app = test_app();
    let (chai_id, chai) = app.sign_up("chai").await;
    let (_, fan) = app.sign_up("fan").await;

    // Well past the 16 KiB JSON limit.
    let video: Vec<u8> = vec![0x42; 256 * 1024];
    let files: [(&str, &str, &[u8]); 2] = [
        ("videoFile", "clip.mp4", video.as_slice()),
        ("thumbnail", "thumb.png", b"thumbnail bytes".as_slice()),
    ];
    let (status, body) = app
        .upload(
            "POST",
            "/api/v1/videos",
            &chai,
            &[("title", "Rust in 100s"), ("description", "ownership")],
            &files,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["isPublished"], true);
    assert_eq!(body["data"]["views"], 0);
    let video_id = body["data"]["_id"].as_str().unwrap().to_string();
    let video_uri = format!("/api/v1/videos/{}", video_id);

    let url = body["data"]["videoFile"]["url"].as_str().unwrap().to_string();
    let response = app
        .send(
            Request::builder()
                .uri(&url[url.find("/media/").unwrap()..])
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stored = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(stored.len(), video.len());

    let (status, body) = app.json("POST", &video_uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["views"], 1);
    let (_, body) = app.json("GET", "/api/v1/users/history", Some(&fan), None).await;
    assert_eq!(body["data"][0]["_id"], video_id.as_str());

    let comments_uri = format!("/api/v1/comments/videos/{}", video_id);
    let (status, _) = app
        .json(
            "POST",
            &comments_uri,
            Some(&fan),
            Some(json!({ "content": "great video" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body) = app.json("GET", &comments_uri, Some(&chai), None).await;
    assert_eq!(body["data"]["docs"][0]["owner"]["username"], "fan");

    let (status, _) = app
        .upload("PATCH", &video_uri, &fan, &[("title", "stolen")], &[])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app
        .upload(
            "PATCH",
            &video_uri,
            &chai,
            &[],
            &[("thumbnail", "new.png", b"fresh thumbnail".as_slice())],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Rust in 100s");

    let toggle_uri = format!("/api/v1/videos/toggle/publish/{}", video_id);
    let (status, _) = app.json("PATCH", &toggle_uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.json("PATCH", &toggle_uri, Some(&chai), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isPublished"], false);
    assert_eq!(body["message"], "Video unpublished successfully");

    let (status, _) = app.json("GET", &video_uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let channel_uri = format!("/api/v1/videos?userId={}", chai_id);
    let (_, body) = app.json("GET", &channel_uri, Some(&fan), None).await;
    assert_eq!(body["data"]["totalDocs"], 0);
    assert_eq!(body["message"], "No videos found");
    let (_, body) = app.json("GET", &channel_uri, Some(&chai), None).await;
    assert_eq!(body["data"]["totalDocs"], 1);
}

#[tokio::test]
async fn test_out_of_range_page_is_empty() {
    let app = test_app();
    let (_, chai) = app.sign_up("chai").await;
    let (status, body) = app
        .json(
            "GET",
            "/api/v1/videos?page=18446744073709551615&limit=100",
            Some(&chai),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No videos found");
    assert_eq!(body["data"]["docs"], json!([]));

    let (status, _) = app
        .json(
            "GET",
            "/api/v1/tweets?page=18446744073709551615",
            Some(&chai),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
