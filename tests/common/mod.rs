//! In-process fake blog-manager backend for integration tests
//!
//! Every request is recorded, then answered by a small router that mimics the
//! real backend's status codes and payload shapes.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures_util::{future, stream, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

use blogctl::types::LoginResponse;
use blogctl::{BlogManagerClient, SessionStore};

pub const TOKEN: &str = "tok-123";
pub const PASSWORD: &str = "secret";

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body: Vec<u8>,
}

impl Hit {
    /// Query pairs in wire order, repeated keys kept
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.query.as_deref().unwrap_or("").as_bytes())
            .into_owned()
            .collect()
    }

    pub fn query_values(&self, key: &str) -> Vec<String> {
        self.query_pairs()
            .into_iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Mutable backend state
#[derive(Debug)]
pub struct Backend {
    pub hits: Vec<Hit>,
    pub blogs: Vec<Value>,
    pub contents: HashMap<String, String>,
    pub system: Value,
    pub llm_type: String,
    /// Raw body served on the stream endpoints
    pub sse: String,
    /// Keep the stream connection open after `sse` is sent
    pub sse_hold_open: bool,
    pub images: HashMap<String, Vec<u8>>,
}

impl Default for Backend {
    fn default() -> Self {
        let mut contents = HashMap::new();
        contents.insert(
            "hello.md".to_string(),
            "# Hello\n![cat](image/2024/cat.png)".to_string(),
        );

        let mut images = HashMap::new();
        images.insert("2024/cat.png".to_string(), vec![0x89, b'P', b'N', b'G']);

        Self {
            hits: Vec::new(),
            blogs: vec![
                json!({
                    "id": 1,
                    "title": "Hello",
                    "filename": "hello.md",
                    "categories": "notes",
                    "tags": ["rust", "cli"],
                    "saying": "first post",
                    "dateTime": "2024-05-01 10:20:30"
                }),
                json!({
                    "id": 2,
                    "title": "Second thoughts",
                    "filename": "second thoughts.md",
                    "categories": "essays",
                    "tags": null,
                    "saying": null,
                    "dateTime": "2023-12-09T08:00:00"
                }),
            ],
            contents,
            system: json!({
                "blogStoragePath": "/srv/blog",
                "imageStoragePath": "/srv/images",
                "xmodelAPIKey": "xk-1",
                "bigmodelAPIKey": ""
            }),
            llm_type: "null".to_string(),
            sse: String::new(),
            sse_hold_open: false,
            images,
        }
    }
}

pub type Shared = Arc<Mutex<Backend>>;

/// Running fake server plus a client pointed at it
pub struct Harness {
    pub base_url: String,
    pub state: Shared,
    pub dir: TempDir,
    pub client: BlogManagerClient,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(Backend::default()).await
    }

    pub async fn start_with(backend: Backend) -> Self {
        let state: Shared = Arc::new(Mutex::new(backend));
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let dir = TempDir::new().unwrap();
        let client = BlogManagerClient::new(
            &base_url,
            Duration::from_secs(5),
            SessionStore::new(dir.path()),
        )
        .unwrap();

        Self {
            base_url,
            state,
            dir,
            client,
        }
    }

    pub fn session(&self) -> SessionStore {
        SessionStore::new(self.dir.path())
    }

    /// Store a session as if `login` had succeeded
    pub fn log_in_as(&self, token: &str) {
        self.session()
            .save_auth_data(&LoginResponse {
                access_token: token.to_string(),
                token_type: "Bearer".to_string(),
                id: 1,
                username: "ulna".to_string(),
                email: "ulna@example.com".to_string(),
            })
            .unwrap();
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.state.lock().unwrap().hits.clone()
    }

    pub fn last_hit(&self) -> Hit {
        self.hits().pop().expect("no request reached the backend")
    }

    pub fn set_sse(&self, body: &str) {
        self.state.lock().unwrap().sse = body.to_string();
    }

    /// Serve `body`, then leave the connection open without ever ending it
    pub fn set_sse_held_open(&self, body: &str) {
        let mut backend = self.state.lock().unwrap();
        backend.sse = body.to_string();
        backend.sse_hold_open = true;
    }
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let hit = Hit {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        accept: header_value(header::ACCEPT),
        body: body.to_vec(),
    };

    let mut backend = state.lock().unwrap();
    backend.hits.push(hit.clone());
    route(&mut backend, &hit)
}

fn authorized(hit: &Hit) -> bool {
    hit.authorization.as_deref() == Some(format!("Bearer {}", TOKEN).as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({"message": "Unauthorized"})),
    )
        .into_response()
}

fn envelope(data: Value) -> Response {
    axum::Json(json!({"status": 0, "data": data, "error": null})).into_response()
}

fn envelope_error(message: &str) -> Response {
    axum::Json(json!({"status": 1, "data": null, "error": message})).into_response()
}

fn route(backend: &mut Backend, hit: &Hit) -> Response {
    // A stale token is rejected everywhere
    if hit.authorization.as_deref() == Some("Bearer expired") {
        return unauthorized();
    }

    let path = hit.path.as_str();
    let segments: Vec<String> = path
        .trim_start_matches('/')
        .split('/')
        .map(|s| {
            url::form_urlencoded::parse(format!("x={}", s).as_bytes())
                .next()
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default()
        })
        .collect();
    let segs: Vec<&str> = segments.iter().map(String::as_str).collect();

    match (hit.method.as_str(), segs.as_slice()) {
        ("POST", ["api", "auth", "login"]) => {
            let body: Value = serde_json::from_slice(&hit.body).unwrap_or(Value::Null);
            if body["password"] == PASSWORD {
                axum::Json(json!({
                    "accessToken": TOKEN,
                    "tokenType": "Bearer",
                    "id": 1,
                    "username": body["username"],
                    "email": "ulna@example.com"
                }))
                .into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({"message": "Login failed: wrong username or password"})),
                )
                    .into_response()
            }
        }
        ("POST", ["api", "auth", "register"]) => {
            let body: Value = serde_json::from_slice(&hit.body).unwrap_or(Value::Null);
            if body["username"] == "taken" {
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({"message": "Error: username already taken!"})),
                )
                    .into_response()
            } else {
                axum::Json(json!({"message": "User registered successfully!"})).into_response()
            }
        }
        ("GET", ["api", "blogs", "lists"]) => envelope(Value::Array(backend.blogs.clone())),
        ("GET", ["api", "blogs", "add"]) => {
            let id = backend.blogs.len() as i64 + 1;
            let title = hit.query_values("title").pop().unwrap_or_default();
            let filename = format!("{}.md", title.to_lowercase().replace(' ', "-"));
            backend.blogs.push(json!({
                "id": id,
                "title": title,
                "filename": filename,
                "categories": hit.query_values("categories").pop().unwrap_or_default(),
                "tags": hit.query_values("tags"),
                "saying": hit.query_values("saying").pop().unwrap_or_default(),
                "dateTime": "2024-06-01 09:00:00"
            }));
            envelope(json!({ "filename": filename }))
        }
        ("GET", ["api", "blogs", _y, _m, _d, file, ""]) => {
            let Some(blog) = find(backend, file) else {
                return envelope_error("file not found");
            };
            let mut detail = blog.clone();
            detail["filepath"] = json!(format!("/srv/blog/{}", file));
            detail["content"] = json!(backend.contents.get(*file).cloned().unwrap_or_default());
            envelope(detail)
        }
        ("POST", ["api", "blogs", _y, _m, _d, file, "updatecontent"]) => {
            if find(backend, file).is_none() {
                return envelope_error("file not found");
            }
            backend
                .contents
                .insert(file.to_string(), hit.body_text());
            envelope(Value::Null)
        }
        ("GET", ["api", "blogs", _y, _m, _d, file, "updateinfo"]) => {
            let Some(idx) = position(backend, file) else {
                return envelope_error("file not found");
            };
            let blog = &mut backend.blogs[idx];
            blog["title"] = json!(hit.query_values("title").pop().unwrap_or_default());
            blog["categories"] = json!(hit.query_values("categories").pop().unwrap_or_default());
            blog["tags"] = json!(hit.query_values("tags"));
            blog["saying"] = json!(hit.query_values("saying").pop().unwrap_or_default());
            envelope(Value::Null)
        }
        ("GET", ["api", "blogs", _y, _m, _d, file, "delete", ""]) => match position(backend, file) {
            Some(idx) => {
                backend.blogs.remove(idx);
                envelope(Value::Null)
            }
            None => envelope_error("file not found"),
        },
        ("GET", ["config", "get"]) => axum::Json(backend.system.clone()).into_response(),
        ("POST", ["config", "set"]) => {
            if !authorized(hit) {
                return unauthorized();
            }
            match serde_json::from_slice::<Value>(&hit.body) {
                Ok(value) => {
                    backend.system = value;
                    axum::Json(json!(true)).into_response()
                }
                Err(_) => axum::Json(json!(false)).into_response(),
            }
        }
        ("POST", ["image", "upload"]) => {
            let text = hit.body_text();
            if text.contains("reject-me") {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({"success": false, "message": "disk full"})),
                )
                    .into_response();
            }
            axum::Json(json!({
                "success": true,
                "message": "uploaded",
                "path": "2024/cat.png",
                "imageId": 5,
                "fileName": "cat.png"
            }))
            .into_response()
        }
        ("GET", ["image", rest @ ..]) => match backend.images.get(&rest.join("/")) {
            Some(bytes) => (
                [(header::CONTENT_TYPE, "image/png")],
                bytes.clone(),
            )
                .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        (_, ["llm", "stream-chat"]) | (_, ["llm", "stream-suggestion"]) => {
            let token = hit.query_values("token").pop();
            if token.as_deref() != Some(TOKEN) {
                return unauthorized();
            }
            if backend.sse_hold_open {
                let first = stream::once(future::ready(Ok::<_, std::io::Error>(
                    Bytes::from(backend.sse.clone()),
                )));
                return (
                    [(header::CONTENT_TYPE, "text/event-stream")],
                    Body::from_stream(first.chain(stream::pending())),
                )
                    .into_response();
            }
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                backend.sse.clone(),
            )
                .into_response()
        }
        (method, ["llm", endpoint]) => {
            if !authorized(hit) {
                return unauthorized();
            }
            let param = hit.query_values("param").pop().unwrap_or_default();
            match (method, *endpoint) {
                ("GET", "get") => backend.llm_type.clone().into_response(),
                ("POST", "set") => {
                    backend.llm_type = hit.query_values("llmType").pop().unwrap_or_default();
                    "ok".into_response()
                }
                ("GET", "chat") => format!("echo: {}", param).into_response(),
                ("GET", "getsuggestion") if param.is_empty() => {
                    (StatusCode::BAD_REQUEST, "param is required").into_response()
                }
                ("GET", "getsuggestion") => format!("suggest: {}", param).into_response(),
                _ => StatusCode::NOT_FOUND.into_response(),
            }
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn find<'a>(backend: &'a Backend, file: &str) -> Option<&'a Value> {
    backend.blogs.iter().find(|b| b["filename"] == file)
}

fn position(backend: &Backend, file: &str) -> Option<usize> {
    backend.blogs.iter().position(|b| b["filename"] == file)
}
