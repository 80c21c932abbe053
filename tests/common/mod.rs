#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use documind::{
    app::build_app,
    auth::repo_types::User,
    config::{AppConfig, JwtConfig, PasswordConfig, StorageConfig},
    state::AppState,
    storage::StorageClient,
    store::{MemoryStore, Store},
};
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const BOUNDARY: &str = "documind-test-boundary";

/// Keeps uploaded objects in memory.
#[derive(Default)]
pub struct FakeStorage {
    pub objects: Mutex<HashMap<String, Bytes>>,
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, body: Bytes, _ct: &str) -> anyhow::Result<String> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(format!("uploads/{}", key))
    }
    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "memory".into(),
        jwt: JwtConfig {
            secret: SECRET.into(),
            algorithm: Algorithm::HS256,
            ttl_minutes: 60,
        },
        password: PasswordConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        },
        storage: StorageConfig::Local {
            upload_dir: "unused".into(),
        },
        max_upload_bytes: 1024 * 1024,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    }
}

/// The full router wired to in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub storage: Arc<FakeStorage>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        let storage = Arc::new(FakeStorage::default());
        let state = AppState::from_parts(config, Arc::new(store.clone()), storage.clone())
            .expect("state");
        Self {
            router: build_app(state.clone()),
            state,
            store,
            storage,
        }
    }

    /// Committed view of a user row.
    pub async fn find_user(&self, email: &str) -> Option<User> {
        let mut uow = self.store.begin().await.expect("begin");
        uow.find_user_by_email(email).await.expect("lookup")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str, authorization: Option<&str>) -> TestResponse {
        let mut builder = Request::get(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn register(&self, email: &str, password: &str) -> TestResponse {
        self.post_json(
            "/auth/register",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_json("/auth/login", json!({ "email": email, "password": password }))
            .await
    }

    /// Registers and logs in, returning the access token.
    pub async fn signed_in(&self, email: &str) -> String {
        let registered = self.register(email, "Secret123").await;
        assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);
        let login = self.login(email, "Secret123").await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);
        login.body["access_token"]
            .as_str()
            .expect("access_token")
            .to_string()
    }

    pub async fn upload(
        &self,
        token: Option<&str>,
        field: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> TestResponse {
        let mut builder = Request::post("/documents/upload").header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = multipart_body(field, filename, content_type, data);
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
