#![allow(dead_code)]

use std::sync::Arc;

use reqwest::header::HeaderMap;
use schoolhub::db::SchoolDbManager;
use schoolhub::server::create_router;
use schoolhub::server::middleware::auth::AccessPolicy;
use schoolhub::types::AppState;
use serde_json::Value;

pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
}

pub async fn spawn_app() -> TestApp {
    let db = SchoolDbManager::in_memory().expect("in-memory db");
    serve(AppState::new(db)).await
}

pub async fn spawn_app_with_policy(policy: Arc<dyn AccessPolicy>) -> TestApp {
    let db = SchoolDbManager::in_memory().expect("in-memory db");
    serve(AppState::with_policy(db, policy)).await
}

async fn serve(state: AppState) -> TestApp {
    let app = create_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    TestApp {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    async fn finish(resp: reqwest::Response) -> (u16, HeaderMap, Value) {
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.json::<Value>().await.expect("json body");
        (status, headers, body)
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .expect("send request");
        let (status, _, body) = Self::finish(resp).await;
        (status, body)
    }

    pub async fn get_with_headers(&self, path: &str) -> (u16, HeaderMap, Value) {
        let resp = self
            .client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .expect("send request");
        Self::finish(resp).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .expect("send request");
        let (status, _, body) = Self::finish(resp).await;
        (status, body)
    }

    pub async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .expect("send request");
        let (status, _, body) = Self::finish(resp).await;
        (status, body)
    }

    pub async fn delete(&self, path: &str) -> (u16, Value) {
        let resp = self
            .client
            .delete(format!("{}{}", self.base, path))
            .send()
            .await
            .expect("send request");
        let (status, _, body) = Self::finish(resp).await;
        (status, body)
    }

    /// POSTs `body`, asserts a 201, and returns the new record's id.
    pub async fn create(&self, path: &str, body: Value) -> String {
        let (status, json) = self.post(path, body).await;
        assert_eq!(status, 201, "creating via {path}: {json}");
        id_of(&json)
    }
}

pub fn id_of(json: &Value) -> String {
    json["data"]["id"].as_str().expect("data.id").to_string()
}

pub fn message(json: &Value) -> &str {
    json["message"].as_str().unwrap_or_default()
}
