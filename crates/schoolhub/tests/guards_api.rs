use axum::routing::get;
use axum::Router;
use schoolhub::server::with_guards;
use serde_json::Value;

async fn explode() -> &'static str {
    panic!("boom")
}

async fn calm() -> &'static str {
    "fine"
}

async fn spawn_guarded() -> String {
    let router: Router = with_guards(
        Router::new()
            .route("/explode", get(explode))
            .route("/calm", get(calm)),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, router).await.expect("serve app") });
    format!("http://{addr}")
}

#[tokio::test]
async fn handler_panic_becomes_json_500() {
    let base = spawn_guarded().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/explode"))
        .send()
        .await
        .expect("send request");
    assert_eq!(resp.status().as_u16(), 500);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Internal server error");

    // the server keeps serving after a panic
    let resp = client
        .get(format!("{base}/calm"))
        .send()
        .await
        .expect("send request");
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.expect("text body"), "fine");
}
