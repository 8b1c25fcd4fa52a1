//! The fetch-style adapter: standard request in, standard response out.

use bytes::Bytes;
use http::{Method, StatusCode};
use trellis::adapters::fetch;
use trellis::ws::{ResolvedWebSocket, WebSocketHooks, WsInit, websocket_handler};
use trellis::{App, Body, Context, Event};

fn request(method: Method, uri: &str, body: Body) -> http::Request<Body> {
    let mut req = http::Request::new(body);
    *req.method_mut() = method;
    *req.uri_mut() = uri.parse().expect("uri");
    req
}

#[tokio::test]
async fn full_engine_round_trip() {
    let mut app = App::new();
    app.get("/greet/{name}", |event: Event| async move {
        format!("hello, {}", event.param("name").unwrap_or_default())
    })
    .expect("route");

    let response = fetch::respond(&app, request(Method::GET, "/greet/ada", Body::Empty)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.expect("body");
    assert_eq!(&body[..], b"hello, ada");
}

#[tokio::test]
async fn request_body_reaches_the_handler() {
    let mut app = App::new();
    app.post("/echo", |event: Event| async move {
        let bytes = event.take_body().collect().await?;
        Ok::<_, trellis::BoxError>(Vec::from(&bytes[..]))
    })
    .expect("route");

    let response = fetch::respond(
        &app,
        request(Method::POST, "/echo", Body::Full(Bytes::from_static(b"payload"))),
    )
    .await;
    let body = response.into_body().collect().await.expect("body");
    assert_eq!(&body[..], b"payload");
}

#[tokio::test]
async fn context_seed_is_merged_at_construction() {
    let mut app = App::new();
    app.get("/who", |event: Event| async move {
        event
            .context_get::<String>("request-id")
            .unwrap_or_else(|| String::from("unknown"))
    })
    .expect("route");

    let mut seed = Context::new();
    seed.insert("request-id", String::from("req-17"));
    let response =
        fetch::respond_with(&app, request(Method::GET, "/who", Body::Empty), seed).await;
    let body = response.into_body().collect().await.expect("body");
    assert_eq!(&body[..], b"req-17");
}

#[tokio::test]
async fn engine_miss_surfaces_as_404() {
    let app = App::new();
    let response = fetch::respond(&app, request(Method::GET, "/missing", Body::Empty)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn streaming_response_bodies_pass_through() {
    let mut app = App::new();
    app.get("/stream", |_event: Event| async {
        Body::from_chunks(vec![
            Bytes::from_static(b"alpha "),
            Bytes::from_static(b"beta"),
        ])
    })
    .expect("route");

    let response = fetch::respond(&app, request(Method::GET, "/stream", Body::Empty)).await;
    assert!(matches!(response.body(), Body::Stream(_)));
    let body = response.into_body().collect().await.expect("body");
    assert_eq!(&body[..], b"alpha beta");
}

#[tokio::test]
async fn response_extensions_survive_the_adapter() {
    struct Silent;
    #[async_trait::async_trait]
    impl WebSocketHooks for Silent {}

    let mut app = App::new();
    app.get("/ws", websocket_handler(WsInit::hooks(Silent)))
        .expect("route");

    let response = fetch::respond(&app, request(Method::GET, "/ws", Body::Empty)).await;
    assert_eq!(response.status(), StatusCode::UPGRADE_REQUIRED);
    assert!(response.extensions().get::<ResolvedWebSocket>().is_some());
}
