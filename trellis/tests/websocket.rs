//! The WebSocket upgrade stub: fixed 426 response carrying the resolved
//! hook set as response metadata.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use http::{Method, StatusCode};
use trellis::testing::response_text;
use trellis::ws::{ResolvedWebSocket, WebSocketHooks, WsInit, WsMessage, WsPeer, websocket_handler};
use trellis::{App, Event};

struct EchoHooks {
    messages: Arc<AtomicUsize>,
}

#[async_trait]
impl WebSocketHooks for EchoHooks {
    async fn on_message(&self, _peer: &WsPeer, _message: WsMessage) {
        self.messages.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn upgrade_stub_answers_426_with_hook_metadata() {
    let messages = Arc::new(AtomicUsize::new(0));
    let mut app = App::new();
    app.get(
        "/ws",
        websocket_handler(WsInit::hooks(EchoHooks {
            messages: messages.clone(),
        })),
    )
    .expect("route");

    let response = app
        .handle(Event::new(Method::GET, "/ws"))
        .await
        .expect("response");

    assert_eq!(response.status, StatusCode::UPGRADE_REQUIRED);

    // An upgrade-capable transport picks the hook set out of the response.
    let resolved = response
        .extensions
        .get::<ResolvedWebSocket>()
        .expect("hook metadata")
        .clone();
    resolved
        .0
        .on_message(&WsPeer::new(9), WsMessage::Text(String::from("hi")))
        .await;
    assert_eq!(messages.load(Ordering::SeqCst), 1);

    assert_eq!(
        response_text(response).await,
        "WebSocket upgrade is required."
    );
}

#[tokio::test]
async fn hook_set_can_be_derived_from_the_event() {
    struct Silent;
    #[async_trait]
    impl WebSocketHooks for Silent {}

    let mut app = App::new();
    app.get(
        "/ws/{room}",
        websocket_handler(WsInit::factory(|event: Event| async move {
            // The factory sees the event: per-room hook sets are possible.
            event.param("room").ok_or("missing room")?;
            Ok(Arc::new(Silent) as Arc<dyn WebSocketHooks>)
        })),
    )
    .expect("route");

    let response = app
        .handle(Event::new(Method::GET, "/ws/lobby"))
        .await
        .expect("response");
    assert_eq!(response.status, StatusCode::UPGRADE_REQUIRED);
    assert!(response.extensions.get::<ResolvedWebSocket>().is_some());
}
