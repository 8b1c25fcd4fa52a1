//! Lifecycle hook behavior: invocation counts, ordering, and containment
//! across nested mounts.

use http::{Method, StatusCode};
use trellis::testing::RecordingHooks;
use trellis::{App, BoxError, Event, HttpError};

fn failing_route(_event: Event) -> std::future::Ready<Result<&'static str, BoxError>> {
    std::future::ready(Err(BoxError::from("boom")))
}

#[tokio::test]
async fn request_and_response_hooks_fire_once_on_success() {
    let recorder = RecordingHooks::new();
    let mut app = App::with_hooks(recorder.hooks());
    app.middleware(|_event: Event| async { "Hello World!" });

    let response = app
        .handle(Event::new(Method::GET, "/foo"))
        .await
        .expect("response");

    assert_eq!(recorder.request_count(), 1);
    assert_eq!(recorder.request_paths(), vec!["/foo"]);
    assert_eq!(recorder.error_count(), 0);
    assert_eq!(recorder.response_count(), 1);
    // The response hook observed the same status ultimately returned.
    assert_eq!(
        recorder.responses(),
        vec![(String::from("/foo"), StatusCode::OK)]
    );
    assert_eq!(trellis::testing::response_text(response).await, "Hello World!");
}

#[tokio::test]
async fn intentional_error_reaches_the_error_hook() {
    let recorder = RecordingHooks::new();
    let mut app = App::with_hooks(recorder.hooks());
    app.middleware(|_event: Event| async {
        Err::<&str, HttpError>(HttpError::new(StatusCode::SERVICE_UNAVAILABLE))
    });

    let response = app
        .handle(Event::new(Method::GET, "/foo"))
        .await
        .expect("contained error response");

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(recorder.request_count(), 1);
    assert_eq!(recorder.error_count(), 1);
    let error = &recorder.errors()[0];
    assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!error.is_unhandled());
    // The response hook fires after the error became a response.
    assert_eq!(
        recorder.responses(),
        vec![(String::from("/foo"), StatusCode::SERVICE_UNAVAILABLE)]
    );
}

#[tokio::test]
async fn unexpected_failure_is_wrapped_as_unhandled() {
    let recorder = RecordingHooks::new();
    let mut app = App::with_hooks(recorder.hooks());
    app.middleware(failing_route);

    let response = app
        .handle(Event::new(Method::GET, "/foo"))
        .await
        .expect("contained error response");

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(recorder.error_count(), 1);
    let error = &recorder.errors()[0];
    assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error.is_unhandled());
    assert!(error.cause().is_some());
    assert_eq!(recorder.response_count(), 1);
}

#[tokio::test]
async fn error_hook_failures_in_on_request_are_treated_like_dispatch_errors() {
    let recorder = RecordingHooks::new();
    let mut app = App::new();
    app.hooks(
        recorder
            .hooks()
            .on_request(|_event: &Event| Err::<(), BoxError>("rejected early".into())),
    );
    app.middleware(|_event: Event| async { "unreachable" });

    let response = app
        .handle(Event::new(Method::GET, "/foo"))
        .await
        .expect("contained error response");

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(recorder.error_count(), 1);
    assert!(recorder.errors()[0].is_unhandled());
    assert_eq!(recorder.response_count(), 1);
}

#[tokio::test]
async fn nested_containment_and_propagation() {
    let parent_recorder = RecordingHooks::new();
    let nested_recorder =
        RecordingHooks::new().propagate_when(|_error, event| event.path().contains("/err-propagation"));

    let mut nested = App::with_hooks(nested_recorder.hooks());
    nested
        .get("/err-propagation", failing_route)
        .expect("route")
        .get("/err-non-propagation", failing_route)
        .expect("route");

    let mut app = App::with_hooks(parent_recorder.hooks());
    app.get("/err", failing_route).expect("route");
    app.mount("/nested", nested).expect("mount");

    // A failure outside the mount never reaches the nested hooks.
    app.handle(Event::new(Method::GET, "/err")).await.expect("response");
    assert_eq!(parent_recorder.error_count(), 1);
    assert_eq!(parent_recorder.errors()[0].status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(nested_recorder.error_count(), 0);

    // Contained at the nested level: the parent error hook stays silent.
    parent_recorder.clear();
    nested_recorder.clear();
    app.handle(Event::new(Method::GET, "/nested/err-non-propagation"))
        .await
        .expect("response");
    assert_eq!(parent_recorder.error_count(), 0);
    assert_eq!(nested_recorder.error_count(), 1);
    assert_eq!(nested_recorder.errors()[0].status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Propagated: both levels observe the same structured error, exactly
    // once each.
    parent_recorder.clear();
    nested_recorder.clear();
    app.handle(Event::new(Method::GET, "/nested/err-propagation"))
        .await
        .expect("response");
    assert_eq!(parent_recorder.error_count(), 1);
    assert_eq!(nested_recorder.error_count(), 1);
    assert_eq!(parent_recorder.errors()[0].status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(nested_recorder.errors()[0].status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn propagating_level_does_not_fire_its_response_hook() {
    let parent_recorder = RecordingHooks::new();
    let nested_recorder = RecordingHooks::new().propagate_when(|_error, _event| true);

    let mut nested = App::with_hooks(nested_recorder.hooks());
    nested.get("/fail", failing_route).expect("route");

    let mut app = App::with_hooks(parent_recorder.hooks());
    app.mount("/nested", nested).expect("mount");

    app.handle(Event::new(Method::GET, "/nested/fail"))
        .await
        .expect("response");

    // The nested engine never produced a response, so only the parent's
    // response hook fired — and it fired exactly once.
    assert_eq!(nested_recorder.response_count(), 0);
    assert_eq!(parent_recorder.response_count(), 1);

    // Both levels saw the request on the way in.
    assert_eq!(parent_recorder.request_count(), 1);
    assert_eq!(nested_recorder.request_count(), 1);
    assert_eq!(nested_recorder.request_paths(), vec!["/fail"]);
}
