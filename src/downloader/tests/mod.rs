//! Downloader behaviour tests (wiremock-backed)

use super::test_helpers::*;
use super::*;
use crate::types::Event;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod batch;

/// Mount `path` returning `body` with `content_type`
async fn mount_image(server: &MockServer, route: &str, body: &'static [u8], content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .mount(server)
        .await;
}

/// Mount `path` returning an image after `delay`
async fn mount_slow_image(server: &MockServer, route: &str, delay: std::time::Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(&b"slow"[..], "image/jpeg")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Drain every event currently buffered in `rx`
fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
