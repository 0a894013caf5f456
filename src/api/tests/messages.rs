use super::*;
use serde_json::json;

#[tokio::test]
async fn test_message_download_image_succeeds() {
    let server = png_server().await;
    let (app, _downloader, sink) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/messages",
            json!({
                "action": "downloadImage",
                "url": format!("{}/cat", server.uri()),
                "filename": "cat"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": true }));
    assert!(sink.payload("cat.png").is_some());
}

#[tokio::test]
async fn test_message_unknown_action_reports_failure_in_body() {
    let (app, _downloader, sink) = test_app().await;

    let response = app
        .oneshot(post_json("/api/v1/messages", json!({ "action": "nope" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "failed");
    assert_eq!(json["error"], "unrecognized request");
    assert!(sink.saved().is_empty());
}

#[tokio::test]
async fn test_message_batch_succeeds() {
    let server = png_server().await;
    let (app, _downloader, sink) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/messages",
            json!({
                "action": "downloadImages",
                "images": [format!("{}/cat", server.uri()), format!("{}/dog", server.uri())],
                "postTitle": "pets"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(body_json(response).await["success"], true);
    assert!(sink.payload("pets-images.zip").is_some());
}

#[tokio::test]
async fn test_message_invalid_json_still_answers_200() {
    let (app, downloader, sink) = test_app().await;

    for (content_type, body) in [
        ("application/json", "{ not json"),
        ("text/plain", "downloadImage"),
    ] {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/messages")
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "success": false,
                "error": "unrecognized request",
                "code": "failed"
            })
        );
    }
    assert!(sink.saved().is_empty());
    assert!(downloader.registry().is_empty());
}
