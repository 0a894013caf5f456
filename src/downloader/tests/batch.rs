use super::*;
use std::io::Read;
use std::time::Duration;

fn read_zip(bytes: &[u8]) -> zip::ZipArchive<std::io::Cursor<Vec<u8>>> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap()
}

fn entry_text(zip: &mut zip::ZipArchive<std::io::Cursor<Vec<u8>>>, name: &str) -> String {
    let mut text = String::new();
    zip.by_name(name).unwrap().read_to_string(&mut text).unwrap();
    text
}

#[tokio::test]
async fn test_failed_item_does_not_abort_batch() {
    let server = MockServer::start().await;
    mount_image(&server, "/1", b"one", "image/jpeg").await;
    mount_image(&server, "/2", b"<html/>", "text/html").await;
    mount_image(&server, "/3", b"three", "image/png").await;
    let (downloader, sink) = create_test_downloader().await;
    let urls: Vec<String> = ["/1", "/2", "/3"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();

    let report = downloader.download_images(&urls, "post").await.unwrap();

    assert_eq!(report.filename, "post-images.zip");
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    let mut zip = read_zip(&sink.payload("post-images.zip").unwrap());
    assert_eq!(zip.len(), 4);
    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    for expected in [
        "post-1.jpeg",
        "post-2-ERROR.txt",
        "post-3.png",
        "post-image-links.txt",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
    assert!(entry_text(&mut zip, "post-2-ERROR.txt").starts_with("Download failed: "));
    assert_eq!(
        entry_text(&mut zip, "post-image-links.txt"),
        format!("1. {}\n2. {}\n3. {}", urls[0], urls[1], urls[2])
    );
    assert!(downloader.registry().is_empty());
}

#[tokio::test]
async fn test_label_is_sanitized_for_archive_and_manifest() {
    let server = MockServer::start().await;
    mount_image(&server, "/u1", b"1", "image/webp").await;
    mount_image(&server, "/u2", b"2", "image/webp").await;
    let (downloader, sink) = create_test_downloader().await;
    let urls = vec![
        format!("{}/u1", server.uri()),
        format!("{}/u2", server.uri()),
    ];

    let report = downloader.download_images(&urls, "My Post!").await.unwrap();

    assert_eq!(report.filename, "My_Post-images.zip");
    let mut zip = read_zip(&sink.payload("My_Post-images.zip").unwrap());
    assert_eq!(
        entry_text(&mut zip, "My_Post-image-links.txt"),
        format!("1. {}\n2. {}", urls[0], urls[1])
    );
    assert!(zip.by_name("My_Post-1.webp").is_ok());
}

#[tokio::test]
async fn test_all_failed_batch_is_still_saved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let (downloader, sink) = create_test_downloader().await;
    let mut events = downloader.subscribe();
    let urls = vec![
        format!("{}/a", server.uri()),
        format!("{}/b", server.uri()),
    ];

    let report = downloader.download_images(&urls, "gone").await.unwrap();

    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, 2);
    let mut zip = read_zip(&sink.payload("gone-images.zip").unwrap());
    assert_eq!(zip.len(), 3);
    assert!(entry_text(&mut zip, "gone-1-ERROR.txt").contains("404"));

    let item_failures = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, Event::ItemFailed { .. }))
        .count();
    assert_eq!(item_failures, 2);
}

#[tokio::test]
async fn test_reordered_batch_is_a_duplicate_but_other_set_is_not() {
    let server = MockServer::start().await;
    for route in ["/a", "/b", "/c"] {
        mount_slow_image(&server, route, Duration::from_millis(200)).await;
    }
    let (downloader, sink) = create_test_downloader().await;
    let a = format!("{}/a", server.uri());
    let b = format!("{}/b", server.uri());
    let c = format!("{}/c", server.uri());

    let first = {
        let downloader = downloader.clone();
        let urls = vec![a.clone(), b.clone()];
        tokio::spawn(async move { downloader.download_images(&urls, "p").await })
    };
    for _ in 0..100 {
        if !downloader.registry().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let reordered = downloader
        .download_images(&[b.clone(), a.clone()], "p")
        .await;
    assert!(matches!(reordered, Err(Error::AlreadyInProgress { .. })));

    let other = downloader.download_images(&[a.clone(), c.clone()], "p").await;
    assert!(other.is_ok());

    first.await.unwrap().unwrap();
    assert_eq!(sink.saved().len(), 2);
    assert!(downloader.registry().is_empty());
}

#[tokio::test]
async fn test_empty_batch_saves_manifest_only_archive() {
    let (downloader, sink) = create_test_downloader().await;

    let report = downloader.download_images(&[], "empty").await.unwrap();

    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, 0);
    let mut zip = read_zip(&sink.payload("empty-images.zip").unwrap());
    assert_eq!(zip.len(), 1);
    assert_eq!(entry_text(&mut zip, "empty-image-links.txt"), "");
}

#[tokio::test]
async fn test_batch_sink_failure_releases_registry() {
    let server = MockServer::start().await;
    mount_image(&server, "/1", b"1", "image/png").await;
    let downloader = ImageDownloader::new(test_config(), std::sync::Arc::new(FailingSink))
        .await
        .unwrap();

    let err = downloader
        .download_images(&[format!("{}/1", server.uri())], "p")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PersistenceFailed(_)));
    assert!(downloader.registry().is_empty());
}
