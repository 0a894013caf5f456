//! Custom test assertions for end-to-end tests

use carousel_dl::{Event, ImageDownloader};
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Read every entry of a ZIP file into (name, contents) pairs, in archive order
pub fn read_zip_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).expect("archive should exist");
    let mut archive = zip::ZipArchive::new(file).expect("archive should be a valid zip");

    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).expect("entry should be readable");
            let mut contents = Vec::new();
            entry
                .read_to_end(&mut contents)
                .expect("entry contents should be readable");
            (entry.name().to_string(), contents)
        })
        .collect()
}

/// Collect events until one matches `done` or `timeout` expires
pub async fn collect_events_until<F>(
    downloader: &ImageDownloader,
    timeout: Duration,
    done: F,
) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut events = downloader.subscribe();
    let mut collected = Vec::new();

    let _ = tokio::time::timeout(timeout, async {
        while let Ok(event) = events.recv().await {
            let finished = done(&event);
            collected.push(event);
            if finished {
                break;
            }
        }
    })
    .await;

    collected
}

/// Assert that `dir` holds exactly `expected` file names
pub fn assert_dir_contains(dir: &Path, expected: &[&str]) {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("directory should exist")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    expected.sort();

    assert_eq!(names, expected, "unexpected contents of {}", dir.display());
}
