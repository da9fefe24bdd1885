//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Release JSON in the registry's format.
pub fn release_json(tag: &str, base_url: &str) -> String {
    serde_json::json!({
        "tag_name": tag,
        "name": format!("Launcher {tag}"),
        "body": "### Changes\n- Faster startup",
        "published_at": "2025-06-01T10:00:00Z",
        "assets": [
            {
                "name": "ddalab-launcher-windows-amd64.zip",
                "browser_download_url": format!("{base_url}/download/ddalab-launcher-windows-amd64.zip"),
                "size": 5_000_000
            },
            {
                "name": "ddalab-launcher-linux-amd64.tar.gz",
                "browser_download_url": format!("{base_url}/download/ddalab-launcher-linux-amd64.tar.gz"),
                "size": 4_000_000
            },
            {
                "name": "ddalab-launcher-darwin-arm64.tar.gz",
                "browser_download_url": format!("{base_url}/download/ddalab-launcher-darwin-arm64.tar.gz"),
                "size": 4_500_000
            }
        ]
    })
    .to_string()
}

/// A gzip-compressed tar holding `(path, contents)` entries.
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *data)
            .expect("append tar entry");
    }
    let mut encoder = builder.into_inner().expect("finish tar");
    encoder.flush().expect("flush gzip");
    encoder.finish().expect("finish gzip")
}

/// Deterministic payload that looks nothing like a placeholder.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
