//! Locating the launcher executable inside a downloaded artifact.

use std::fmt;
use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::config::BinaryNames;
use crate::error::{Result, UpdateError};
use crate::platform::Platform;

/// Payloads smaller than this are treated as corrupt or placeholder files.
pub const MIN_BINARY_SIZE: u64 = 1024;

/// Container format of a downloaded artifact, decided by its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// tar.gz archive (macOS, Linux)
    TarGz,
    /// ZIP archive (Windows)
    Zip,
    /// Uncompressed executable
    Raw,
}

impl ArchiveType {
    /// Detects the archive type from a download URL.
    ///
    /// Query strings and fragments are ignored, as is ASCII case.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let path = path.to_ascii_lowercase();

        if path.ends_with(".tar.gz") {
            Self::TarGz
        } else if path.ends_with(".zip") {
            Self::Zip
        } else {
            Self::Raw
        }
    }

    /// Get a human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "ZIP",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An executable payload that passed the minimum-size check.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtractedBinary {
    name: String,
    data: Vec<u8>,
}

impl ExtractedBinary {
    /// Wraps `data`, rejecting payloads below [`MIN_BINARY_SIZE`].
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let size = data.len() as u64;
        if size < MIN_BINARY_SIZE {
            return Err(UpdateError::BinaryTooSmall {
                name,
                size,
                minimum: MIN_BINARY_SIZE,
            });
        }
        Ok(Self { name, data })
    }

    /// Name the binary was found under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The executable bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; empty payloads cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the binary, returning its bytes.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for ExtractedBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractedBinary")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Finds the launcher executable for one platform inside an artifact.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    platform: Platform,
    names: BinaryNames,
}

impl ArchiveExtractor {
    /// Creates an extractor for `platform`.
    #[must_use]
    pub fn new(platform: Platform, names: BinaryNames) -> Self {
        Self { platform, names }
    }

    /// Extracts the executable from `reader`, using `source_url` to decide
    /// the container format.
    pub fn extract<R: Read>(&self, reader: R, source_url: &str) -> Result<ExtractedBinary> {
        let archive_type = ArchiveType::from_url(source_url);
        tracing::debug!("Extracting from {} artifact {}", archive_type, source_url);

        let binary = match archive_type {
            ArchiveType::TarGz => self.extract_tar_gz(reader)?,
            ArchiveType::Zip => self.extract_zip(reader)?,
            ArchiveType::Raw => extract_raw(reader, source_url)?,
        };

        tracing::info!(
            "Extracted binary '{}' ({} bytes) for platform {}",
            binary.name(),
            binary.len(),
            self.platform
        );
        Ok(binary)
    }

    /// Name patterns a tar entry's base name is matched against.
    #[must_use]
    pub fn tar_patterns(&self) -> Vec<String> {
        let token = self.platform.token();
        let base = [
            format!("{}-{token}", self.names.product),
            format!("{}-{token}", self.names.component),
            token.clone(),
        ];

        if self.platform.is_windows() {
            base.iter()
                .flat_map(|p| [p.clone(), format!("{p}.exe")])
                .collect()
        } else {
            base.to_vec()
        }
    }

    /// Generic names accepted from a tar when the entry path carries the
    /// platform token.
    fn tar_generic_names(&self) -> Vec<String> {
        let suffix = if self.platform.is_windows() { ".exe" } else { "" };
        vec![
            format!("{}{suffix}", self.names.product),
            format!("{}{suffix}", self.names.component),
        ]
    }

    /// Name patterns a zip entry's base name is matched against. Zip
    /// artifacts only carry Windows executables.
    #[must_use]
    pub fn zip_patterns(&self) -> Vec<String> {
        let token = self.platform.token();
        vec![
            format!("{}-{token}.exe", self.names.product),
            format!("{}-{token}.exe", self.names.component),
            format!("{token}.exe"),
            format!("{}.exe", self.names.product),
            format!("{}.exe", self.names.component),
        ]
    }

    fn extract_tar_gz<R: Read>(&self, reader: R) -> Result<ExtractedBinary> {
        let patterns = self.tar_patterns();
        let generic = self.tar_generic_names();
        let token = self.platform.token();

        let mut archive = Archive::new(GzDecoder::new(reader));
        let entries = archive.entries().map_err(|e| {
            UpdateError::ArchiveExtraction(format!("Failed to read tar entries: {e}"))
        })?;

        for entry_result in entries {
            let mut entry = entry_result.map_err(|e| {
                UpdateError::ArchiveExtraction(format!("Failed to read tar entry: {e}"))
            })?;

            if !entry.header().entry_type().is_file() {
                continue;
            }

            let path = entry
                .path()
                .map_err(|e| {
                    UpdateError::ArchiveExtraction(format!("Failed to read entry path: {e}"))
                })?
                .to_string_lossy()
                .into_owned();
            let file_name = base_name(&path);

            let matched = matches_any(file_name, &patterns)
                || (generic.iter().any(|g| g == file_name) && path.contains(&token));
            if !matched {
                continue;
            }

            tracing::debug!("Found binary at {} in tar archive", path);
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(|e| {
                UpdateError::ArchiveExtraction(format!("Failed to read binary: {e}"))
            })?;
            return ExtractedBinary::new(file_name, data);
        }

        Err(UpdateError::BinaryNotFound {
            platform: token,
            patterns,
        })
    }

    fn extract_zip<R: Read>(&self, mut reader: R) -> Result<ExtractedBinary> {
        let patterns = self.zip_patterns();
        let token = self.platform.token();

        // The central directory sits at the end, so the whole archive is needed.
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).map_err(|e| {
            UpdateError::ArchiveExtraction(format!("Failed to read ZIP data: {e}"))
        })?;

        let mut archive = zip::ZipArchive::new(Cursor::new(buffer))?;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            let path = file.name().to_string();
            let file_name = base_name(&path);
            if !matches_any(file_name, &patterns) {
                continue;
            }

            tracing::debug!("Found binary at {} in ZIP archive", path);
            let mut data = Vec::new();
            file.read_to_end(&mut data).map_err(|e| {
                UpdateError::ArchiveExtraction(format!("Failed to read binary: {e}"))
            })?;
            return ExtractedBinary::new(file_name, data);
        }

        Err(UpdateError::BinaryNotFound {
            platform: token,
            patterns,
        })
    }
}

/// Raw artifacts are passed through untouched, subject only to the size check.
fn extract_raw<R: Read>(mut reader: R, source_url: &str) -> Result<ExtractedBinary> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data).map_err(|e| {
        UpdateError::ArchiveExtraction(format!("Failed to read downloaded binary: {e}"))
    })?;

    let path = source_url.split(['?', '#']).next().unwrap_or(source_url);
    ExtractedBinary::new(base_name(path), data)
}

/// Last component of an archive path, for either separator.
fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn matches_any(file_name: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| file_name == p || file_name.contains(p.as_str()))
}
