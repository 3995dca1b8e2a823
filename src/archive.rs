//! Bundling dubbed videos and the transcript document into one zip.

use crate::document::DOCUMENT_FILE_NAME;
use crate::error::{AutodubError, Result};
use crate::media::{dubbed_file_name, DubbedVideo};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Default file name of the archive handed to users.
pub const ARCHIVE_FILE_NAME: &str = "translated_outputs.zip";

/// The final deliverable of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArchive {
    pub path: PathBuf,
    /// Member names in the order they were written.
    pub members: Vec<String>,
}

impl OutputArchive {
    /// Languages that have a dubbed video in the archive.
    pub fn dubbed_languages(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter_map(|m| m.strip_prefix("final_video_")?.strip_suffix(".mp4"))
            .collect()
    }
}

/// Write every dubbed video plus the rendered document to `output`.
///
/// Videos are stored without recompression since they are already encoded.
/// The archive is assembled next to `output` and only moved into place once
/// complete, so a failure never leaves a partial file at `output`.
pub fn package(videos: &[DubbedVideo], document: &[u8], output: &Path) -> Result<OutputArchive> {
    let parent = match output.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    let staging = tempfile::Builder::new()
        .prefix(".autodub-archive-")
        .suffix(".zip")
        .tempfile_in(parent)
        .map_err(|e| {
            AutodubError::Archive(format!("Cannot create archive in {}: {e}", parent.display()))
        })?;
    let mut writer = ZipWriter::new(staging);
    let mut members = Vec::with_capacity(videos.len() + 1);

    let stored = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .large_file(true);
    for video in videos {
        let name = dubbed_file_name(&video.language);
        debug!("Adding {} as {}", video.path.display(), name);

        let mut source = BufReader::new(File::open(&video.path).map_err(|e| {
            AutodubError::Archive(format!("Cannot read {}: {e}", video.path.display()))
        })?);
        writer.start_file(name.as_str(), stored)?;
        std::io::copy(&mut source, &mut writer)?;
        members.push(name);
    }

    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(DOCUMENT_FILE_NAME, deflated)?;
    writer.write_all(document)?;
    members.push(DOCUMENT_FILE_NAME.to_string());

    let staging = writer.finish()?;
    staging.persist(output).map_err(|e| {
        AutodubError::Archive(format!("Cannot write {}: {}", output.display(), e.error))
    })?;
    info!("Packaged {} file(s) into {}", members.len(), output.display());

    Ok(OutputArchive {
        path: output.to_path_buf(),
        members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn video(dir: &Path, language: &str, content: &[u8]) -> DubbedVideo {
        let path = dir.join(dubbed_file_name(language));
        std::fs::write(&path, content).unwrap();
        DubbedVideo {
            language: language.to_string(),
            path,
        }
    }

    #[test]
    fn test_package_members() {
        let dir = TempDir::new().unwrap();
        let videos = vec![video(dir.path(), "hi", b"hindi"), video(dir.path(), "gu", b"gujarati")];
        let output = dir.path().join("out").join(ARCHIVE_FILE_NAME);

        let archive = package(&videos, b"docx-bytes", &output).unwrap();
        assert_eq!(
            archive.members,
            vec!["final_video_hi.mp4", "final_video_gu.mp4", "translations.docx"]
        );
        assert_eq!(archive.dubbed_languages(), vec!["hi", "gu"]);

        let mut zip = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
        assert_eq!(zip.len(), 3);
        let mut content = Vec::new();
        zip.by_name("final_video_gu.mp4")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"gujarati");

        let mut doc = Vec::new();
        zip.by_name("translations.docx")
            .unwrap()
            .read_to_end(&mut doc)
            .unwrap();
        assert_eq!(doc, b"docx-bytes");
    }

    #[test]
    fn test_package_document_only() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join(ARCHIVE_FILE_NAME);

        let archive = package(&[], b"doc", &output).unwrap();
        assert_eq!(archive.members, vec!["translations.docx"]);
        assert!(archive.dubbed_languages().is_empty());
    }

    #[test]
    fn test_package_same_member_set_on_rerun() {
        let dir = TempDir::new().unwrap();
        let videos = vec![video(dir.path(), "ml", b"malayalam")];
        let output = dir.path().join(ARCHIVE_FILE_NAME);

        let first = package(&videos, b"doc", &output).unwrap();
        let second = package(&videos, b"doc", &output).unwrap();
        assert_eq!(first.members, second.members);
    }

    #[test]
    fn test_missing_video_fails() {
        let dir = TempDir::new().unwrap();
        let videos = vec![
            video(dir.path(), "hi", b"hindi"),
            DubbedVideo {
                language: "te".to_string(),
                path: dir.path().join("gone.mp4"),
            },
        ];
        let output = dir.path().join(ARCHIVE_FILE_NAME);

        let result = package(&videos, b"doc", &output);
        assert!(matches!(result, Err(AutodubError::Archive(_))));
        assert!(!output.exists());

        // No staging file is left behind either.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".autodub-archive-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_failed_rerun_keeps_previous_archive() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join(ARCHIVE_FILE_NAME);
        package(&[video(dir.path(), "ml", b"malayalam")], b"doc", &output).unwrap();

        let missing = vec![DubbedVideo {
            language: "ml".to_string(),
            path: dir.path().join("gone.mp4"),
        }];
        assert!(package(&missing, b"doc", &output).is_err());

        let mut zip = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
        assert_eq!(zip.len(), 2);
        let mut content = Vec::new();
        zip.by_name("final_video_ml.mp4")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"malayalam");
    }
}
