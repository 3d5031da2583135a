use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use super::artifact::GeneratedArtifact;
use super::error::GenerationError;

/// Bundle every artifact into one zip archive, each under its file name.
///
/// All or nothing: an empty set or a duplicate name fails before anything
/// is written. Audio is stored as-is since it is already compressed.
pub fn package_artifacts(artifacts: &[GeneratedArtifact]) -> Result<Vec<u8>, GenerationError> {
    if artifacts.is_empty() {
        return Err(GenerationError::Packaging("no artifacts to package".to_string()));
    }

    let mut names = HashSet::new();
    for artifact in artifacts {
        if !names.insert(artifact.file_name.as_str()) {
            return Err(GenerationError::Packaging(format!(
                "duplicate file name {}",
                artifact.file_name
            )));
        }
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for artifact in artifacts {
        writer
            .start_file(artifact.file_name.as_str(), options)
            .map_err(|e| GenerationError::Packaging(e.to_string()))?;
        writer
            .write_all(&artifact.audio)
            .map_err(|e| GenerationError::Packaging(e.to_string()))?;
    }

    let archive = writer
        .finish()
        .map_err(|e| GenerationError::Packaging(e.to_string()))?
        .into_inner();

    tracing::info!(
        artifact_count = artifacts.len(),
        archive_size_bytes = archive.len(),
        "Artifacts packaged"
    );

    Ok(archive)
}
