//! Loading frame sequences from disk

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{TokenizerMode, tokenize};
use crate::types::{FrameSequence, StreamRole};
use crate::{ReplayError, Result};

/// Read and tokenize one role's output file.
///
/// Fails with [`ReplayError::File`] if the file cannot be read as UTF-8 text
/// and with [`ReplayError::EmptySequence`] if it holds no frames.
pub async fn load_sequence<P: AsRef<Path>>(
    role: StreamRole,
    path: P,
    mode: TokenizerMode,
) -> Result<FrameSequence> {
    let path = path.as_ref();
    debug!("Reading {} frames from {}", role, path.display());

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReplayError::file_error(path, e))?;

    let sequence = sequence_from_text(role, path, &text, mode);
    if sequence.is_empty() {
        return Err(ReplayError::EmptySequence { role, path: path.to_path_buf() });
    }

    info!(
        "Loaded {} {} frames from {} ({} bytes)",
        sequence.len(),
        role,
        path.display(),
        text.len()
    );
    Ok(sequence)
}

/// Tokenize in-memory text into a sequence for `role`.
pub fn sequence_from_text(
    role: StreamRole,
    source: impl Into<PathBuf>,
    text: &str,
    mode: TokenizerMode,
) -> FrameSequence {
    FrameSequence::new(role, source, tokenize(text, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{odas_stream, write_fixture};

    #[tokio::test]
    async fn loads_frames_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "sst_output.json", &odas_stream(5, 2));

        let seq = load_sequence(StreamRole::Tracking, &path, TokenizerMode::Scanner).await.unwrap();
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.role(), StreamRole::Tracking);
        assert_eq!(seq.source(), path.as_path());
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let err = load_sequence(StreamRole::Potential, "/no/such/ssl.json", TokenizerMode::Scanner)
            .await
            .unwrap_err();
        match err {
            ReplayError::File { path, .. } => assert_eq!(path, PathBuf::from("/no/such/ssl.json")),
            other => panic!("Expected File error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "ssl_output.json", "\n\n");

        let err = load_sequence(StreamRole::Potential, &path, TokenizerMode::Boundary)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplayError::EmptySequence { role: StreamRole::Potential, .. }));
    }
}
