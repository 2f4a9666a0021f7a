//! Credential token
//!
//! Reads the opaque token attached to every backend request. The token is
//! never generated or validated here, only trimmed.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading the credential file
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read credential file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file {0:?} is empty")]
    Empty(PathBuf),
}

/// Read a token from `path`
///
/// Each line is trimmed and the lines are re-joined with `\n`, then the whole
/// token is trimmed again.
pub fn load_token(path: &Path) -> Result<String, CredentialError> {
    let content = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let token = normalize_token(&content);
    if token.is_empty() {
        return Err(CredentialError::Empty(path.to_path_buf()));
    }

    tracing::debug!(path = %path.display(), length = token.len(), "Loaded credential token");
    Ok(token)
}

fn normalize_token(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
