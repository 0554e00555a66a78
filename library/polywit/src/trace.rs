// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loading replay traces written by the `polywit` driver.

use polywit_metadata::{ReplayTrace, TRACE_ENV_VAR};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("environment variable `POLYWIT_TRACE` does not name a trace file")]
    MissingEnv,
    #[error("could not read trace file `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`{}` is not a valid replay trace", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a trace file.
pub fn load(path: &Path) -> Result<ReplayTrace, TraceError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| TraceError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&content)
        .map_err(|source| TraceError::Format { path: path.to_path_buf(), source })
}

/// Read the trace file named by the `POLYWIT_TRACE` environment variable.
pub fn from_env() -> Result<ReplayTrace, TraceError> {
    match std::env::var_os(TRACE_ENV_VAR) {
        Some(path) if !path.is_empty() => load(Path::new(&path)),
        _ => Err(TraceError::MissingEnv),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        std::fs::write(&path, r#"{"producer":"JBMC","tokens":["true","5"]}"#).unwrap();
        let trace = load(&path).unwrap();
        assert_eq!(trace.tokens, vec!["true", "5"]);

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(load(&path), Err(TraceError::Format { .. })));
        assert!(matches!(load(&dir.path().join("missing.json")), Err(TraceError::Io { .. })));
    }
}
