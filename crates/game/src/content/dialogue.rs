//! Dialogue table loader. The table is a flat JSON object mapping node
//! names to the text shown when the player reaches them.

use std::fs;
use std::path::Path;

use engine::DialogueTable;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DialogueLoadError {
    #[error("failed to read dialogue file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("dialogue file {path} is malformed at {location}: {source}")]
    Parse {
        path: String,
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Load the dialogue table, or an empty one when the file does not
/// exist. A present-but-malformed file is an error, reported with the
/// JSON path of the offending value.
pub fn load_dialogue(path: &Path) -> Result<DialogueTable, DialogueLoadError> {
    if !path.exists() {
        info!(path = %path.display(), "dialogue_file_absent");
        return Ok(DialogueTable::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| DialogueLoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    let table = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        DialogueLoadError::Parse {
            path: path.display().to_string(),
            location: err.path().to_string(),
            source: err.into_inner(),
        }
    })?;
    info!(path = %path.display(), "dialogue_loaded");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_flat_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dialogue.json");
        fs::write(&path, r#"{"old-man": "Welcome!", "sign": "Keep out."}"#).expect("write");

        let table = load_dialogue(&path).expect("load");
        assert_eq!(table.len(), 2);
        assert_eq!(table.line("sign"), Some("Keep out."));
    }

    #[test]
    fn absent_file_yields_empty_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table = load_dialogue(&dir.path().join("nope.json")).expect("load");
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_value_reports_json_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dialogue.json");
        fs::write(&path, r#"{"old-man": 7}"#).expect("write");

        match load_dialogue(&path) {
            Err(DialogueLoadError::Parse { location, .. }) => {
                assert!(location.contains("old-man"), "location was {location}");
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }
}
