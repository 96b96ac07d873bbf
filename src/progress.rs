use std::{fs, path::Path};

use log::warn;
use serde_json::json;

/// Overwrite `path` with the current extraction progress. Failures are
/// logged and otherwise ignored.
pub fn write_progress(path: &Path, current: usize, total: usize, archive: &str, status: &str) {
    let json = json!({
        "current": current,
        "total": total,
        "archive": archive,
        "status": status,
    });
    if let Err(e) = fs::write(path, json.to_string()) {
        warn!("Could not write progress to {}: {}", path.display(), e);
    }
}
