use std::path::PathBuf;

const MAX_LEVEL_INDEX: i64 = 999;

/// Clamp a client-supplied level number; the engine wraps it over its level list.
pub fn normalize_level_index(value: i64) -> usize {
    value.clamp(0, MAX_LEVEL_INDEX) as usize
}

/// Pick the static root: an explicit directory first, then the usual build outputs.
pub fn resolve_static_dir(configured: Option<&str>) -> Option<PathBuf> {
    if let Some(raw) = configured {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("web"), PathBuf::from("dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}
