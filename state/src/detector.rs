//! Storage directory detection

use nodestate_core::NsResult;
use std::path::Path;

/// Files whose joint presence marks a storage engine instance
pub const STORAGE_SENTINELS: [&str; 2] = ["CURRENT", "LOG"];

/// True iff every sentinel name is among `names`. Other entries are ignored.
pub fn is_storage_listing<S: AsRef<str>>(names: &[S]) -> bool {
    STORAGE_SENTINELS
        .iter()
        .all(|sentinel| names.iter().any(|n| n.as_ref() == *sentinel))
}

/// List `dir` and apply [`is_storage_listing`]
pub fn is_storage_dir(dir: &Path) -> NsResult<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    let names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    Ok(is_storage_listing(&names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_both_sentinels_required() {
        assert!(is_storage_listing(&["CURRENT", "LOG"]));
        assert!(!is_storage_listing(&["CURRENT"]));
        assert!(!is_storage_listing(&["LOG"]));
        assert!(!is_storage_listing::<&str>(&[]));
    }

    #[test]
    fn test_extra_files_do_not_matter() {
        assert!(is_storage_listing(&[
            "000005.ldb",
            "CURRENT",
            "LOCK",
            "LOG",
            "LOG.old",
            "MANIFEST-000004",
        ]));
        assert!(!is_storage_listing(&["CURRENT.bak", "LOG.old", "MANIFEST-000001"]));
    }

    #[test]
    fn test_directory_listing() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("CURRENT"), b"MANIFEST-000001\n").unwrap();
        assert!(!is_storage_dir(tmp.path()).unwrap());

        std::fs::write(tmp.path().join("LOG"), b"").unwrap();
        assert!(is_storage_dir(tmp.path()).unwrap());

        assert!(!is_storage_dir(&tmp.path().join("CURRENT")).unwrap());
    }
}
