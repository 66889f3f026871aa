//! Bundle command implementation
//!
//! Walks a delivered bundle directory and prints its file entries as JSON
//! the importer merges into the scene snapshot.

use agrcheck_scene::BundleEntry;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use walkdir::WalkDir;

/// The snapshot fields derived from the directory tree.
#[derive(Debug, Clone, Serialize)]
pub struct BundleListing {
    pub root_name: String,
    pub bundle_entries: Vec<BundleEntry>,
}

/// Lists every file under `dir`, sorted, with `/` separated relative paths.
pub fn list(dir: &Path) -> Result<BundleListing> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk bundle: {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .with_context(|| format!("Entry outside bundle: {}", entry.path().display()))?;
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let size = entry
            .metadata()
            .with_context(|| format!("Failed to stat: {}", entry.path().display()))?
            .len();
        entries.push(BundleEntry::new(path, size));
    }
    log::debug!("{} bundle entries under {}", entries.len(), dir.display());

    let root_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(BundleListing {
        root_name,
        bundle_entries: entries,
    })
}

/// Run the bundle command.
pub fn run(dir: &str) -> Result<ExitCode> {
    let listing = list(Path::new(dir))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&listing).context("Failed to serialize bundle listing")?
    );
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_list_relative_sorted_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Lenina12");
        fs::create_dir_all(root.join("SM_Lenina12_Ground")).unwrap();
        fs::write(root.join("SM_Lenina12.zip"), b"abcd").unwrap();
        fs::write(root.join("SM_Lenina12_Ground").join("SM_Lenina12_Ground.fbx"), b"ab").unwrap();

        let listing = list(&root).unwrap();
        assert_eq!(listing.root_name, "Lenina12");
        assert_eq!(
            listing.bundle_entries,
            vec![
                BundleEntry::new("SM_Lenina12.zip", 4),
                BundleEntry::new("SM_Lenina12_Ground/SM_Lenina12_Ground.fbx", 2),
            ]
        );
    }

    #[test]
    fn test_list_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list(&dir.path().join("absent")).is_err());
    }
}
