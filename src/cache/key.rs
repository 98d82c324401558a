//! Cache key derivation from mise configuration files
//!
//! The key is `{prefix}-{os}-{arch}-{hash}`, where the hash covers every
//! configuration file under the working directory. Same configuration on the
//! same platform = same cache.

use crate::error::{ActionError, ActionResult};
use crate::platform::Platform;
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Default prefix for cache keys
pub const DEFAULT_KEY_PREFIX: &str = "mise-v0";

/// Files that declare tools for mise
pub const CONFIG_PATTERNS: &[&str] = &[
    "**/.tool-versions",
    "**/.mise.toml",
    "**/mise.toml",
    "**/.mise/config.toml",
    "**/.config/mise.toml",
    "**/.config/mise/config.toml",
];

/// Directories never searched for configuration files
const SKIP_DIRS: &[&str] = &[".git", "node_modules"];

fn config_globset() -> ActionResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in CONFIG_PATTERNS {
        let glob = Glob::new(pattern).map_err(|e| ActionError::GlobPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ActionError::GlobPattern {
        pattern: CONFIG_PATTERNS.join(","),
        reason: e.to_string(),
    })
}

/// Relative path with `/` separators, as globs expect
fn normalize_rel_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Find configuration files under `root`, sorted by relative path
pub fn find_config_files(root: &Path) -> ActionResult<Vec<PathBuf>> {
    let globset = config_globset()?;
    let mut matched: Vec<(String, PathBuf)> = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIP_DIRS.contains(&name)))
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable path: {}", e);
                continue;
            }
        };
        // Follows symlinks, so a linked config file is hashed by its target
        if !entry.path().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => normalize_rel_path(rel),
            Err(_) => continue,
        };
        if globset.is_match(&rel) {
            debug!("Found config file: {}", rel);
            matched.push((rel, entry.into_path()));
        }
    }

    matched.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(matched.into_iter().map(|(_, path)| path).collect())
}

/// Hash the given files: SHA256 over the SHA256 of each file, in order.
///
/// Returns an empty string when there are no files.
pub fn hash_files(files: &[PathBuf]) -> ActionResult<String> {
    if files.is_empty() {
        return Ok(String::new());
    }

    let mut hasher = Sha256::new();
    for path in files {
        let contents = fs::read(path)
            .map_err(|e| ActionError::io(format!("reading {}", path.display()), e))?;
        hasher.update(Sha256::digest(&contents));
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hash every configuration file under `root`
pub fn hash_config_files(root: &Path) -> ActionResult<String> {
    let files = find_config_files(root)?;
    debug!("Hashing {} config files", files.len());
    hash_files(&files)
}

/// Build the primary cache key
pub fn cache_key(prefix: &str, platform: &Platform, hash: &str) -> String {
    format!("{}-{}-{}-{}", prefix, platform.os(), platform.arch(), hash)
}

/// Cache version: scopes entries to the cached path and archive format
pub fn cache_version(path: &Path) -> String {
    let components = format!("{}|gzip|1.0", path.display());
    hex::encode(Sha256::digest(components.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn linux() -> Platform {
        Platform::from_identifiers("linux", "x86_64")
    }

    #[test]
    fn key_format() {
        assert_eq!(
            cache_key("mise-v0", &linux(), "abc123"),
            "mise-v0-linux-x64-abc123"
        );
        let mac = Platform::from_identifiers("darwin", "arm64");
        assert_eq!(cache_key("p", &mac, "h"), "p-macos-arm64-h");
    }

    #[test]
    fn no_config_files_gives_empty_hash() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "hello").unwrap();
        assert_eq!(hash_config_files(dir.path()).unwrap(), "");
    }

    #[test]
    fn finds_nested_configs_and_skips_node_modules() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".tool-versions"), "node 20\n").unwrap();
        fs::create_dir_all(dir.path().join("app/.config/mise")).unwrap();
        fs::write(dir.path().join("app/.config/mise/config.toml"), "").unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/.tool-versions"), "x").unwrap();

        let files = find_config_files(dir.path()).unwrap();
        let rels: Vec<String> = files
            .iter()
            .map(|f| normalize_rel_path(f.strip_prefix(dir.path()).unwrap()))
            .collect();
        assert_eq!(rels, vec![".tool-versions", "app/.config/mise/config.toml"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_config_is_hashed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("shared-versions"), "node 20\n").unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("shared-versions"),
            dir.path().join(".tool-versions"),
        )
        .unwrap();

        let files = find_config_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join(".tool-versions")]);

        let plain = TempDir::new().unwrap();
        fs::write(plain.path().join(".tool-versions"), "node 20\n").unwrap();
        assert_eq!(
            hash_config_files(dir.path()).unwrap(),
            hash_config_files(plain.path()).unwrap()
        );
    }

    #[test]
    fn hash_deterministic_across_directories() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        for dir in [&a, &b] {
            fs::write(dir.path().join(".tool-versions"), "python 3.12\n").unwrap();
            fs::write(dir.path().join(".mise.toml"), "[tools]\nnode = \"20\"\n").unwrap();
        }
        let hash_a = hash_config_files(a.path()).unwrap();
        let hash_b = hash_config_files(b.path()).unwrap();
        assert_eq!(hash_a, hash_b);
        assert_eq!(hash_a.len(), 64);
    }

    #[test]
    fn hash_independent_of_creation_order() {
        let a = TempDir::new().unwrap();
        fs::write(a.path().join(".tool-versions"), "python 3.12\n").unwrap();
        fs::write(a.path().join("mise.toml"), "[tools]\n").unwrap();

        let b = TempDir::new().unwrap();
        fs::write(b.path().join("mise.toml"), "[tools]\n").unwrap();
        fs::write(b.path().join(".tool-versions"), "python 3.12\n").unwrap();

        assert_eq!(
            hash_config_files(a.path()).unwrap(),
            hash_config_files(b.path()).unwrap()
        );
    }

    #[test]
    fn one_byte_changes_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".tool-versions");
        fs::write(&path, "node 20.1.0\n").unwrap();
        let before = hash_config_files(dir.path()).unwrap();

        fs::write(&path, "node 20.1.1\n").unwrap();
        let after = hash_config_files(dir.path()).unwrap();

        assert_ne!(before, after);
        assert_ne!(
            cache_key("mise-v0", &linux(), &before),
            cache_key("mise-v0", &linux(), &after)
        );
    }

    #[test]
    fn version_depends_on_path() {
        assert_eq!(
            cache_version(Path::new("/a/mise")),
            cache_version(Path::new("/a/mise"))
        );
        assert_ne!(
            cache_version(Path::new("/a/mise")),
            cache_version(Path::new("/b/mise"))
        );
    }
}
