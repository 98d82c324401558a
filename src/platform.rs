//! Platform detection for download URLs and cache keys
//!
//! mise publishes binaries named after Node-style platform tokens
//! (`macos`, `linux`, `x64`, `arm64`), so Rust's target constants are
//! normalised before use.

use std::fmt;
use std::path::{Path, PathBuf};

/// Operating system and architecture tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    /// Detect the platform this binary is running on
    pub fn detect() -> Self {
        Self::from_identifiers(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Build a platform from raw identifiers.
    ///
    /// `darwin` becomes `macos`; any other OS identifier is kept verbatim.
    pub fn from_identifiers(os: &str, arch: &str) -> Self {
        let os = match os {
            "darwin" | "macos" => "macos",
            other => other,
        };
        let arch = match arch {
            "x86_64" | "amd64" => "x64",
            "aarch64" => "arm64",
            other => other,
        };
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    /// OS token used in URLs and cache keys
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Architecture token used in URLs and cache keys
    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows" || self.os == "win32"
    }

    /// File name of the mise executable on this platform
    pub fn binary_name(&self) -> &'static str {
        if self.is_windows() {
            "mise.exe"
        } else {
            "mise"
        }
    }

    /// Separator used in PATH-like variables
    pub fn path_delimiter(&self) -> char {
        if self.is_windows() {
            ';'
        } else {
            ':'
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Resolve the mise data directory.
///
/// Precedence: `MISE_DATA_DIR`, then `$XDG_DATA_HOME/mise`, then
/// `<home>/.local/share/mise`.
pub fn mise_data_dir(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup("MISE_DATA_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = lookup("XDG_DATA_HOME").filter(|d| !d.is_empty()) {
        return Path::new(&xdg).join("mise");
    }
    let home = lookup("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".local").join("share").join("mise")
}
