//! Installing the mise binary
//!
//! Downloads the release for this platform into `<data-dir>/bin`, marks it
//! executable and puts the directory on PATH.

use crate::error::{ActionError, ActionResult};
use crate::platform::Platform;
use crate::runner::Runner;
use async_trait::async_trait;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Host serving mise release binaries
pub const DOWNLOAD_HOST: &str = "https://mise.jdx.dev";

/// Download URL for a version, or the latest release when `version` is `None`
pub fn download_url(version: Option<&str>, platform: &Platform) -> String {
    match version {
        Some(version) => format!(
            "{}/v{}/mise-v{}-{}-{}",
            DOWNLOAD_HOST,
            version,
            version,
            platform.os(),
            platform.arch()
        ),
        None => format!(
            "{}/mise-latest-{}-{}",
            DOWNLOAD_HOST,
            platform.os(),
            platform.arch()
        ),
    }
}

/// Somewhere a binary can be fetched from
#[async_trait]
pub trait BinarySource: Send + Sync {
    /// Write the resource at `url` to `dest`, replacing any existing file
    async fn fetch(&self, url: &str, dest: &Path) -> ActionResult<()>;
}

/// Blocking HTTPS download, run on tokio's blocking pool
pub struct HttpsDownloader {
    agent: ureq::Agent,
}

impl HttpsDownloader {
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }

    fn fetch_blocking(agent: &ureq::Agent, url: &str, dest: &Path) -> ActionResult<()> {
        let response = agent.get(url).call().map_err(|e| ActionError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = File::create(dest)
            .map_err(|e| ActionError::io(format!("creating {}", dest.display()), e))?;
        let mut reader = response.into_body().into_reader();
        let bytes = io::copy(&mut reader, &mut file).map_err(|e| ActionError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Downloaded {} bytes to {}", bytes, dest.display());
        Ok(())
    }
}

impl Default for HttpsDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BinarySource for HttpsDownloader {
    async fn fetch(&self, url: &str, dest: &Path) -> ActionResult<()> {
        let agent = self.agent.clone();
        let url = url.to_string();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &url, &dest))
            .await
            .map_err(|e| ActionError::Internal(format!("download task failed: {e}")))?
    }
}

/// Set mode 0755 on unix; a no-op elsewhere
pub fn make_executable(path: &Path) -> ActionResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o755);
        fs::set_permissions(path, perms)
            .map_err(|e| ActionError::io(format!("setting permissions on {}", path.display()), e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Install mise into `<data_dir>/bin` and add that directory to PATH.
///
/// Returns the path of the installed binary.
pub async fn install_mise(
    runner: &mut dyn Runner,
    source: &dyn BinarySource,
    version: Option<&str>,
    data_dir: &Path,
) -> ActionResult<PathBuf> {
    let platform = runner.platform().clone();
    let bin_dir = data_dir.join("bin");
    let bin_path = bin_dir.join(platform.binary_name());

    tokio::fs::create_dir_all(&bin_dir)
        .await
        .map_err(|e| ActionError::io(format!("creating {}", bin_dir.display()), e))?;

    let url = download_url(version, &platform);
    info!("Downloading {} to {}", url, bin_path.display());
    source.fetch(&url, &bin_path).await?;
    make_executable(&bin_path)?;

    runner.add_path(&bin_dir.to_string_lossy())?;
    Ok(bin_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MemoryRunner;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Source that writes a fixed body and records requested URLs
    struct StaticSource {
        body: &'static str,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BinarySource for StaticSource {
        async fn fetch(&self, url: &str, dest: &Path) -> ActionResult<()> {
            self.urls.lock().unwrap().push(url.to_string());
            fs::write(dest, self.body).map_err(|e| ActionError::io("writing", e))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl BinarySource for FailingSource {
        async fn fetch(&self, url: &str, _dest: &Path) -> ActionResult<()> {
            Err(ActionError::DownloadStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    #[test]
    fn versioned_url() {
        let platform = Platform::from_identifiers("darwin", "aarch64");
        assert_eq!(
            download_url(Some("2024.12.14"), &platform),
            "https://mise.jdx.dev/v2024.12.14/mise-v2024.12.14-macos-arm64"
        );
    }

    #[test]
    fn latest_url() {
        let platform = Platform::from_identifiers("linux", "x86_64");
        assert_eq!(
            download_url(None, &platform),
            "https://mise.jdx.dev/mise-latest-linux-x64"
        );
    }

    #[test]
    fn unknown_os_in_url() {
        let platform = Platform::from_identifiers("freebsd", "x86_64");
        assert!(download_url(None, &platform).ends_with("mise-latest-freebsd-x64"));
    }

    #[tokio::test]
    async fn install_writes_binary_and_adds_path() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("mise");
        let source = StaticSource {
            body: "binary",
            urls: Mutex::new(Vec::new()),
        };
        let mut runner = MemoryRunner::new(Platform::from_identifiers("linux", "x86_64"));

        let bin = install_mise(&mut runner, &source, Some("2024.1.0"), &data_dir)
            .await
            .unwrap();

        assert_eq!(bin, data_dir.join("bin").join("mise"));
        assert_eq!(fs::read_to_string(&bin).unwrap(), "binary");
        assert_eq!(
            runner.paths(),
            &[data_dir.join("bin").to_string_lossy().into_owned()]
        );
        assert_eq!(
            source.urls.lock().unwrap().as_slice(),
            &["https://mise.jdx.dev/v2024.1.0/mise-v2024.1.0-linux-x64".to_string()]
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&bin).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn install_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("mise");
        let source = StaticSource {
            body: "v2",
            urls: Mutex::new(Vec::new()),
        };
        let mut runner = MemoryRunner::new(Platform::from_identifiers("linux", "x86_64"));

        install_mise(&mut runner, &source, None, &data_dir).await.unwrap();
        let bin = install_mise(&mut runner, &source, None, &data_dir).await.unwrap();
        assert_eq!(fs::read_to_string(bin).unwrap(), "v2");
    }

    #[tokio::test]
    async fn failed_download_leaves_path_alone() {
        let dir = TempDir::new().unwrap();
        let mut runner = MemoryRunner::new(Platform::from_identifiers("linux", "x86_64"));

        let err = install_mise(&mut runner, &FailingSource, None, dir.path())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("HTTP 404"));
        assert!(runner.paths().is_empty());
    }
}
