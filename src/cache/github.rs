//! GitHub Actions cache service backend
//!
//! Talks to the runner's results service (Twirp JSON over HTTPS) to look up
//! and reserve entries; archive bytes travel through the signed blob URLs
//! the service hands back.

use super::archive::{create_archive, extract_archive};
use super::key::cache_version;
use super::run_blocking;
use super::store::{CacheStore, SaveOutcome};
use crate::error::{ActionError, ActionResult};
use crate::runner::Runner;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const SERVICE_PATH: &str = "twirp/github.actions.results.api.v1.CacheService";

#[derive(Serialize)]
struct GetDownloadUrlRequest<'a> {
    key: &'a str,
    restore_keys: Vec<&'a str>,
    version: &'a str,
}

#[derive(Deserialize)]
struct GetDownloadUrlResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    signed_download_url: String,
    #[serde(default)]
    matched_key: String,
}

#[derive(Serialize)]
struct CreateEntryRequest<'a> {
    key: &'a str,
    version: &'a str,
}

#[derive(Deserialize)]
struct CreateEntryResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    signed_upload_url: String,
}

#[derive(Serialize)]
struct FinalizeRequest<'a> {
    key: &'a str,
    // int64 travels as a string in proto3 JSON
    size_bytes: String,
    version: &'a str,
}

#[derive(Deserialize)]
struct FinalizeResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    entry_id: String,
}

/// Error body returned by Twirp on non-2xx responses
#[derive(Debug, Deserialize)]
struct TwirpError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    msg: String,
}

enum Reply<T> {
    Ok(T),
    Rejected(TwirpError),
}

/// Cache store backed by the GitHub Actions cache service
#[derive(Clone)]
pub struct GithubCacheService {
    base_url: String,
    token: String,
    temp_dir: PathBuf,
    agent: ureq::Agent,
}

impl GithubCacheService {
    pub fn new(base_url: &str, token: &str, temp_dir: PathBuf) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Self {
            base_url,
            token: token.to_string(),
            temp_dir,
            agent,
        }
    }

    /// Build from the variables the Actions runner provides to every step
    pub fn from_runner(runner: &dyn Runner) -> ActionResult<Self> {
        let base_url = runner
            .var("ACTIONS_RESULTS_URL")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ActionError::CacheUnavailable("ACTIONS_RESULTS_URL is not set".to_string())
            })?;
        let token = runner
            .var("ACTIONS_RUNTIME_TOKEN")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ActionError::CacheUnavailable("ACTIONS_RUNTIME_TOKEN is not set".to_string())
            })?;
        let temp_dir = runner
            .var("RUNNER_TEMP")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Ok(Self::new(&base_url, &token, temp_dir))
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}{}/{}", self.base_url, SERVICE_PATH, method)
    }

    fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        method: &str,
        body: &Req,
    ) -> ActionResult<Reply<Resp>> {
        let url = self.endpoint(method);
        debug!("POST {}", url);

        let auth = format!("Bearer {}", self.token);
        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", auth.as_str())
            .send_json(body)?;

        let status = response.status();
        if status.is_success() {
            let parsed: Resp = response.body_mut().read_json()?;
            return Ok(Reply::Ok(parsed));
        }

        let text = response.body_mut().read_to_string().unwrap_or_default();
        let error = serde_json::from_str::<TwirpError>(&text).unwrap_or(TwirpError {
            code: status.as_u16().to_string(),
            msg: text,
        });
        debug!("{} rejected: {:?}", method, error);
        Ok(Reply::Rejected(error))
    }

    fn temp_archive(&self) -> PathBuf {
        self.temp_dir.join(format!("mise-cache-{}.tar.gz", Uuid::new_v4()))
    }

    fn restore_blocking(&self, path: &Path, key: &str) -> ActionResult<Option<String>> {
        let version = cache_version(path);
        let request = GetDownloadUrlRequest {
            key,
            restore_keys: Vec::new(),
            version: &version,
        };

        let reply = match self.call::<_, GetDownloadUrlResponse>("GetCacheEntryDownloadURL", &request)? {
            Reply::Ok(reply) => reply,
            Reply::Rejected(err) if err.code == "not_found" => return Ok(None),
            Reply::Rejected(err) => {
                return Err(ActionError::CacheService(format!(
                    "lookup failed ({}): {}",
                    err.code, err.msg
                )))
            }
        };

        if !reply.ok || reply.signed_download_url.is_empty() {
            debug!("No cache entry for key {}", key);
            return Ok(None);
        }

        let archive = self.temp_archive();
        let result = self
            .download(&reply.signed_download_url, &archive)
            .and_then(|_| extract_archive(&archive, path));
        let _ = fs::remove_file(&archive);
        result?;

        let matched = if reply.matched_key.is_empty() {
            key.to_string()
        } else {
            reply.matched_key
        };
        Ok(Some(matched))
    }

    fn download(&self, url: &str, dest: &Path) -> ActionResult<()> {
        let response = self.agent.get(url).call()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::CacheService(format!(
                "archive download returned HTTP {}",
                status.as_u16()
            )));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ActionError::io(format!("creating {}", parent.display()), e))?;
        }
        let mut file = File::create(dest)
            .map_err(|e| ActionError::io(format!("creating {}", dest.display()), e))?;
        let mut reader = response.into_body().into_reader();
        let bytes = io::copy(&mut reader, &mut file)
            .map_err(|e| ActionError::io("downloading cache archive", e))?;
        debug!("Downloaded {} bytes", bytes);
        Ok(())
    }

    fn save_blocking(&self, path: &Path, key: &str) -> ActionResult<SaveOutcome> {
        let version = cache_version(path);

        let request = CreateEntryRequest {
            key,
            version: &version,
        };
        let reply = match self.call::<_, CreateEntryResponse>("CreateCacheEntry", &request)? {
            Reply::Ok(reply) => reply,
            Reply::Rejected(err) if err.code == "already_exists" || err.code == "409" => {
                return Ok(SaveOutcome::AlreadyExists)
            }
            Reply::Rejected(err) => {
                return Err(ActionError::CacheService(format!(
                    "reserving cache failed ({}): {}",
                    err.code, err.msg
                )))
            }
        };
        if !reply.ok || reply.signed_upload_url.is_empty() {
            warn!(
                "Unable to reserve cache with key {}, another job may be creating this cache.",
                key
            );
            return Ok(SaveOutcome::AlreadyExists);
        }

        fs::create_dir_all(&self.temp_dir)
            .map_err(|e| ActionError::io(format!("creating {}", self.temp_dir.display()), e))?;
        let archive = self.temp_archive();
        let result = create_archive(path, &archive)
            .and_then(|size| self.upload(&reply.signed_upload_url, &archive).map(|_| size));
        let _ = fs::remove_file(&archive);
        let size = result?;

        let request = FinalizeRequest {
            key,
            size_bytes: size.to_string(),
            version: &version,
        };
        match self.call::<_, FinalizeResponse>("FinalizeCacheEntryUpload", &request)? {
            Reply::Ok(reply) if reply.ok => {
                info!("Cache entry {} finalized ({} bytes)", reply.entry_id, size);
                Ok(SaveOutcome::Saved)
            }
            Reply::Ok(_) => Err(ActionError::CacheService(format!(
                "cache entry for key {key} was not finalized"
            ))),
            Reply::Rejected(err) => Err(ActionError::CacheService(format!(
                "finalizing cache failed ({}): {}",
                err.code, err.msg
            ))),
        }
    }

    fn upload(&self, url: &str, archive: &Path) -> ActionResult<()> {
        let bytes = fs::read(archive)
            .map_err(|e| ActionError::io(format!("reading {}", archive.display()), e))?;
        debug!("Uploading {} bytes", bytes.len());

        let response = self
            .agent
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .send(&bytes[..])?;
        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::CacheService(format!(
                "archive upload returned HTTP {}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for GithubCacheService {
    async fn restore(&self, path: &Path, key: &str) -> ActionResult<Option<String>> {
        let this = self.clone();
        let path = path.to_path_buf();
        let key = key.to_string();
        run_blocking(move || this.restore_blocking(&path, &key)).await
    }

    async fn save(&self, path: &Path, key: &str) -> ActionResult<SaveOutcome> {
        let this = self.clone();
        let path = path.to_path_buf();
        let key = key.to_string();
        run_blocking(move || this.save_blocking(&path, &key)).await
    }

    fn name(&self) -> &'static str {
        "github"
    }
}
