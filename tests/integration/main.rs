//! Integration tests for mise-action

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    /// Binary with a clean environment so the host runner's state can't leak in
    fn mise_action() -> Command {
        let mut cmd = cargo_bin_cmd!("mise-action");
        cmd.env_clear();
        if let Ok(path) = std::env::var("PATH") {
            cmd.env("PATH", path);
        }
        cmd
    }

    #[test]
    fn help_displays() {
        mise_action()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("installs mise, caches its data directory"));
    }

    #[test]
    fn version_displays() {
        mise_action()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("mise-action"));
    }

    #[test]
    fn invalid_boolean_input_fails() {
        let dir = TempDir::new().unwrap();
        mise_action()
            .current_dir(dir.path())
            .env("INPUT_INSTALL", "maybe")
            .arg("run")
            .assert()
            .failure()
            .stdout(predicate::str::contains("::error::"))
            .stderr(predicate::str::contains("install"));
    }

    #[test]
    fn cache_without_backend_fails() {
        let dir = TempDir::new().unwrap();
        mise_action()
            .current_dir(dir.path())
            .arg("run")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache service is not available"));
    }

    #[test]
    fn post_skips_when_cache_disabled() {
        mise_action()
            .env("STATE_CACHE", "false")
            .arg("post")
            .assert()
            .success();
    }

    #[test]
    fn post_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        mise_action()
            .env("STATE_CACHE", "true")
            .env("STATE_PRIMARY_KEY", "mise-v0-linux-x64-abc")
            .env("STATE_MISE_DIR", dir.path().join("absent"))
            .args(["post", "--cache-dir"])
            .arg(dir.path().join("cache"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("does not exist on disk"));
    }

    #[test]
    fn post_skips_exact_hit() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("cache");
        mise_action()
            .env("STATE_CACHE", "true")
            .env("STATE_PRIMARY_KEY", "k")
            .env("STATE_CACHE_KEY", "k")
            .env("STATE_MISE_DIR", dir.path())
            .env("MISE_ACTION_CACHE_DIR", &cache_dir)
            .arg("post")
            .assert()
            .success();
        assert!(!cache_dir.exists());
    }

    #[test]
    fn post_saves_to_local_cache() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("mise");
        fs::create_dir_all(data.join("installs")).unwrap();
        fs::write(data.join("installs/marker"), "1").unwrap();
        let cache_dir = dir.path().join("cache");

        mise_action()
            .env("STATE_CACHE", "true")
            .env("STATE_PRIMARY_KEY", "mise-v0-linux-x64-abc")
            .env("STATE_MISE_DIR", &data)
            .env("MISE_ACTION_CACHE_DIR", &cache_dir)
            .arg("post")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache saved"));

        let entries: Vec<_> = fs::read_dir(&cache_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
