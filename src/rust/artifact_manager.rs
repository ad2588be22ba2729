use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid manifest: {0}")]
    InvalidManifest(#[from] serde_json::Error),
    #[error("No manifest found at {0}")]
    NoManifest(PathBuf),
    #[error("Artifact '{0}' is missing or corrupt and the manifest gives no URL for it")]
    NoSource(String),
    #[error("Download of {file} failed with HTTP status {status}")]
    BadStatus { file: String, status: u16 },
    #[error("Manifest entry '{0}' must be a relative path inside the artifact directory")]
    UnsafeEntry(String),
    #[error("Artifact verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

/// Where one artifact file comes from and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    pub sha256: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Artifact files keyed by file name, relative to the artifact directory.
pub type Manifest = BTreeMap<String, ManifestEntry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Verified,
    Missing,
    Corrupt,
}

/// Locates, verifies and fetches the artifact files.
#[derive(Clone, Debug)]
pub struct ArtifactManager {
    artifacts_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ArtifactManager {
    /// Returns the default artifacts directory path
    pub fn get_default_artifacts_dir() -> PathBuf {
        if let Ok(path) = env::var("PERSONA_ARTIFACTS") {
            return PathBuf::from(path);
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("persona-predict").join("artifacts");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("persona-predict").join("artifacts");
        }

        env::temp_dir().join("persona-predict").join("artifacts")
    }

    /// Opens `artifacts_dir`, creating it if needed.
    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> io::Result<Self> {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self::with_dir(artifacts_dir))
    }

    /// Opens an existing `artifacts_dir` without touching the filesystem.
    ///
    /// # Errors
    /// - `NotFound` if the directory does not exist
    pub fn open<P: AsRef<Path>>(artifacts_dir: P) -> io::Result<Self> {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        if !artifacts_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Artifact directory not found: {}", artifacts_dir.display()),
            ));
        }
        Ok(Self::with_dir(artifacts_dir))
    }

    fn with_dir(artifacts_dir: PathBuf) -> Self {
        Self {
            artifacts_dir,
            download_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn artifact_path(&self, file: &str) -> PathBuf {
        self.artifacts_dir.join(file)
    }

    /// Reads `manifest.json`, or returns `None` if the directory has none.
    ///
    /// # Errors
    /// - `UnsafeEntry` if a key is absolute, climbs out with `..`, or names the manifest
    pub fn load_manifest(&self) -> Result<Option<Manifest>, ArtifactError> {
        let path = self.artifact_path(MANIFEST_FILE);
        if !path.exists() {
            log::info!("No manifest at {:?}", path);
            return Ok(None);
        }
        let manifest: Manifest = serde_json::from_str(&fs::read_to_string(&path)?)?;
        if let Some(file) = manifest.keys().find(|file| !Self::is_safe_entry(file)) {
            log::error!("Rejecting manifest entry {:?}", file);
            return Err(ArtifactError::UnsafeEntry(file.clone()));
        }
        log::info!("Manifest lists {} artifacts", manifest.len());
        Ok(Some(manifest))
    }

    /// Entries are downloaded to and removed from `artifacts_dir/<key>`, so a key
    /// may only hold plain path components.
    fn is_safe_entry(file: &str) -> bool {
        let path = Path::new(file);
        file != MANIFEST_FILE
            && path.components().next().is_some()
            && path.components().all(|c| matches!(c, Component::Normal(_)))
    }

    fn require_manifest(&self) -> Result<Manifest, ArtifactError> {
        self.load_manifest()?
            .ok_or_else(|| ArtifactError::NoManifest(self.artifact_path(MANIFEST_FILE)))
    }

    fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ArtifactError> {
        let bytes = fs::read(path)?;
        let hash = Self::hash_bytes(&bytes);
        log::debug!("{:?}: {} bytes, sha256 {} (expected {})", path, bytes.len(), hash, expected_hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash))
    }

    fn file_status(&self, file: &str, entry: &ManifestEntry) -> Result<FileStatus, ArtifactError> {
        let path = self.artifact_path(file);
        if !path.exists() {
            return Ok(FileStatus::Missing);
        }
        if self.verify_file(&path, &entry.sha256)? {
            Ok(FileStatus::Verified)
        } else {
            Ok(FileStatus::Corrupt)
        }
    }

    /// Checks every file the manifest lists.
    ///
    /// Without a manifest there is nothing to check and the result is empty.
    pub fn verify_artifacts(&self) -> Result<Vec<(String, FileStatus)>, ArtifactError> {
        let Some(manifest) = self.load_manifest()? else {
            return Ok(Vec::new());
        };

        let mut statuses = Vec::with_capacity(manifest.len());
        for (file, entry) in &manifest {
            let status = self.file_status(file, entry)?;
            log::info!("  {}: {:?}", file, status);
            statuses.push((file.clone(), status));
        }
        Ok(statuses)
    }

    /// Returns true when a manifest exists and every listed file verifies.
    pub fn is_verified(&self) -> Result<bool, ArtifactError> {
        if self.load_manifest()?.is_none() {
            return Ok(false);
        }
        Ok(self
            .verify_artifacts()?
            .iter()
            .all(|(_, status)| *status == FileStatus::Verified))
    }

    /// Downloads every listed file that is missing or fails verification.
    pub async fn download_artifacts(&self) -> Result<(), ArtifactError> {
        let manifest = self.require_manifest()?;
        let _lock = self.download_lock.lock().await;

        for (file, entry) in &manifest {
            match self.file_status(file, entry)? {
                FileStatus::Verified => {
                    log::info!("Existing {} verified successfully", file);
                }
                status => {
                    log::warn!("{} is {:?}, downloading", file, status);
                    let url = entry
                        .url
                        .as_deref()
                        .ok_or_else(|| ArtifactError::NoSource(file.clone()))?;
                    self.download_and_verify_file(url, file, &entry.sha256).await?;
                }
            }
        }
        log::info!("All artifacts ready to use");
        Ok(())
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        file: &str,
        expected_hash: &str,
    ) -> Result<(), ArtifactError> {
        let path = self.artifact_path(file);
        log::info!("Downloading {} from {} to {:?}", file, url, path);
        let response = reqwest::get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArtifactError::BadStatus {
                file: file.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let hash = Self::hash_bytes(&bytes);
        if !hash.eq_ignore_ascii_case(expected_hash) {
            log::error!("{} hash mismatch: expected {}, got {}", file, expected_hash, hash);
            return Err(ArtifactError::HashMismatch {
                file: file.to_string(),
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &bytes)?;

        if !self.verify_file(&path, expected_hash)? {
            return Err(ArtifactError::VerificationFailed);
        }
        log::info!("{} downloaded and verified successfully", file);
        Ok(())
    }

    /// Deletes every listed file, keeping the manifest itself.
    pub fn remove_downloads(&self) -> Result<(), ArtifactError> {
        let manifest = self.require_manifest()?;
        for file in manifest.keys() {
            let path = self.artifact_path(file);
            if path.exists() {
                log::info!("Removing {:?}", path);
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures that every listed artifact is present and verified,
    /// downloading the ones that are not.
    pub async fn ensure_artifacts(&self) -> Result<(), ArtifactError> {
        if self.is_verified()? {
            log::info!("Artifact verification successful");
            return Ok(());
        }
        self.download_artifacts().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(manager: &ArtifactManager, body: &str) {
        fs::write(manager.artifact_path(MANIFEST_FILE), body).unwrap();
    }

    #[test]
    fn test_verify_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();

        fs::write(manager.artifact_path("scaler.json"), b"{}").unwrap();
        fs::write(manager.artifact_path("target_encoder.json"), b"tampered").unwrap();
        let good = ArtifactManager::hash_bytes(b"{}");
        write_manifest(
            &manager,
            &format!(
                r#"{{
                    "scaler.json": {{"sha256": "{good}"}},
                    "target_encoder.json": {{"sha256": "{good}"}},
                    "svm_model.json": {{"sha256": "{good}"}}
                }}"#
            ),
        );

        let statuses = manager.verify_artifacts().unwrap();
        assert_eq!(
            statuses,
            vec![
                ("scaler.json".to_string(), FileStatus::Verified),
                ("svm_model.json".to_string(), FileStatus::Missing),
                ("target_encoder.json".to_string(), FileStatus::Corrupt),
            ]
        );
        assert!(!manager.is_verified().unwrap());
    }

    #[test]
    fn test_no_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        assert!(manager.load_manifest().unwrap().is_none());
        assert!(manager.verify_artifacts().unwrap().is_empty());
        assert!(!manager.is_verified().unwrap());
        assert!(matches!(manager.remove_downloads(), Err(ArtifactError::NoManifest(_))));
    }

    #[test]
    fn test_remove_downloads_keeps_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        fs::write(manager.artifact_path("scaler.json"), b"{}").unwrap();
        write_manifest(&manager, r#"{"scaler.json": {"sha256": "00"}}"#);

        manager.remove_downloads().unwrap();
        assert!(!manager.artifact_path("scaler.json").exists());
        assert!(manager.artifact_path(MANIFEST_FILE).exists());
    }

    #[tokio::test]
    async fn test_download_without_url() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        write_manifest(&manager, r#"{"svm_model.json": {"sha256": "00"}}"#);

        let err = manager.ensure_artifacts().await.unwrap_err();
        assert!(matches!(err, ArtifactError::NoSource(ref f) if f == "svm_model.json"));
    }

    #[tokio::test]
    async fn test_ensure_with_verified_files_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        fs::write(manager.artifact_path("scaler.json"), b"{}").unwrap();
        write_manifest(
            &manager,
            &format!(
                r#"{{"scaler.json": {{"sha256": "{}", "url": "http://127.0.0.1:9/scaler.json"}}}}"#,
                ArtifactManager::hash_bytes(b"{}")
            ),
        );
        assert!(manager.ensure_artifacts().await.is_ok());
    }

    #[test]
    fn test_malformed_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        write_manifest(&manager, "[1, 2, 3]");
        assert!(matches!(manager.load_manifest(), Err(ArtifactError::InvalidManifest(_))));
    }

    #[test]
    fn test_unsafe_manifest_entries_rejected() {
        let parent = tempfile::tempdir().unwrap();
        let outside = parent.path().join("outside.txt");
        fs::write(&outside, b"keep me").unwrap();
        let manager = ArtifactManager::new(parent.path().join("artifacts")).unwrap();

        for key in ["../outside.txt", "/etc/passwd", "models/../../outside.txt", "", "manifest.json"] {
            write_manifest(&manager, &format!(r#"{{"{}": {{"sha256": "00"}}}}"#, key));
            let err = manager.load_manifest().unwrap_err();
            assert!(matches!(err, ArtifactError::UnsafeEntry(ref f) if f == key), "accepted {:?}", key);
            assert!(manager.remove_downloads().is_err());
        }
        assert_eq!(fs::read(&outside).unwrap(), b"keep me");

        // Nested relative paths stay inside the directory
        write_manifest(&manager, r#"{"models/svm_model.json": {"sha256": "00"}}"#);
        assert_eq!(manager.load_manifest().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_open_does_not_create_directory() {
        let parent = tempfile::tempdir().unwrap();
        let missing = parent.path().join("never-created");
        let err = ArtifactManager::open(&missing).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!missing.exists());

        ArtifactManager::new(&missing).unwrap();
        let manager = ArtifactManager::open(&missing).unwrap();
        assert_eq!(manager.artifacts_dir(), missing.as_path());
    }

    #[test]
    fn test_default_artifacts_dir() {
        env::set_var("PERSONA_ARTIFACTS", "/tmp/test-persona");
        let path = ArtifactManager::get_default_artifacts_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-persona"));
        env::remove_var("PERSONA_ARTIFACTS");

        let path = ArtifactManager::get_default_artifacts_dir();
        assert!(path.to_str().unwrap().contains("persona-predict"));
    }
}
