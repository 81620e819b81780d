//! Model store: locating, listing and downloading model artifacts.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the classifier artifact.
pub const CLASSIFIER: &str = "classifier";
/// Name of the `BlazeFace` detector artifact.
pub const FACE_DETECTOR: &str = "face_detector";
/// Name of the face mesh artifact.
pub const FACE_LANDMARKS: &str = "face_landmarks";
/// Name of the scaler parameters artifact.
pub const SCALER: &str = "scaler";

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Filename in models directory.
    pub filename: &'static str,
    /// One-line description for listings.
    pub description: &'static str,
    /// Pinned SHA-256, if any. Unpinned artifacts are not verified.
    pub sha256: Option<&'static str>,
}

/// Known artifacts.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: CLASSIFIER,
        filename: "microsleep_classifier.onnx",
        description: "Image + EAR drowsiness classifier",
        sha256: None,
    },
    ModelInfo {
        name: FACE_DETECTOR,
        filename: "blazeface.onnx",
        description: "BlazeFace short-range face detector",
        sha256: None,
    },
    ModelInfo {
        name: FACE_LANDMARKS,
        filename: "face_landmark.onnx",
        description: "468-point face mesh",
        sha256: None,
    },
    ModelInfo {
        name: SCALER,
        filename: "ear_scaler_params.json",
        description: "EAR standard scaler parameters",
        sha256: None,
    },
];

/// Returns the default models directory path.
///
/// Uses `XDG_DATA_HOME/microsleep/models` or `~/.local/share/microsleep/models`.
#[must_use]
pub fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("microsleep")
        .join("models")
}

/// Looks up an artifact by name.
#[must_use]
pub fn model_info(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Download progress notification.
#[derive(Debug, Clone, Copy)]
pub enum FetchEvent<'a> {
    /// A download is starting.
    Started {
        /// Artifact being fetched.
        model: &'a ModelInfo,
        /// Content length, if the server reported one.
        total: Option<u64>,
    },
    /// More bytes arrived.
    Progress {
        /// Artifact being fetched.
        model: &'a ModelInfo,
        /// Bytes received so far.
        downloaded: u64,
    },
    /// The artifact was verified and written.
    Finished {
        /// Artifact fetched.
        model: &'a ModelInfo,
    },
}

/// A directory holding model artifacts.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(default_models_dir())
    }
}

impl ModelStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store's directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path to a specific model file.
    #[must_use]
    pub fn path(&self, name: &str) -> Option<PathBuf> {
        model_info(name).map(|m| self.dir.join(m.filename))
    }

    /// Returns the path to an installed artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or the file is missing.
    pub fn require(&self, name: &str) -> Result<PathBuf> {
        let path = self
            .path(name)
            .with_context(|| format!("Unknown model: {name}"))?;
        if !path.is_file() {
            bail!(
                "Model '{name}' not found at {}. Run `microsleep models fetch` to download it.",
                path.display()
            );
        }
        Ok(path)
    }

    /// Lists artifacts with their installed status.
    #[must_use]
    pub fn list(&self) -> Vec<(&'static ModelInfo, bool)> {
        MODELS
            .iter()
            .map(|m| (m, self.dir.join(m.filename).is_file()))
            .collect()
    }

    /// Checks if all artifacts are installed.
    #[must_use]
    pub fn all_installed(&self) -> bool {
        self.list().iter().all(|(_, installed)| *installed)
    }

    /// Downloads every missing artifact from `<base_url>/<filename>`.
    ///
    /// Returns the number of artifacts downloaded.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The models directory cannot be created
    /// - A download fails
    /// - A pinned checksum doesn't match
    pub fn fetch_missing(
        &self,
        base_url: &str,
        on_event: &mut dyn FnMut(FetchEvent<'_>),
    ) -> Result<usize> {
        fs::create_dir_all(&self.dir).context("Failed to create models directory")?;

        let mut fetched = 0;
        for (model, installed) in self.list() {
            if installed {
                debug!("Model {} already exists", model.name);
                continue;
            }
            let url = format!("{}/{}", base_url.trim_end_matches('/'), model.filename);
            download_model(model, &url, &self.dir.join(model.filename), on_event)?;
            fetched += 1;
        }

        Ok(fetched)
    }
}

/// Downloads a model from its URL, streaming into a temporary file that is
/// renamed into place once verified.
fn download_model(
    model: &ModelInfo,
    url: &str,
    path: &Path,
    on_event: &mut dyn FnMut(FetchEvent<'_>),
) -> Result<()> {
    info!("Downloading model: {} from {url}", model.name);

    let mut response =
        reqwest::blocking::get(url).with_context(|| format!("Failed to download {}", model.name))?;

    if !response.status().is_success() {
        bail!("Download of {} failed with status: {}", model.name, response.status());
    }

    on_event(FetchEvent::Started {
        model,
        total: response.content_length(),
    });

    let downloaded = install_from(&mut response, model, path, on_event)?;
    on_event(FetchEvent::Finished { model });

    info!("Downloaded {} ({} bytes)", model.name, downloaded);
    Ok(())
}

/// Streams `reader` into `<path>.part` and renames it to `path` once
/// verified. The partial file is removed on any failure.
fn install_from(
    reader: &mut dyn Read,
    model: &ModelInfo,
    path: &Path,
    on_event: &mut dyn FnMut(FetchEvent<'_>),
) -> Result<u64> {
    let partial = path.with_extension("part");
    let downloaded = match stream_verified(reader, model, &partial, on_event) {
        Ok(downloaded) => downloaded,
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&partial) {
                debug!("Could not remove {}: {cleanup}", partial.display());
            }
            return Err(e);
        }
    };

    fs::rename(&partial, path).with_context(|| format!("Failed to install {}", path.display()))?;
    Ok(downloaded)
}

/// Copies `reader` into `partial`, reporting progress, and checks the
/// pinned checksum. Returns the byte count. The caller owns cleanup of
/// `partial` on error.
fn stream_verified(
    reader: &mut dyn Read,
    model: &ModelInfo,
    partial: &Path,
    on_event: &mut dyn FnMut(FetchEvent<'_>),
) -> Result<u64> {
    let mut file = fs::File::create(partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0_u8; 64 * 1024];
    let mut downloaded = 0_u64;

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        downloaded += n as u64;
        on_event(FetchEvent::Progress { model, downloaded });
    }
    file.flush()?;

    let hash = format!("{:x}", hasher.finalize());
    verify_checksum(model, &hash)?;
    Ok(downloaded)
}

fn verify_checksum(model: &ModelInfo, actual: &str) -> Result<()> {
    match model.sha256 {
        Some(expected) if !expected.eq_ignore_ascii_case(actual) => bail!(
            "Checksum mismatch for {}: expected {expected}, got {actual}",
            model.name
        ),
        Some(_) => Ok(()),
        None => {
            debug!("No pinned checksum for {}, skipping verification", model.name);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_dir() {
        let dir = default_models_dir();
        assert!(dir.ends_with("microsleep/models"));
    }

    #[test]
    fn test_model_path() {
        let store = ModelStore::new("/models");
        let path = store.path(CLASSIFIER).unwrap();
        assert_eq!(path, PathBuf::from("/models/microsleep_classifier.onnx"));
        assert!(store.path("unknown").is_none());
    }

    #[test]
    fn test_require_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let err = store.require(SCALER).unwrap_err();
        assert!(err.to_string().contains("ear_scaler_params.json"));
        assert!(store.require("unknown").is_err());
    }

    #[test]
    fn test_list_reports_installed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blazeface.onnx"), b"stub").unwrap();
        let store = ModelStore::new(dir.path());

        let listed = store.list();
        assert_eq!(listed.len(), MODELS.len());
        for (model, installed) in listed {
            assert_eq!(installed, model.name == FACE_DETECTOR, "{}", model.name);
        }
        assert!(!store.all_installed());
        assert!(store.require(FACE_DETECTOR).is_ok());
    }

    #[test]
    fn test_verify_checksum() {
        let pinned = ModelInfo {
            name: "x",
            filename: "x.onnx",
            description: "",
            sha256: Some("ABCDEF"),
        };
        assert!(verify_checksum(&pinned, "abcdef").is_ok());
        assert!(verify_checksum(&pinned, "000000").is_err());

        let unpinned = ModelInfo {
            sha256: None,
            ..pinned
        };
        assert!(verify_checksum(&unpinned, "anything").is_ok());
    }

    /// Yields `chunks` then fails.
    struct BrokenStream {
        chunks: Vec<Vec<u8>>,
    }

    impl Read for BrokenStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.chunks.pop() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                )),
            }
        }
    }

    fn unpinned() -> ModelInfo {
        ModelInfo {
            name: "mesh",
            filename: "mesh.onnx",
            description: "",
            sha256: None,
        }
    }

    #[test]
    fn test_install_writes_file_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("mesh.onnx");
        let mut progress = Vec::new();

        let written = install_from(&mut &b"weights"[..], &unpinned(), &target, &mut |event| {
            if let FetchEvent::Progress { downloaded, .. } = event {
                progress.push(downloaded);
            }
        })
        .unwrap();

        assert_eq!(written, 7);
        assert_eq!(progress, vec![7]);
        assert_eq!(fs::read(&target).unwrap(), b"weights");
        assert!(!dir.path().join("mesh.part").exists());
    }

    #[test]
    fn test_install_read_error_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("mesh.onnx");
        let mut stream = BrokenStream {
            chunks: vec![b"partial".to_vec()],
        };

        let err = install_from(&mut stream, &unpinned(), &target, &mut |_| {}).unwrap_err();

        assert!(format!("{err:#}").contains("connection reset"));
        assert!(!dir.path().join("mesh.part").exists());
        assert!(!target.exists());
    }

    #[test]
    fn test_install_checksum_mismatch_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("mesh.onnx");
        let pinned = ModelInfo {
            sha256: Some("0000"),
            ..unpinned()
        };

        let err = install_from(&mut &b"weights"[..], &pinned, &target, &mut |_| {}).unwrap_err();

        assert!(err.to_string().contains("Checksum mismatch"));
        assert!(!dir.path().join("mesh.part").exists());
        assert!(!target.exists());
    }

    #[test]
    fn test_fetch_with_everything_installed_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        for model in MODELS {
            fs::write(dir.path().join(model.filename), b"stub").unwrap();
        }
        let store = ModelStore::new(dir.path());
        let fetched = store
            .fetch_missing("http://127.0.0.1:9", &mut |_| {})
            .unwrap();
        assert_eq!(fetched, 0);
    }
}
