//! Wheel archive assembly.
//!
//! Streams already-built artifact files plus the generated WHEEL, METADATA,
//! and RECORD members into a single zip container, in that order, because
//! the RECORD must account for every member written before it. Construction
//! is atomic: a drop guard removes the partially written archive on every
//! error path, so a failed build leaves no file behind.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::metadata::{MetadataRecord, WheelRecord};
use crate::record::{Record, RecordEntry};
use crate::tag::{CompatTag, InterpreterEnv, TagError};

/// Errors raised while assembling a wheel archive.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Tag resolution failed; the archive cannot be named or stamped.
    #[error("tag resolution failed: {0}")]
    Tag(#[from] TagError),

    /// The version string was empty.
    #[error("version must be a non-empty string")]
    EmptyVersion,

    /// An artifact path did not live under the configured source root.
    #[error("artifact path '{path}' is not under source root '{root}'")]
    InvalidArtifactPath {
        /// The offending input path.
        path: String,
        /// The source root every artifact must be under.
        root: String,
    },

    /// Two members resolved to the same archive path.
    #[error("duplicate archive member: {0}")]
    DuplicateMember(String),

    /// A filesystem read or write failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip stream rejected a write.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Static configuration for a wheel build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Distribution name used in the filename and metadata records.
    pub package: String,
    /// Prefix every artifact path must carry; stripped to form archive paths.
    pub source_root: PathBuf,
    /// Directory the finished archive is written into.
    pub dist_dir: PathBuf,
    /// SPDX license identifier for the METADATA record.
    pub license: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            package: "coho".to_string(),
            source_root: PathBuf::from("py"),
            dist_dir: PathBuf::from("py/dist"),
            license: "ISC".to_string(),
        }
    }
}

/// Assembles one wheel archive per [`build`](Self::build) call.
///
/// The interpreter environment is injected rather than probed here, so the
/// builder itself performs no ambient introspection.
#[derive(Debug)]
pub struct WheelBuilder {
    config: BuildConfig,
    env: InterpreterEnv,
}

impl WheelBuilder {
    /// Create a builder for the given configuration and probed environment.
    pub fn new(config: BuildConfig, env: InterpreterEnv) -> Self {
        Self { config, env }
    }

    /// Build the archive for `version` from the given artifact files.
    ///
    /// Artifacts are archived in the given order, followed by the generated
    /// `WHEEL`, `METADATA`, and `RECORD` members. An existing archive at
    /// the target path is overwritten. Returns the path of the finished
    /// archive.
    ///
    /// # Errors
    ///
    /// Fails on an empty version, an artifact outside the source root, a
    /// duplicate member path, tag resolution failure, or any I/O or zip
    /// error. Input validation happens before the archive file is created;
    /// once it exists, every failure path removes it again, so the target
    /// path never holds a partial archive.
    pub fn build(&self, version: &str, artifacts: &[PathBuf]) -> Result<PathBuf, BuildError> {
        if version.is_empty() {
            return Err(BuildError::EmptyVersion);
        }

        let dist_info = format!("{}-{version}.dist-info", self.config.package);
        let members = self.relative_paths(artifacts, &dist_info)?;

        let tag = CompatTag::resolve(&self.env)?;
        let wheel_path = self
            .config
            .dist_dir
            .join(format!("{}-{version}-{tag}.whl", self.config.package));

        debug!(
            "building {} from {} artifacts",
            wheel_path.display(),
            members.len()
        );

        let file = File::create(&wheel_path)?;
        let mut cleanup = CleanupGuard::new(wheel_path.clone());
        self.write_archive(file, version, &tag, &dist_info, &members)?;
        cleanup.disarm();

        info!("built {}", wheel_path.display());
        Ok(wheel_path)
    }

    /// Map artifact paths to archive-relative member paths.
    ///
    /// Rejects any path outside the source root and any duplicate member,
    /// including collisions with the reserved dist-info members.
    fn relative_paths(
        &self,
        artifacts: &[PathBuf],
        dist_info: &str,
    ) -> Result<Vec<(PathBuf, String)>, BuildError> {
        let mut seen: HashSet<String> = ["WHEEL", "METADATA", "RECORD"]
            .iter()
            .map(|name| format!("{dist_info}/{name}"))
            .collect();

        let mut members = Vec::with_capacity(artifacts.len());
        for path in artifacts {
            let rel = path
                .strip_prefix(&self.config.source_root)
                .ok()
                .filter(|rel| !rel.as_os_str().is_empty())
                .ok_or_else(|| BuildError::InvalidArtifactPath {
                    path: path.display().to_string(),
                    root: self.config.source_root.display().to_string(),
                })?;

            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if !seen.insert(name.clone()) {
                return Err(BuildError::DuplicateMember(name));
            }
            members.push((path.clone(), name));
        }
        Ok(members)
    }

    /// Write every member and the manifest into the open archive.
    fn write_archive(
        &self,
        file: File,
        version: &str,
        tag: &CompatTag,
        dist_info: &str,
        members: &[(PathBuf, String)],
    ) -> Result<(), BuildError> {
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut record = Record::default();

        for (path, name) in members {
            let data = fs::read(path)?;
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&data)?;
            record.push(RecordEntry::hashed(name.as_str(), &data));
            debug!("added {} ({} bytes)", name, data.len());
        }

        let wheel = WheelRecord {
            generator: &self.config.package,
            version,
            tag: &tag.to_string(),
        }
        .render();
        let name = format!("{dist_info}/WHEEL");
        zip.start_file(name.as_str(), options)?;
        zip.write_all(wheel.as_bytes())?;
        record.push(RecordEntry::hashed(name, wheel.as_bytes()));

        let metadata = MetadataRecord {
            name: &self.config.package,
            version,
            license: &self.config.license,
        }
        .render();
        let name = format!("{dist_info}/METADATA");
        zip.start_file(name.as_str(), options)?;
        zip.write_all(metadata.as_bytes())?;
        record.push(RecordEntry::hashed(name, metadata.as_bytes()));

        // Self-row goes in before serialization so the manifest lists itself
        // last, unhashed.
        let name = format!("{dist_info}/RECORD");
        record.push(RecordEntry::self_row(name.as_str()));
        zip.start_file(name.as_str(), options)?;
        zip.write_all(record.serialize().as_bytes())?;

        zip.finish()?;
        Ok(())
    }
}

/// Removes the archive at `path` on drop unless disarmed.
///
/// Disarmed only after the zip stream has finished, so every failure path
/// deletes the partial file before the error reaches the caller.
#[derive(Debug)]
struct CleanupGuard {
    path: PathBuf,
    armed: bool,
}

impl CleanupGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if self.armed {
            // Best effort: the original error matters more than the cleanup.
            let _ = fs::remove_file(&self.path);
        }
    }
}
