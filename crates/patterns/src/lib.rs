//! Filesystem-backed pattern provisioning.
//!
//! Patterns are plain image files in one directory. The default catalog is
//! the directory listing; sequence-specific patterns are materialized on
//! demand by copying a template image to a canonical file name derived from
//! the physical parameters.

use std::{
    fs,
    path::{Path, PathBuf},
};

use shared::{domain::SequenceEntry, error::SlmError};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PatternStore {
    root: PathBuf,
    template: PathBuf,
}

impl PatternStore {
    /// Opens the patterns directory. The template is only required once a
    /// pattern actually has to be materialized.
    pub fn open(root: impl Into<PathBuf>, template: impl Into<PathBuf>) -> Result<Self, SlmError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SlmError::provisioning(format!(
                "patterns directory '{}' does not exist",
                root.display()
            )));
        }
        Ok(Self {
            root,
            template: template.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists every regular file in the patterns directory, sorted by file
    /// name so positions are assigned deterministically across platforms.
    pub fn list(&self) -> Result<Vec<PathBuf>, SlmError> {
        let read_dir = fs::read_dir(&self.root).map_err(|e| {
            SlmError::provisioning(format!(
                "cannot read patterns directory '{}': {e}",
                self.root.display()
            ))
        })?;

        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| {
                SlmError::provisioning(format!(
                    "cannot read patterns directory '{}': {e}",
                    self.root.display()
                ))
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Canonical file name for a parameter triple, e.g.
    /// `angle60_phase0_nm450.jpg`.
    pub fn file_name(entry: &SequenceEntry) -> String {
        format!(
            "angle{}_phase{}_nm{}.jpg",
            fmt_param(entry.angle),
            fmt_param(entry.phase),
            fmt_param(entry.wavelength)
        )
    }

    pub fn path_for(&self, entry: &SequenceEntry) -> PathBuf {
        self.root.join(Self::file_name(entry))
    }

    /// Returns the pattern file for `entry`, copying it from the template if
    /// it does not exist yet. Idempotent: an existing target is left alone.
    pub fn ensure(&self, entry: &SequenceEntry) -> Result<PathBuf, SlmError> {
        let dest = self.path_for(entry);
        if dest.is_file() {
            return Ok(dest);
        }
        if !self.template.is_file() {
            return Err(SlmError::provisioning(format!(
                "template pattern '{}' is missing, cannot materialize '{}'",
                self.template.display(),
                dest.display()
            )));
        }
        fs::copy(&self.template, &dest).map_err(|e| {
            SlmError::provisioning(format!(
                "cannot copy template to '{}': {e}",
                dest.display()
            ))
        })?;
        debug!(path = %dest.display(), "materialized pattern from template");
        Ok(dest)
    }
}

fn fmt_param(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
