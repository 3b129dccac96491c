use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One step of a structured-illumination sequence: the physical parameters
/// the pattern at the same position realizes on the modulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub angle: f64,
    pub phase: f64,
    pub wavelength: f64,
}

impl SequenceEntry {
    pub fn new(angle: f64, phase: f64, wavelength: f64) -> Self {
        Self {
            angle,
            phase,
            wavelength,
        }
    }
}

/// A displayable pattern handle. Immutable value, cheap to clone, safe to
/// hand across threads to the display sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub position: usize,
    pub path: PathBuf,
}

/// Trigger vocabulary of the generic triggerable-device protocol. This
/// device accepts exactly the `(Software, Once)` pair; the other variants
/// exist so a request for them can be rejected with a typed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Software,
    RisingEdge,
    FallingEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    Once,
    Bulb,
    Strobe,
    Start,
}
