use serde::{Deserialize, Serialize};

use crate::domain::{SequenceEntry, TriggerMode, TriggerType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSequenceRequest {
    pub entries: Vec<SequenceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSequenceResponse {
    pub len: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionResponse {
    pub position: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JumpRequest {
    pub position: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AngleResponse {
    pub angle: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetAngleRequest {
    pub angle: f64,
}

/// Position reached after resolving an angle back to a sequence position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetAngleResponse {
    pub position: usize,
    pub angle: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriggerConfigRequest {
    pub trigger_type: TriggerType,
    pub trigger_mode: TriggerMode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriggerTypeResponse {
    pub trigger_type: TriggerType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriggerModeResponse {
    pub trigger_mode: TriggerMode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RotatorVoltageRequest {
    pub voltage: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RotatorVoltageResponse {
    pub voltage: f64,
}
