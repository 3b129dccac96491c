use std::sync::Mutex;

use tracing::info;

/// Secondary rotator device. The hardware link is a single set-voltage
/// command; this remembers the last commanded value and nothing else.
#[derive(Debug, Default)]
pub struct Rotator {
    voltage: Mutex<f64>,
}

impl Rotator {
    pub fn set_voltage(&self, voltage: f64) {
        info!(voltage, "rotator voltage set");
        *self.voltage.lock().expect("rotator lock poisoned") = voltage;
    }

    pub fn voltage(&self) -> f64 {
        *self.voltage.lock().expect("rotator lock poisoned")
    }
}
