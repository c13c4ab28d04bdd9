//! Device vibration facility

use thiserror::Error;
use tracing::debug;

/// Intermittent alarm pattern: alternating off/on durations in milliseconds
pub const ALARM_PATTERN_MS: [u64; 5] = [500, 500, 500, 500, 500];

#[derive(Error, Debug)]
pub enum VibrationError {
    #[error("Vibration is not supported on this device")]
    Unsupported,
    #[error("Vibration request failed: {0}")]
    Failed(String),
}

/// Platform vibration motor.
///
/// Both calls return immediately; the pattern plays out on the device.
pub trait Vibrator: Send + Sync {
    fn vibrate(&self, pattern: &[u64]) -> Result<(), VibrationError>;

    fn cancel(&self) -> Result<(), VibrationError>;
}

/// Vibrator for hosts without a motor, such as desktops and servers
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVibrator;

impl Vibrator for NoVibrator {
    fn vibrate(&self, pattern: &[u64]) -> Result<(), VibrationError> {
        debug!("Vibration pattern {:?} requested without a motor", pattern);
        Err(VibrationError::Unsupported)
    }

    fn cancel(&self) -> Result<(), VibrationError> {
        Err(VibrationError::Unsupported)
    }
}
