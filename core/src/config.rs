use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_IPS, FRAMES_PER_SECOND};
use crate::error::ConfigError;

/// # Quirks
/// Historical CHIP-8 interpreters disagree on a handful of behaviors.
/// Each flag selects one side of such a disagreement.
///
/// - `display_wait` only one DXYN may execute per frame, and only as the first
///   instruction of that frame (COSMAC VIP vblank wait)
/// - `wrapping` sprites wrap around the screen edges instead of being clipped
/// - `logic` 8XY1, 8XY2 and 8XY3 reset VF to 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quirks {
    pub display_wait: bool,
    pub wrapping: bool,
    pub logic: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            display_wait: false,
            wrapping: false,
            logic: true,
        }
    }
}

/// What to do when a program calls with a full call stack or returns with an empty one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackPolicy {
    /// Ignore the instruction and log a warning
    Lenient,
    /// Stop execution with an `ExecError`
    Strict,
}

impl Default for StackPolicy {
    fn default() -> Self {
        StackPolicy::Lenient
    }
}

/// Everything the machine needs to know about how it should run a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Instructions per second
    pub ips: u32,
    pub quirks: Quirks,
    pub stack_policy: StackPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ips: DEFAULT_IPS,
            quirks: Quirks::default(),
            stack_policy: StackPolicy::default(),
        }
    }
}

impl Config {
    /// A valid configuration runs at least one instruction per frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ips < FRAMES_PER_SECOND {
            return Err(ConfigError::IpsTooLow(self.ips));
        }
        Ok(())
    }

    /// Number of instructions executed every frame.
    pub fn instructions_per_frame(&self) -> u32 {
        self.ips / FRAMES_PER_SECOND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cosmac_logic_quirk() {
        let config = Config::default();
        assert_eq!(config.ips, 700);
        assert!(config.quirks.logic);
        assert!(!config.quirks.wrapping);
        assert!(!config.quirks.display_wait);
        assert_eq!(config.stack_policy, StackPolicy::Lenient);
    }

    #[test]
    fn test_instructions_per_frame_rounds_down() {
        let config = Config {
            ips: 700,
            ..Config::default()
        };
        assert_eq!(config.instructions_per_frame(), 11);
    }

    #[test]
    fn test_validate_rejects_less_than_one_instruction_per_frame() {
        let config = Config {
            ips: 59,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::IpsTooLow(59)));
    }

    #[test]
    fn test_validate_accepts_one_instruction_per_frame() {
        let config = Config {
            ips: 60,
            ..Config::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }
}
