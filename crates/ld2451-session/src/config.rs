//! Session tuning and configuration plans.

use std::time::Duration;

use ld2451_protocol::{Command, DetectionConfig, OutputFormat, SensitivityConfig};
use serde::{Deserialize, Serialize};

// ============================================================================
// Session Configuration
// ============================================================================

/// Timing and buffering settings for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name used to prefix log lines.
    pub name: String,
    /// How long to wait for a command reply.
    pub response_timeout_ms: u64,
    /// Quiet interval the radar needs between commands.
    pub settle_delay_ms: u64,
    /// Sleep between empty reads.
    pub poll_interval_ms: u64,
    /// Maximum bytes requested per read.
    pub read_chunk: usize,
    /// Accumulator ceiling for the stream decoder.
    pub buffer_ceiling: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            name: "ld2451".to_string(),
            response_timeout_ms: 1000,
            settle_delay_ms: 300,
            poll_interval_ms: 10,
            read_chunk: 128,
            buffer_ceiling: ld2451_protocol::DEFAULT_BUFFER_CEILING,
        }
    }
}

impl SessionConfig {
    /// Parse from YAML. Missing fields take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Reply timeout.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Inter-command settling delay.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Idle poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ============================================================================
// Configuration Plan
// ============================================================================

/// A set of parameters to write in one configuration-mode visit.
///
/// ```yaml
/// detection:
///   max_distance_m: 30
///   direction_filter: both
///   min_speed_kmh: 2
///   no_target_delay_s: 1
/// sensitivity:
///   trigger_count: 2
///   snr_threshold: 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationPlan {
    /// Detection parameters to write.
    pub detection: Option<DetectionConfig>,
    /// Sensitivity parameters to write.
    pub sensitivity: Option<SensitivityConfig>,
    /// Output format to select.
    pub output_format: Option<OutputFormat>,
}

impl ConfigurationPlan {
    /// Parse from YAML.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Whether the plan writes anything.
    pub fn is_empty(&self) -> bool {
        self.detection.is_none() && self.sensitivity.is_none() && self.output_format.is_none()
    }

    /// Commands to send between entering and leaving configuration mode.
    pub fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        if let Some(detection) = self.detection {
            commands.push(Command::SetDetectionParams(detection));
        }
        if let Some(sensitivity) = self.sensitivity {
            commands.push(Command::SetSensitivityParams(sensitivity));
        }
        if let Some(format) = self.output_format {
            commands.push(Command::SetOutputFormat(format));
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ld2451_protocol::DirectionFilter;

    #[test]
    fn test_session_config_defaults_fill_missing_fields() {
        let config = SessionConfig::from_yaml("name: porch\nresponse_timeout_ms: 250\n").unwrap();
        assert_eq!(config.name, "porch");
        assert_eq!(config.response_timeout(), Duration::from_millis(250));
        assert_eq!(config.settle_delay_ms, 300);
        assert_eq!(config.read_chunk, 128);
        assert_eq!(config.buffer_ceiling, 1024);
    }

    #[test]
    fn test_plan_from_yaml() {
        let plan = ConfigurationPlan::from_yaml(
            "detection:\n  max_distance_m: 30\n  direction_filter: both\n  min_speed_kmh: 2\n  no_target_delay_s: 1\nsensitivity:\n  trigger_count: 2\n  snr_threshold: 5\n",
        )
        .unwrap();

        let detection = plan.detection.unwrap();
        assert_eq!(detection.max_distance_m, 30);
        assert_eq!(detection.direction_filter, DirectionFilter::Both);
        assert_eq!(plan.sensitivity.unwrap().snr_threshold, 5);
        assert!(plan.output_format.is_none());

        let ids: Vec<u8> = plan.commands().iter().map(|c| c.command_id()).collect();
        assert_eq!(ids, vec![0x02, 0x03]);
    }

    #[test]
    fn test_empty_plan() {
        let plan = ConfigurationPlan::from_yaml("{}").unwrap();
        assert!(plan.is_empty());
        assert!(plan.commands().is_empty());
    }
}
