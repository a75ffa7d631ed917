//! Local alert presentation
//!
//! Tone, vibration, and platform-notification parameters are a pure
//! function of priority. Presentation is strictly best-effort: failures
//! are logged by the dispatcher and never block counter or list updates.

use tracing::info;

use crate::db::schemas::{NotificationRecord, Priority};
use crate::types::Result;

/// Amplitude the tone decays to by the end of its duration
pub const AMPLITUDE_FLOOR: f32 = 0.01;

/// Alert tone parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TonePlan {
    pub frequency_hz: f32,
    pub duration_secs: f32,
    /// Starting gain
    pub volume: f32,
}

impl TonePlan {
    /// Tone amplitude at `elapsed_secs`, decaying exponentially from the
    /// starting volume to [`AMPLITUDE_FLOOR`] over the duration.
    pub fn amplitude_at(&self, elapsed_secs: f32) -> f32 {
        let progress = (elapsed_secs / self.duration_secs).clamp(0.0, 1.0);
        self.volume * (AMPLITUDE_FLOOR / self.volume).powf(progress)
    }
}

/// Full presentation plan for one notification
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPlan {
    pub tone: TonePlan,
    /// Vibration pattern in milliseconds (on/off alternating)
    pub vibration_ms: &'static [u64],
    /// Platform notification auto-dismiss delay in seconds
    pub auto_dismiss_secs: u64,
    /// Whether the platform notification stays until interacted with
    pub require_interaction: bool,
}

const VIBRATION_STANDARD: &[u64] = &[200, 100, 200];
const VIBRATION_URGENT: &[u64] = &[300, 100, 300, 100, 300];

/// Presentation parameters for a priority
pub fn plan_for(priority: Priority) -> AlertPlan {
    match priority {
        Priority::Low => AlertPlan {
            tone: TonePlan {
                frequency_hz: 400.0,
                duration_secs: 0.5,
                volume: 0.1,
            },
            vibration_ms: VIBRATION_STANDARD,
            auto_dismiss_secs: 5,
            require_interaction: false,
        },
        Priority::Medium => AlertPlan {
            tone: TonePlan {
                frequency_hz: 600.0,
                duration_secs: 0.5,
                volume: 0.2,
            },
            vibration_ms: VIBRATION_STANDARD,
            auto_dismiss_secs: 5,
            require_interaction: false,
        },
        Priority::High => AlertPlan {
            tone: TonePlan {
                frequency_hz: 800.0,
                duration_secs: 1.0,
                volume: 0.3,
            },
            vibration_ms: VIBRATION_URGENT,
            auto_dismiss_secs: 10,
            require_interaction: true,
        },
    }
}

/// Renders a notification locally (tone, vibration, platform surface)
pub trait AlertPresenter: Send + Sync {
    fn present(&self, record: &NotificationRecord, plan: &AlertPlan) -> Result<()>;
}

/// Presenter that writes deliveries to the log. Used for local sessions
/// without an audio/notification surface.
pub struct LogPresenter;

impl AlertPresenter for LogPresenter {
    fn present(&self, record: &NotificationRecord, plan: &AlertPlan) -> Result<()> {
        info!(
            id = %record.id,
            priority = record.priority.as_str(),
            tone_hz = plan.tone.frequency_hz,
            dismiss_secs = plan.auto_dismiss_secs,
            "{}: {}",
            record.title,
            record.body
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_parameters_ordered_by_priority_rank() {
        let low = plan_for(Priority::Low);
        let medium = plan_for(Priority::Medium);
        let high = plan_for(Priority::High);

        assert!(low.tone.frequency_hz < medium.tone.frequency_hz);
        assert!(medium.tone.frequency_hz < high.tone.frequency_hz);

        assert!(high.tone.duration_secs > medium.tone.duration_secs);
        assert_eq!(medium.tone.duration_secs, low.tone.duration_secs);

        assert!(low.tone.volume < medium.tone.volume);
        assert!(medium.tone.volume < high.tone.volume);
    }

    #[test]
    fn test_vibration_and_dismiss_by_priority() {
        assert_eq!(plan_for(Priority::Low).vibration_ms, &[200, 100, 200]);
        assert_eq!(plan_for(Priority::Medium).vibration_ms, &[200, 100, 200]);
        assert_eq!(
            plan_for(Priority::High).vibration_ms,
            &[300, 100, 300, 100, 300]
        );

        assert_eq!(plan_for(Priority::Low).auto_dismiss_secs, 5);
        assert_eq!(plan_for(Priority::High).auto_dismiss_secs, 10);
        assert!(plan_for(Priority::High).require_interaction);
        assert!(!plan_for(Priority::Medium).require_interaction);
    }

    #[test]
    fn test_amplitude_decays_to_floor() {
        let tone = plan_for(Priority::High).tone;

        assert!((tone.amplitude_at(0.0) - tone.volume).abs() < 1e-6);
        assert!((tone.amplitude_at(tone.duration_secs) - AMPLITUDE_FLOOR).abs() < 1e-6);
        // Clamped past the end
        assert!((tone.amplitude_at(10.0) - AMPLITUDE_FLOOR).abs() < 1e-6);
    }

    #[test]
    fn test_amplitude_strictly_decreasing() {
        let tone = plan_for(Priority::Medium).tone;
        let mut prev = tone.amplitude_at(0.0);
        for step in 1..=10 {
            let t = tone.duration_secs * step as f32 / 10.0;
            let amp = tone.amplitude_at(t);
            assert!(amp < prev, "amplitude not decreasing at t={}", t);
            prev = amp;
        }
    }
}
