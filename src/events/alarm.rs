//! Facility-wide alarm flag

use crate::core::types::ListenerId;

use super::{AiEvent, EventListener};

/// Global alarm, latched by the first sighting
///
/// Monotonic: there is no reset path. A level restart builds a fresh
/// simulation context, and with it a fresh alarm.
#[derive(Debug)]
pub struct AlarmCoordinator {
    listener: ListenerId,
    alarmed: bool,
}

impl AlarmCoordinator {
    pub fn new() -> Self {
        Self {
            listener: ListenerId::new(),
            alarmed: false,
        }
    }

    /// Latch the alarm; raising an already-raised alarm is a no-op
    pub fn raise_alarm(&mut self) {
        if !self.alarmed {
            self.alarmed = true;
            tracing::info!("facility alarm raised");
        }
    }

    pub fn is_alarmed(&self) -> bool {
        self.alarmed
    }
}

impl Default for AlarmCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl EventListener for AlarmCoordinator {
    fn listener_id(&self) -> ListenerId {
        self.listener
    }

    fn on_event(&mut self, event: &AiEvent) -> Vec<AiEvent> {
        if let AiEvent::Spotted { .. } = event {
            self.raise_alarm();
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GuardId;
    use glam::Vec3;

    #[test]
    fn test_alarm_starts_clear() {
        assert!(!AlarmCoordinator::new().is_alarmed());
    }

    #[test]
    fn test_spotted_raises_alarm() {
        let mut alarm = AlarmCoordinator::new();
        let event = AiEvent::Spotted {
            observer: GuardId::new(),
            position: Vec3::ZERO,
        };
        alarm.on_event(&event);
        assert!(alarm.is_alarmed());
    }

    #[test]
    fn test_raise_is_idempotent() {
        let mut alarm = AlarmCoordinator::new();
        alarm.raise_alarm();
        alarm.raise_alarm();
        assert!(alarm.is_alarmed());
    }

    #[test]
    fn test_noise_does_not_raise_alarm() {
        let mut alarm = AlarmCoordinator::new();
        alarm.on_event(&AiEvent::Noise {
            position: Vec3::ZERO,
            radius: 6.0,
        });
        assert!(!alarm.is_alarmed());
    }
}
