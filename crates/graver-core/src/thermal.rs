#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThermalState {
    #[default]
    Active,
    Cooling,
}

/// Cumulative on-time budget for the solenoid coil.
///
/// The budget is checked only after a stroke has been accounted, so it can
/// be overrun by at most one pulse before cooling is requested.
#[derive(Debug, Clone)]
pub struct ThermalGuard {
    state: ThermalState,
    cumulative_on_time_ms: u64,
    max_cumulative_on_time_ms: u64,
    peak_on_time_ms: u64,
}

impl ThermalGuard {
    pub fn new(max_cumulative_on_time_ms: u64) -> Self {
        Self {
            state: ThermalState::Active,
            cumulative_on_time_ms: 0,
            max_cumulative_on_time_ms,
            peak_on_time_ms: 0,
        }
    }

    pub fn state(&self) -> ThermalState {
        self.state
    }

    pub fn cumulative_on_time_ms(&self) -> u64 {
        self.cumulative_on_time_ms
    }

    /// Highest cumulative value reached since construction.
    pub fn peak_on_time_ms(&self) -> u64 {
        self.peak_on_time_ms
    }

    /// Account one stroke. Returns `Cooling` when the budget is spent.
    pub fn record_stroke(&mut self, on_time_ms: u64) -> ThermalState {
        if self.state == ThermalState::Cooling {
            return self.state;
        }
        self.cumulative_on_time_ms = self.cumulative_on_time_ms.saturating_add(on_time_ms);
        self.peak_on_time_ms = self.peak_on_time_ms.max(self.cumulative_on_time_ms);
        if self.cumulative_on_time_ms >= self.max_cumulative_on_time_ms {
            self.state = ThermalState::Cooling;
        }
        self.state
    }

    /// Leave `Cooling` once the pause has elapsed.
    pub fn complete_cooldown(&mut self) {
        self.state = ThermalState::Active;
        self.cumulative_on_time_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_until_cap() {
        let mut guard = ThermalGuard::new(2000);
        for n in 1..=133 {
            assert_eq!(guard.record_stroke(15), ThermalState::Active);
            assert_eq!(guard.cumulative_on_time_ms(), n * 15);
        }
        assert_eq!(guard.record_stroke(15), ThermalState::Cooling);
        assert_eq!(guard.cumulative_on_time_ms(), 2010);
    }

    #[test]
    fn exact_cap_triggers_cooling() {
        let mut guard = ThermalGuard::new(30);
        guard.record_stroke(15);
        assert_eq!(guard.record_stroke(15), ThermalState::Cooling);
    }

    #[test]
    fn strokes_while_cooling_are_not_counted() {
        let mut guard = ThermalGuard::new(10);
        guard.record_stroke(15);
        guard.record_stroke(15);
        assert_eq!(guard.cumulative_on_time_ms(), 15);
    }

    #[test]
    fn cooldown_resets_budget() {
        let mut guard = ThermalGuard::new(10);
        guard.record_stroke(15);
        guard.complete_cooldown();
        assert_eq!(guard.state(), ThermalState::Active);
        assert_eq!(guard.cumulative_on_time_ms(), 0);
        assert_eq!(guard.peak_on_time_ms(), 15);
    }
}
