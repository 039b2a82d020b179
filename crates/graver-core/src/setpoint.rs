use std::marker::PhantomData;

#[derive(Debug, Clone, Copy)]
pub struct Raw;

#[derive(Debug, Clone, Copy)]
pub struct Normalized;

/// A speed or power setpoint. Only `Setpoint<Normalized>` exposes its value,
/// and that value is always within `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy)]
pub struct Setpoint<State = Raw> {
    value: f64,
    _state: PhantomData<State>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clamp {
    None,
    Low { requested: f64 },
    High { requested: f64 },
    NotFinite,
}

impl Setpoint<Raw> {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            _state: PhantomData,
        }
    }

    /// Out-of-range input is never rejected; NaN maps to 0.0.
    pub fn normalize(self) -> (Setpoint<Normalized>, Clamp) {
        let (value, clamp) = if self.value.is_nan() {
            (0.0, Clamp::NotFinite)
        } else if self.value < 0.0 {
            (0.0, Clamp::Low { requested: self.value })
        } else if self.value > 1.0 {
            (1.0, Clamp::High { requested: self.value })
        } else {
            (self.value, Clamp::None)
        };
        (
            Setpoint {
                value,
                _state: PhantomData,
            },
            clamp,
        )
    }
}

impl Setpoint<Normalized> {
    pub const ZERO: Self = Self {
        value: 0.0,
        _state: PhantomData,
    };

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Default for Setpoint<Normalized> {
    fn default() -> Self {
        Self::ZERO
    }
}
