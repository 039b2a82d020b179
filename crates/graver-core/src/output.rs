/// The solenoid power stage. Owned exclusively by the stroke controller,
/// which never reads it back beyond the health flag.
pub trait PulseOutput: Send {
    fn configure(&mut self, frequency_hz: u32);
    /// Energize at `level`, where `0 <= level <= max_intensity()`.
    fn set_intensity(&mut self, level: u16);
    fn off(&mut self);
    fn max_intensity(&self) -> u16;
    /// False once the power stage has reported a fault.
    fn is_healthy(&self) -> bool;
}

impl<O: PulseOutput + ?Sized> PulseOutput for Box<O> {
    fn configure(&mut self, frequency_hz: u32) {
        (**self).configure(frequency_hz)
    }

    fn set_intensity(&mut self, level: u16) {
        (**self).set_intensity(level)
    }

    fn off(&mut self) {
        (**self).off()
    }

    fn max_intensity(&self) -> u16 {
        (**self).max_intensity()
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}
