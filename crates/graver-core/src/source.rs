//! Setpoint producers: something that can be sampled for a normalized value,
//! and a polling driver that pushes samples onto a [`SetpointChannel`].

use crate::sync::SetpointChannel;
use log::{debug, trace};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub trait SetpointSource: Send {
    /// Nominally in `[0.0, 1.0]`; the controller clamps whatever arrives.
    fn sample(&mut self) -> f64;
}

impl<S: SetpointSource + ?Sized> SetpointSource for Box<S> {
    fn sample(&mut self) -> f64 {
        (**self).sample()
    }
}

#[derive(Debug, Clone)]
pub enum SimulatedSource {
    Constant(f64),
    /// Sweeps low -> high -> low over `period_samples` samples.
    Triangle {
        low: f64,
        high: f64,
        period_samples: u32,
        step: u32,
    },
}

impl SimulatedSource {
    pub fn constant(value: f64) -> Self {
        Self::Constant(value)
    }

    pub fn triangle(low: f64, high: f64, period_samples: u32) -> Self {
        Self::Triangle {
            low,
            high,
            period_samples: period_samples.max(2),
            step: 0,
        }
    }
}

impl SetpointSource for SimulatedSource {
    fn sample(&mut self) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Triangle {
                low,
                high,
                period_samples,
                step,
            } => {
                let half = f64::from(*period_samples) / 2.0;
                let phase = f64::from(*step);
                let fraction = if phase <= half {
                    phase / half
                } else {
                    (f64::from(*period_samples) - phase) / half
                };
                *step = (*step + 1) % *period_samples;
                *low + (*high - *low) * fraction
            }
        }
    }
}

/// Raw analog-to-digital converter access.
pub trait AnalogReader: Send {
    fn read_raw(&mut self) -> u16;
}

/// Potentiometer or pedal on an ADC pin, normalized by its full-scale count.
pub struct AnalogSource<R: AnalogReader> {
    reader: R,
    full_scale: u16,
}

impl<R: AnalogReader> AnalogSource<R> {
    pub fn new(reader: R, full_scale: u16) -> Self {
        Self {
            reader,
            full_scale: full_scale.max(1),
        }
    }
}

impl<R: AnalogReader> SetpointSource for AnalogSource<R> {
    fn sample(&mut self) -> f64 {
        f64::from(self.reader.read_raw()) / f64::from(self.full_scale)
    }
}

/// Samples one source at a fixed period and publishes every reading.
pub struct SetpointPoller<S: SetpointSource> {
    name: &'static str,
    source: S,
    channel: Arc<SetpointChannel>,
    period: Duration,
}

impl<S: SetpointSource> SetpointPoller<S> {
    pub fn new(
        name: &'static str,
        source: S,
        channel: Arc<SetpointChannel>,
        period: Duration,
    ) -> Self {
        Self {
            name,
            source,
            channel,
            period,
        }
    }

    /// Take and publish one sample.
    pub fn poll_once(&mut self) -> f64 {
        let value = self.source.sample();
        self.channel.try_send(value);
        trace!("{} input sampled: {:.3}", self.name, value);
        value
    }

    pub fn run(&mut self, stop: &AtomicBool) {
        debug!("{} poller started ({} ms period)", self.name, self.period.as_millis());
        while !stop.load(Ordering::Relaxed) {
            self.poll_once();
            thread::sleep(self.period);
        }
        debug!("{} poller stopped", self.name);
    }
}

impl<S: SetpointSource + 'static> SetpointPoller<S> {
    pub fn spawn(mut self, stop: Arc<AtomicBool>) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("{}-input", self.name))
            .spawn(move || self.run(&stop))
    }
}
