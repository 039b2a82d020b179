#[cfg(all(test, feature = "simulation"))]
mod proptest_stroke {
    use crate::config::GraverConfig;
    use crate::controller::{StepOutcome, StrokeController};
    use crate::output_sim::{OutputEvent, SimulatedSolenoid};
    use crate::setpoint::Setpoint;
    use crate::sync::SetpointChannel;
    use crate::timebase::ManualClock;
    use crate::timing::StrokeTiming;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn controller(
        config: GraverConfig,
    ) -> (
        Arc<SetpointChannel>,
        Arc<SetpointChannel>,
        StrokeController<SimulatedSolenoid, ManualClock>,
    ) {
        let speed = Arc::new(SetpointChannel::new());
        let power = Arc::new(SetpointChannel::new());
        let ctl = StrokeController::new(
            config,
            SimulatedSolenoid::new(1023).with_event_log(),
            ManualClock::new(),
            Arc::clone(&speed),
            Arc::clone(&power),
        )
        .unwrap();
        (speed, power, ctl)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        // Property: any input, including NaN and infinities, normalizes into [0, 1]
        #[test]
        fn normalized_setpoints_stay_in_range(raw in any::<f64>()) {
            let (sp, _) = Setpoint::new(raw).normalize();
            prop_assert!((0.0..=1.0).contains(&sp.value()), "raw={} gave {}", raw, sp.value());
        }

        // Property: ingestion through the controller clamps both fields
        #[test]
        fn ingested_setpoints_stay_in_range(speed in any::<f64>(), power in any::<f64>()) {
            let (speed_chan, power_chan, mut ctl) = controller(GraverConfig::default());
            speed_chan.try_send(speed);
            power_chan.try_send(power);
            ctl.step();
            prop_assert!((0.0..=1.0).contains(&ctl.speed()));
            prop_assert!((0.0..=1.0).contains(&ctl.power()));
        }

        // Property: on-time never exceeds half the stroke period
        #[test]
        fn duty_cycle_never_exceeds_half(
            speed in 1e-9f64..=1.0,
            pulse in 1u64..=100,
            spm in 1.0f64..=20_000.0,
        ) {
            let config = GraverConfig {
                pulse_length_ms: pulse,
                max_strokes_per_minute: spm,
                ..Default::default()
            };
            let timing = StrokeTiming::compute(&config, speed);
            prop_assert!(timing.off_time_ms >= pulse);
            prop_assert!(timing.duty_cycle() <= 0.5);
        }

        // Property: speed at or below bias never energizes, whatever the power
        #[test]
        fn bias_gates_energize(fraction in 0.0f64..=1.0, power in any::<f64>()) {
            let config = GraverConfig::default();
            let (speed_chan, power_chan, mut ctl) = controller(config.clone());
            speed_chan.try_send(config.speed_bias * fraction);
            power_chan.try_send(power);

            prop_assert_eq!(ctl.step(), StepOutcome::Idle);
            let energized = ctl
                .output()
                .events()
                .iter()
                .any(|e| matches!(e, OutputEvent::Energized(_)));
            prop_assert!(!energized);
        }

        // Property: below the cap, cumulative on-time is strokes * pulse length
        #[test]
        fn on_time_accumulates_per_stroke(strokes in 1u64..=133, speed in 0.02f64..=1.0) {
            let (speed_chan, power_chan, mut ctl) = controller(GraverConfig::default());
            speed_chan.try_send(speed);
            power_chan.try_send(0.5);
            for _ in 0..strokes {
                ctl.step();
            }
            prop_assert_eq!(ctl.cumulative_on_time_ms(), strokes * 15);
            prop_assert_eq!(ctl.stats().cooldowns, 0);
        }
    }
}
