// lib/src/vitals.rs

//! The vital-sign process: initial draws, the bounded random walk that moves a
//! reading forward one tick, and the coarse status score.
//!
//! Everything here is a pure function of its inputs plus the caller's RNG, so
//! it is safe to run for many patients at once.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::errors::{SimulationError, SimulationResult};
use models::{ClinicalStatus, VitalReading};

/// Multiplier applied to damped channels on every step.
pub const DECAY: f64 = 0.98;
/// Upper end of the one-sided noise added to damped channels.
pub const VOLATILITY: f64 = 0.5;
pub const SPO2_STEP: f64 = 0.5;
pub const TEMPERATURE_STEP: f64 = 0.1;
pub const RESPIRATORY_STEP: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Walk {
    /// `current * DECAY + u * VOLATILITY`
    Damped,
    /// `current + (u - 0.5) * step`
    Undamped { step: f64 },
}

/// One scalar component of a [`VitalReading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    HeartRate,
    Systolic,
    Diastolic,
    Spo2,
    Temperature,
    RespiratoryRate,
}

impl Channel {
    /// Draw order; every step consumes one uniform sample per channel in this order.
    pub const ALL: [Channel; 6] = [
        Channel::HeartRate,
        Channel::Systolic,
        Channel::Diastolic,
        Channel::Spo2,
        Channel::Temperature,
        Channel::RespiratoryRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::HeartRate => "heartRate",
            Channel::Systolic => "systolic",
            Channel::Diastolic => "diastolic",
            Channel::Spo2 => "spo2",
            Channel::Temperature => "temperature",
            Channel::RespiratoryRate => "respiratoryRate",
        }
    }

    /// Band the first reading is drawn from, `[low, high)`.
    pub fn initial_band(self) -> (f64, f64) {
        match self {
            Channel::HeartRate => (60.0, 100.0),
            Channel::Systolic => (110.0, 140.0),
            Channel::Diastolic => (65.0, 85.0),
            Channel::Spo2 => (95.0, 100.0),
            Channel::Temperature => (36.5, 38.0),
            Channel::RespiratoryRate => (12.0, 20.0),
        }
    }

    /// Hard limits every generated value is clamped to.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Channel::HeartRate => (40.0, 120.0),
            Channel::Systolic => (80.0, 180.0),
            Channel::Diastolic => (40.0, 110.0),
            Channel::Spo2 => (85.0, 100.0),
            Channel::Temperature => (36.0, 39.0),
            Channel::RespiratoryRate => (8.0, 30.0),
        }
    }

    pub fn walk(self) -> Walk {
        match self {
            Channel::HeartRate | Channel::Systolic | Channel::Diastolic => Walk::Damped,
            Channel::Spo2 => Walk::Undamped { step: SPO2_STEP },
            Channel::Temperature => Walk::Undamped { step: TEMPERATURE_STEP },
            Channel::RespiratoryRate => Walk::Undamped { step: RESPIRATORY_STEP },
        }
    }

    pub fn value(self, reading: &VitalReading) -> f64 {
        match self {
            Channel::HeartRate => reading.heart_rate,
            Channel::Systolic => reading.systolic,
            Channel::Diastolic => reading.diastolic,
            Channel::Spo2 => reading.spo2,
            Channel::Temperature => reading.temperature,
            Channel::RespiratoryRate => reading.respiratory_rate,
        }
    }

    /// Advances one channel value given a uniform sample `u` in `[0, 1)`.
    pub fn step(self, current: f64, u: f64) -> f64 {
        let (low, high) = self.bounds();
        let raw = match self.walk() {
            Walk::Damped => current * DECAY + u * VOLATILITY,
            Walk::Undamped { step } => current + (u - 0.5) * step,
        };
        clamp(raw, low, high)
    }
}

pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    low.max(high.min(value))
}

fn from_channels(values: [f64; 6], captured_at: DateTime<Utc>) -> VitalReading {
    VitalReading {
        heart_rate: values[0],
        systolic: values[1],
        diastolic: values[2],
        spo2: values[3],
        temperature: values[4],
        respiratory_rate: values[5],
        captured_at,
    }
}

/// Draws a first reading uniformly from each channel's initial band.
pub fn initial_reading<R: Rng + ?Sized>(rng: &mut R, captured_at: DateTime<Utc>) -> VitalReading {
    let mut values = [0.0; 6];
    for (slot, channel) in values.iter_mut().zip(Channel::ALL) {
        let (low, high) = channel.initial_band();
        *slot = low + rng.gen::<f64>() * (high - low);
    }
    from_channels(values, captured_at)
}

/// Produces the reading that follows `current`.
///
/// Fails without consuming randomness if any channel of `current` is not a
/// finite number.
pub fn next_reading<R: Rng + ?Sized>(
    current: &VitalReading,
    rng: &mut R,
    captured_at: DateTime<Utc>,
) -> SimulationResult<VitalReading> {
    for channel in Channel::ALL {
        let value = channel.value(current);
        if !value.is_finite() {
            return Err(SimulationError::NonFiniteReading { channel: channel.name(), value });
        }
    }

    let mut values = [0.0; 6];
    for (slot, channel) in values.iter_mut().zip(Channel::ALL) {
        *slot = channel.step(channel.value(current), rng.gen::<f64>());
    }
    Ok(from_channels(values, captured_at))
}

/// Number of raised flags, 0..=5.
pub fn status_score(reading: &VitalReading) -> u8 {
    let flags = [
        reading.heart_rate < 40.0 || reading.heart_rate > 110.0,
        reading.systolic < 100.0 || reading.systolic > 180.0,
        reading.spo2 < 92.0,
        reading.temperature < 36.0 || reading.temperature > 38.5,
        reading.respiratory_rate < 10.0 || reading.respiratory_rate > 25.0,
    ];
    flags.iter().filter(|raised| **raised).count() as u8
}

pub fn classify(reading: &VitalReading) -> ClinicalStatus {
    match status_score(reading) {
        0 | 1 => ClinicalStatus::Stable,
        2 => ClinicalStatus::Warning,
        _ => ClinicalStatus::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn reading(hr: f64, sys: f64, spo2: f64, temp: f64, rr: f64) -> VitalReading {
        VitalReading {
            heart_rate: hr,
            systolic: sys,
            diastolic: 75.0,
            spo2,
            temperature: temp,
            respiratory_rate: rr,
            captured_at: Utc::now(),
        }
    }

    fn assert_within_bounds(r: &VitalReading) {
        for channel in Channel::ALL {
            let (low, high) = channel.bounds();
            let v = channel.value(r);
            assert!(v >= low && v <= high, "{} = {} outside [{}, {}]", channel.name(), v, low, high);
        }
    }

    #[test]
    fn should_classify_golden_readings() {
        let warning = reading(130.0, 150.0, 90.0, 37.0, 15.0);
        assert_eq!(status_score(&warning), 2);
        assert_eq!(classify(&warning), ClinicalStatus::Warning);

        let critical = reading(30.0, 190.0, 80.0, 39.0, 5.0);
        assert_eq!(status_score(&critical), 5);
        assert_eq!(classify(&critical), ClinicalStatus::Critical);

        let stable = reading(70.0, 120.0, 98.0, 37.0, 14.0);
        assert_eq!(status_score(&stable), 0);
        assert_eq!(classify(&stable), ClinicalStatus::Stable);
    }

    #[test]
    fn should_treat_flag_edges_as_inclusive_normal() {
        let edges = reading(110.0, 100.0, 92.0, 38.5, 25.0);
        assert_eq!(status_score(&edges), 0);
        let single = reading(111.0, 120.0, 98.0, 37.0, 14.0);
        assert_eq!(classify(&single), ClinicalStatus::Stable);
    }

    #[test]
    fn should_draw_initial_readings_inside_initial_bands() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let r = initial_reading(&mut rng, Utc::now());
            for channel in Channel::ALL {
                let (low, high) = channel.initial_band();
                let v = channel.value(&r);
                assert!(v >= low && v <= high, "{} = {}", channel.name(), v);
            }
            assert_within_bounds(&r);
        }
    }

    #[test]
    fn should_stay_within_bounds_over_ten_thousand_ticks() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut current = initial_reading(&mut rng, Utc::now());
        for _ in 0..10_000 {
            current = next_reading(&current, &mut rng, Utc::now()).unwrap();
            assert_within_bounds(&current);
        }
    }

    #[test]
    fn should_pull_out_of_range_input_back_into_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let wild = VitalReading {
            heart_rate: 500.0,
            systolic: -20.0,
            diastolic: 300.0,
            spo2: 120.0,
            temperature: 10.0,
            respiratory_rate: 90.0,
            captured_at: Utc::now(),
        };
        let next = next_reading(&wild, &mut rng, Utc::now()).unwrap();
        assert_within_bounds(&next);
        assert_eq!(next.heart_rate, 120.0);
        assert_eq!(next.systolic, 80.0);
    }

    #[test]
    fn should_apply_walk_formulas_in_draw_order() {
        let start = reading(80.0, 120.0, 97.0, 37.0, 16.0);
        let mut rng = StdRng::seed_from_u64(99);
        let mut mirror = StdRng::seed_from_u64(99);
        let next = next_reading(&start, &mut rng, Utc::now()).unwrap();

        let u: Vec<f64> = (0..6).map(|_| mirror.gen::<f64>()).collect();
        assert_eq!(next.heart_rate, clamp(80.0 * 0.98 + u[0] * 0.5, 40.0, 120.0));
        assert_eq!(next.systolic, clamp(120.0 * 0.98 + u[1] * 0.5, 80.0, 180.0));
        assert_eq!(next.diastolic, clamp(75.0 * 0.98 + u[2] * 0.5, 40.0, 110.0));
        assert_eq!(next.spo2, clamp(97.0 + (u[3] - 0.5) * 0.5, 85.0, 100.0));
        assert_eq!(next.temperature, clamp(37.0 + (u[4] - 0.5) * 0.1, 36.0, 39.0));
        assert_eq!(next.respiratory_rate, clamp(16.0 + (u[5] - 0.5) * 0.5, 8.0, 30.0));
    }

    #[test]
    fn should_settle_damped_channels_at_lower_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut current = reading(100.0, 170.0, 98.0, 37.0, 14.0);
        for _ in 0..2_000 {
            current = next_reading(&current, &mut rng, Utc::now()).unwrap();
        }
        assert_eq!(current.heart_rate, 40.0);
        assert_eq!(current.systolic, 80.0);
        assert_eq!(current.diastolic, 40.0);
    }

    #[test]
    fn should_reject_non_finite_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let broken = reading(f64::NAN, 120.0, 98.0, 37.0, 14.0);
        match next_reading(&broken, &mut rng, Utc::now()) {
            Err(SimulationError::NonFiniteReading { channel, .. }) => assert_eq!(channel, "heartRate"),
            other => panic!("expected NonFiniteReading, got {:?}", other),
        }
    }

    #[test]
    fn should_stamp_reading_with_given_capture_time() {
        let mut rng = StdRng::seed_from_u64(5);
        let at = Utc::now() + chrono::Duration::seconds(30);
        let r = next_reading(&reading(70.0, 120.0, 98.0, 37.0, 14.0), &mut rng, at).unwrap();
        assert_eq!(r.captured_at, at);
    }
}
