//! Ambient signal readings (weather) and their bounded random walk.
//!
//! The hub walks the reading with [`Jitter::SERVER`] and clients smooth what
//! they receive with the smaller [`Jitter::CLIENT`]. Both use the same field
//! domains, so a perturbed value never leaves its declared range.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Closed numeric range a field must stay within
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDomain {
    pub min: f64,
    pub max: f64,
}

impl FieldDomain {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

pub const TEMPERATURE_DOMAIN: FieldDomain = FieldDomain::new(-50.0, 60.0);
pub const WIND_SPEED_DOMAIN: FieldDomain = FieldDomain::new(0.0, 250.0);
pub const HUMIDITY_DOMAIN: FieldDomain = FieldDomain::new(0.0, 100.0);

/// Maximum absolute change per field applied by one perturbation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    pub temperature: f64,
    pub wind_speed: f64,
    pub humidity: f64,
}

impl Jitter {
    /// Step size of the hub's random walk
    pub const SERVER: Jitter = Jitter {
        temperature: 0.3,
        wind_speed: 2.0,
        humidity: 5.0,
    };

    /// Presentation smoothing applied by clients on top of server readings
    pub const CLIENT: Jitter = Jitter {
        temperature: 0.2,
        wind_speed: 1.0,
        humidity: 2.5,
    };
}

/// Current ambient reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalState {
    /// Degrees Celsius
    pub temperature: f64,
    /// km/h
    pub wind_speed: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    /// Compass label, never perturbed
    pub wind_direction: String,
}

impl Default for SignalState {
    fn default() -> Self {
        Self {
            temperature: 27.0,
            wind_speed: 12.0,
            humidity: 75.0,
            wind_direction: "Tenggara".to_string(),
        }
    }
}

impl SignalState {
    /// Return a new reading with every numeric field moved by at most its
    /// jitter, clamped to its domain and rounded to one decimal place.
    pub fn perturbed<R: Rng>(&self, jitter: &Jitter, rng: &mut R) -> SignalState {
        SignalState {
            temperature: step(self.temperature, jitter.temperature, TEMPERATURE_DOMAIN, rng),
            wind_speed: step(self.wind_speed, jitter.wind_speed, WIND_SPEED_DOMAIN, rng),
            humidity: step(self.humidity, jitter.humidity, HUMIDITY_DOMAIN, rng),
            wind_direction: self.wind_direction.clone(),
        }
    }

    /// Whether every numeric field is finite and inside its domain
    pub fn is_within_domains(&self) -> bool {
        TEMPERATURE_DOMAIN.contains(self.temperature)
            && WIND_SPEED_DOMAIN.contains(self.wind_speed)
            && HUMIDITY_DOMAIN.contains(self.humidity)
    }
}

fn step<R: Rng>(value: f64, jitter: f64, domain: FieldDomain, rng: &mut R) -> f64 {
    let delta = if jitter > 0.0 {
        rng.gen_range(-jitter..=jitter)
    } else {
        0.0
    };
    round_one_decimal(domain.clamp(value + delta))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_perturbed_stays_within_domains_and_jitter() {
        // テスト項目: 連続した摂動でも各値はドメイン内に収まり、1 回の変化量は jitter 以下
        // given (前提条件):
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = SignalState::default();

        for _ in 0..10_000 {
            // when (操作):
            let next = state.perturbed(&Jitter::SERVER, &mut rng);

            // then (期待する結果):
            assert!(next.is_within_domains(), "{next:?}");
            assert!((next.temperature - state.temperature).abs() <= 0.3 + EPSILON);
            assert!((next.wind_speed - state.wind_speed).abs() <= 2.0 + EPSILON);
            assert!((next.humidity - state.humidity).abs() <= 5.0 + EPSILON);
            state = next;
        }
    }

    #[test]
    fn test_perturbed_clamps_at_domain_edges() {
        // テスト項目: ドメイン境界にある値は境界の外へ出ない
        // given (前提条件):
        let mut rng = StdRng::seed_from_u64(42);
        let state = SignalState {
            temperature: 60.0,
            wind_speed: 0.0,
            humidity: 100.0,
            wind_direction: "Utara".to_string(),
        };

        for _ in 0..1_000 {
            // when (操作):
            let next = state.perturbed(&Jitter::SERVER, &mut rng);

            // then (期待する結果):
            assert!(next.temperature <= 60.0);
            assert!(next.wind_speed >= 0.0);
            assert!(next.humidity <= 100.0);
        }
    }

    #[test]
    fn test_perturbed_keeps_wind_direction() {
        // テスト項目: 数値以外のフィールド（風向）は変化しない
        // given (前提条件):
        let mut rng = StdRng::seed_from_u64(1);
        let state = SignalState::default();

        // when (操作):
        let next = state.perturbed(&Jitter::CLIENT, &mut rng);

        // then (期待する結果):
        assert_eq!(next.wind_direction, "Tenggara");
    }

    #[test]
    fn test_perturbed_rounds_to_one_decimal() {
        // テスト項目: 摂動後の値は小数第 1 位に丸められる
        // given (前提条件):
        let mut rng = StdRng::seed_from_u64(3);
        let state = SignalState::default();

        // when (操作):
        let next = state.perturbed(&Jitter::SERVER, &mut rng);

        // then (期待する結果):
        for value in [next.temperature, next.wind_speed, next.humidity] {
            assert!(((value * 10.0).round() - value * 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_out_of_domain_input_is_pulled_back() {
        // テスト項目: ドメイン外や NaN の入力値は摂動後にドメイン内へ戻される
        // given (前提条件):
        let mut rng = StdRng::seed_from_u64(9);
        let state = SignalState {
            temperature: f64::NAN,
            wind_speed: -30.0,
            humidity: 180.0,
            wind_direction: "Barat".to_string(),
        };

        // when (操作):
        let next = state.perturbed(&Jitter::CLIENT, &mut rng);

        // then (期待する結果):
        assert!(next.is_within_domains());
    }

    #[test]
    fn test_signal_state_wire_shape() {
        // テスト項目: SignalState は camelCase のキーでシリアライズされる
        // given (前提条件):
        let state = SignalState::default();

        // when (操作):
        let value = serde_json::to_value(&state).unwrap();

        // then (期待する結果):
        assert_eq!(value["windSpeed"], 12.0);
        assert_eq!(value["windDirection"], "Tenggara");
    }
}
