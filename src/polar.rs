//! Polar model: TWA-to-boat-speed interpolation with wind-speed scaling.
//!
//! Deliberately a 1-D curve at a reference wind speed, not a full 2-D
//! TWS/TWA velocity-prediction table: the curve captures the boat's
//! upwind/downwind shape, and a multiplicative wind-scaling factor
//! approximates how that shape holds up off the reference wind speed.

use crate::geo::fold_twa;
use serde::{Deserialize, Serialize};

const REFERENCE_WIND_MS: f64 = 10.0;
const MAX_WIND_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarPoint {
    pub twa_deg: f64,
    pub speed_kts: f64,
}

/// A sorted table of (twa, speed) knots spanning `[0, 180]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarCurve {
    knots: Vec<PolarPoint>,
}

impl PolarCurve {
    /// Builds a curve from knots, sorting by `twa_deg`. Panics if fewer than
    /// two knots are given or any speed is negative — malformed curves are
    /// rejected at construction so the rest of the core can assume the
    /// invariant holds.
    pub fn new(mut knots: Vec<PolarPoint>) -> Result<Self, String> {
        if knots.len() < 2 {
            return Err("polar curve requires at least two knots".into());
        }
        if knots.iter().any(|k| k.speed_kts < 0.0) {
            return Err("polar curve speeds must be non-negative".into());
        }
        knots.sort_by(|a, b| a.twa_deg.partial_cmp(&b.twa_deg).unwrap());
        Ok(Self { knots })
    }

    /// The built-in default racing-yacht curve.
    pub fn default_curve() -> Self {
        let pairs = [
            (0.0, 0.0),
            (30.0, 2.0),
            (45.0, 4.0),
            (60.0, 5.5),
            (90.0, 6.0),
            (120.0, 5.8),
            (150.0, 5.0),
            (180.0, 4.5),
        ];
        let knots = pairs
            .iter()
            .map(|(twa, speed)| PolarPoint {
                twa_deg: *twa,
                speed_kts: *speed,
            })
            .collect();
        Self::new(knots).expect("built-in default curve is well-formed")
    }

    /// Interpolated boat speed in knots at a reference wind (no scaling).
    fn base_speed(&self, twa_folded: f64) -> f64 {
        if twa_folded <= self.knots[0].twa_deg {
            return self.knots[0].speed_kts;
        }
        let last = self.knots.len() - 1;
        if twa_folded >= self.knots[last].twa_deg {
            return self.knots[last].speed_kts;
        }
        for w in self.knots.windows(2) {
            let (lo, hi) = (w[0], w[1]);
            if twa_folded >= lo.twa_deg && twa_folded <= hi.twa_deg {
                if (hi.twa_deg - lo.twa_deg).abs() < f64::EPSILON {
                    return lo.speed_kts;
                }
                let frac = (twa_folded - lo.twa_deg) / (hi.twa_deg - lo.twa_deg);
                return lo.speed_kts + frac * (hi.speed_kts - lo.speed_kts);
            }
        }
        self.knots[last].speed_kts
    }

    /// Boat speed in knots for a given (unfolded) TWA and true wind speed in
    /// m/s. Folds `twa_deg` into `[0, 180]`, interpolates the base curve,
    /// then applies the wind-speed scaling factor `min(wind_ms/10, 1.5)`.
    pub fn boat_speed(&self, twa_deg: f64, wind_ms: f64) -> f64 {
        let twa_folded = fold_twa(twa_deg);
        let base = self.base_speed(twa_folded);
        let factor = (wind_ms / REFERENCE_WIND_MS).clamp(0.0, MAX_WIND_FACTOR);
        (base * factor).max(0.0)
    }

    /// The highest speed this curve can produce at any TWA, at the maximum
    /// wind-scaling factor. Used to derive an admissible A* heuristic
    /// reference speed (§4.7): `V_ref` must be at least this, or the
    /// heuristic could overestimate remaining time for a fast point of
    /// sail in strong wind.
    pub fn max_speed_kts(&self) -> f64 {
        let peak = self.knots.iter().map(|k| k.speed_kts).fold(0.0_f64, f64::max);
        peak * MAX_WIND_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_to_wind_is_stalled() {
        let curve = PolarCurve::default_curve();
        assert_eq!(curve.boat_speed(0.0, 10.0), 0.0);
    }

    #[test]
    fn symmetric_around_0_and_180() {
        let curve = PolarCurve::default_curve();
        assert_eq!(curve.boat_speed(10.0, 10.0), curve.boat_speed(-10.0, 10.0));
        assert_eq!(curve.boat_speed(350.0, 10.0), curve.boat_speed(10.0, 10.0));
    }

    #[test]
    fn wind_scaling_caps_at_1_5x() {
        let curve = PolarCurve::default_curve();
        let at_reference = curve.boat_speed(90.0, 10.0);
        let at_cap_threshold = curve.boat_speed(90.0, 15.0);
        let at_beyond_cap = curve.boat_speed(90.0, 30.0);
        assert!((at_cap_threshold - at_reference * 1.5).abs() < 1e-9);
        assert!((at_beyond_cap - at_reference * 1.5).abs() < 1e-9);
    }

    #[test]
    fn monotone_in_wind_up_to_cap() {
        let curve = PolarCurve::default_curve();
        let speeds: Vec<f64> = (0..=20).map(|i| curve.boat_speed(90.0, i as f64)).collect();
        for w in speeds.windows(2) {
            assert!(w[1] >= w[0] - 1e-9);
        }
    }

    #[test]
    fn interpolates_between_knots() {
        let curve = PolarCurve::default_curve();
        // Halfway between 30 (2.0kts) and 45 (4.0kts) at reference wind.
        let v = curve.boat_speed(37.5, 10.0);
        assert!((v - 3.0).abs() < 0.1);
    }

    #[test]
    fn max_speed_is_peak_knot_times_wind_cap() {
        let curve = PolarCurve::default_curve();
        assert!((curve.max_speed_kts() - 6.0 * 1.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_curves() {
        assert!(PolarCurve::new(vec![PolarPoint { twa_deg: 0.0, speed_kts: -1.0 }, PolarPoint { twa_deg: 180.0, speed_kts: 5.0 }]).is_err());
        assert!(PolarCurve::new(vec![PolarPoint { twa_deg: 0.0, speed_kts: 0.0 }]).is_err());
    }
}
