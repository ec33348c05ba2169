/// Additive home-advantage bonus inside the logistic.
pub const HOME_ADV: f64 = 0.2;

/// Probability the home side wins a single frame.
///
/// Strengths are unbounded reals; the logistic keeps the output strictly
/// inside (0, 1).
pub fn predict_frame(home_strength: f64, away_strength: f64) -> f64 {
    let p = 1.0 / (1.0 + (-(home_strength + HOME_ADV - away_strength)).exp());
    // exp() saturates for huge gaps (exp(-2000) is 0.0 in f64), which would
    // land the output on an endpoint; pin it just inside.
    p.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON)
}
