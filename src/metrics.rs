// Derived metric calculations shared by the detail tables and the summary
// rollups.
//
// Two zero-denominator conventions live here side by side:
// - `growth` / `achievement` report a brand-new value (`+inf`) when the
//   baseline is zero but the current figure is positive;
// - `rate` reports `0` for an empty denominator.
// Summary tables rely on both, so they are kept as separate functions.

/// Period-over-period change as a ratio (`0.25` means +25%).
///
/// A zero `previous` yields `f64::INFINITY` when `current` is positive and
/// `0.0` otherwise.
pub fn growth(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { f64::INFINITY } else { 0.0 };
    }
    (current - previous) / previous
}

/// Actual over target as a ratio (`1.0` means the target was met).
///
/// Same zero-target rule as [`growth`].
pub fn achievement(current: f64, target: f64) -> f64 {
    if target == 0.0 {
        return if current > 0.0 { f64::INFINITY } else { 0.0 };
    }
    current / target
}

/// Ratio used on summary rows (e.g. active outlets per PJP).
///
/// An empty denominator is reported as 0%, never as "new".
pub fn rate(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Growth and achievement for one current/previous/target triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetric {
    pub growth: f64,
    pub achievement: f64,
}

impl DerivedMetric {
    pub fn compute(current: f64, previous: f64, target: f64) -> Self {
        DerivedMetric {
            growth: growth(current, previous),
            achievement: achievement(current, target),
        }
    }

    pub fn is_new(&self) -> bool {
        self.growth.is_infinite()
    }
}

/// Render a growth ratio for display. Infinite growth is shown as "New".
pub fn format_growth(ratio: f64) -> String {
    if ratio.is_infinite() {
        return "New ▲".to_string();
    }
    let arrow = if ratio >= 0.0 { '▲' } else { '▼' };
    format!("{:.1}% {}", ratio * 100.0, arrow)
}

/// Render an achievement ratio. A zero target with sales is "N/A".
pub fn format_achievement(ratio: f64) -> String {
    if ratio.is_infinite() {
        return "N/A".to_string();
    }
    format!("{:.1}%", ratio * 100.0)
}

pub fn format_rate(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Highlight band of a ratio cell, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl RatioBand {
    /// "Higher is better" ratios such as stock > 0 outlets per PJP.
    pub fn good_ratio(ratio: f64) -> Self {
        if ratio >= 0.9 {
            RatioBand::Excellent
        } else if ratio >= 0.75 {
            RatioBand::Good
        } else if ratio >= 0.5 {
            RatioBand::Fair
        } else {
            RatioBand::Poor
        }
    }

    /// "Lower is better" ratios such as empty-stock outlets per PJP.
    pub fn bad_ratio(ratio: f64) -> Self {
        if ratio <= 0.1 {
            RatioBand::Excellent
        } else if ratio <= 0.25 {
            RatioBand::Good
        } else if ratio <= 0.5 {
            RatioBand::Fair
        } else {
            RatioBand::Poor
        }
    }

    /// Achievement against target. A zero target with sales counts as met.
    pub fn achievement(ratio: f64) -> Self {
        if ratio.is_infinite() || ratio >= 1.0 {
            RatioBand::Excellent
        } else if ratio >= 0.75 {
            RatioBand::Fair
        } else {
            RatioBand::Poor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_from_zero_baseline_is_new() {
        for current in [1.0, 5.0, 1_000_000.0] {
            assert_eq!(growth(current, 0.0), f64::INFINITY);
        }
    }

    #[test]
    fn growth_of_zero_over_zero_is_zero() {
        assert_eq!(growth(0.0, 0.0), 0.0);
    }

    #[test]
    fn unchanged_value_has_zero_growth() {
        for previous in [0.5, 1.0, 42.0, 3_500_000.0] {
            assert_eq!(growth(previous, previous), 0.0);
        }
    }

    #[test]
    fn growth_is_relative_change() {
        assert_eq!(growth(100.0, 50.0), 1.0);
        assert_eq!(growth(25.0, 50.0), -0.5);
    }

    #[test]
    fn achievement_with_zero_target() {
        assert_eq!(achievement(5.0, 0.0), f64::INFINITY);
        assert_eq!(achievement(0.0, 0.0), 0.0);
        assert_eq!(achievement(75.0, 100.0), 0.75);
    }

    #[test]
    fn rate_with_zero_denominator_is_zero() {
        assert_eq!(rate(3.0, 0.0), 0.0);
        assert_eq!(rate(3.0, 4.0), 0.75);
    }

    #[test]
    fn nan_propagates_without_panic() {
        assert!(growth(f64::NAN, 10.0).is_nan());
        assert!(achievement(f64::NAN, 10.0).is_nan());
    }

    #[test]
    fn infinite_values_render_as_markers() {
        assert_eq!(format_growth(f64::INFINITY), "New ▲");
        assert_eq!(format_achievement(achievement(5.0, 0.0)), "N/A");
        assert_eq!(format_growth(0.125), "12.5% ▲");
        assert_eq!(format_growth(-0.2), "-20.0% ▼");
        assert_eq!(format_achievement(0.9), "90.0%");
    }

    #[test]
    fn derived_metric_pairs_growth_and_achievement() {
        let d = DerivedMetric::compute(5.0, 0.0, 0.0);
        assert!(d.is_new());
        assert_eq!(d.achievement, f64::INFINITY);
    }

    #[test]
    fn good_and_bad_ratio_bands_mirror_each_other() {
        assert_eq!(RatioBand::good_ratio(0.95), RatioBand::Excellent);
        assert_eq!(RatioBand::good_ratio(0.8), RatioBand::Good);
        assert_eq!(RatioBand::good_ratio(0.5), RatioBand::Fair);
        assert_eq!(RatioBand::good_ratio(0.1), RatioBand::Poor);
        assert_eq!(RatioBand::bad_ratio(0.05), RatioBand::Excellent);
        assert_eq!(RatioBand::bad_ratio(0.25), RatioBand::Good);
        assert_eq!(RatioBand::bad_ratio(0.4), RatioBand::Fair);
        assert_eq!(RatioBand::bad_ratio(0.9), RatioBand::Poor);
    }

    #[test]
    fn achievement_band() {
        assert_eq!(RatioBand::achievement(1.2), RatioBand::Excellent);
        assert_eq!(RatioBand::achievement(f64::INFINITY), RatioBand::Excellent);
        assert_eq!(RatioBand::achievement(0.8), RatioBand::Fair);
        assert_eq!(RatioBand::achievement(0.3), RatioBand::Poor);
    }
}
