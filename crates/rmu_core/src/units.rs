//! Imperial to metric display conversion.
//!
//! The rules engine stores every measurement in imperial units. These helpers
//! only produce display strings; they are estimates for a printed sheet and
//! never feed back into game math. Non-finite input renders as a zero with the
//! unit suffix of the requested system.

use crate::options::MeasurementSystem;

const KG_PER_POUND: f64 = 0.453_592_37;
const METRES_PER_FOOT: f64 = 0.3048;
const METRES_PER_INCH: f64 = 0.0254;

/// Movement below this many metres uses the fine rounding step.
const MOVEMENT_FINE_LIMIT_M: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceContext {
    Movement,
    Reach,
    Range,
    Height,
}

impl DistanceContext {
    /// Metric rounding granularity, in metres, for a converted value.
    fn metric_step(self, metres: f64) -> Rounding {
        match self {
            Self::Movement if metres.abs() < MOVEMENT_FINE_LIMIT_M => Rounding::Step(0.02),
            Self::Movement => Rounding::Step(0.5),
            Self::Reach => Rounding::Step(0.5),
            Self::Range => Rounding::Step(1.0),
            Self::Height => Rounding::Decimals(2),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Rounding {
    Step(f64),
    Decimals(u32),
}

impl Rounding {
    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Step(step) => (value / step).round() * step,
            Self::Decimals(places) => {
                let factor = 10f64.powi(places as i32);
                (value * factor).round() / factor
            }
        }
    }
}

pub fn weight_to_display(pounds: f64, system: MeasurementSystem) -> String {
    match system {
        MeasurementSystem::Imperial => format!("{} lbs", trim_number(pounds)),
        MeasurementSystem::Metric => {
            let kg = Rounding::Decimals(2).apply(pounds * KG_PER_POUND);
            format!("{} kg", trim_number(kg))
        }
    }
}

pub fn distance_to_display(feet: f64, system: MeasurementSystem, context: DistanceContext) -> String {
    match system {
        MeasurementSystem::Imperial => format!("{}'", trim_number(feet)),
        MeasurementSystem::Metric => {
            let metres = feet * METRES_PER_FOOT;
            let rounded = context.metric_step(metres).apply(metres);
            format!("{} m", trim_number(rounded))
        }
    }
}

/// Character height, stored by the engine in inches.
pub fn height_to_display(inches: f64, system: MeasurementSystem) -> String {
    match system {
        MeasurementSystem::Imperial => {
            if !inches.is_finite() {
                return "0'".to_string();
            }
            let total = inches.round() as i64;
            let (feet, rest) = (total / 12, total % 12);
            if rest == 0 {
                format!("{feet}'")
            } else {
                format!("{feet}'{rest}\"")
            }
        }
        MeasurementSystem::Metric => {
            let metres = Rounding::Decimals(2).apply(inches * METRES_PER_INCH);
            format!("{} m", trim_number(metres))
        }
    }
}

/// At most two decimals, no trailing zeros, never `-0`.
fn trim_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRIC: MeasurementSystem = MeasurementSystem::Metric;
    const IMPERIAL: MeasurementSystem = MeasurementSystem::Imperial;

    #[test]
    fn imperial_weight_keeps_source_units() {
        assert_eq!(weight_to_display(12.5, IMPERIAL), "12.5 lbs");
        assert_eq!(weight_to_display(3.0, IMPERIAL), "3 lbs");
    }

    #[test]
    fn metric_weight_rounds_to_hundredths() {
        assert_eq!(weight_to_display(10.0, METRIC), "4.54 kg");
        assert_eq!(weight_to_display(0.0, METRIC), "0 kg");
    }

    #[test]
    fn movement_uses_fine_step_below_four_metres() {
        // 10 ft = 3.048 m -> nearest 0.02
        assert_eq!(distance_to_display(10.0, METRIC, DistanceContext::Movement), "3.04 m");
        // 50 ft = 15.24 m -> nearest 0.5
        assert_eq!(distance_to_display(50.0, METRIC, DistanceContext::Movement), "15 m");
    }

    #[test]
    fn range_rounds_to_whole_metres() {
        assert_eq!(distance_to_display(100.0, METRIC, DistanceContext::Range), "30 m");
        assert_eq!(distance_to_display(100.0, IMPERIAL, DistanceContext::Range), "100'");
    }

    #[test]
    fn reach_rounds_to_half_metres() {
        assert_eq!(distance_to_display(5.0, METRIC, DistanceContext::Reach), "1.5 m");
    }

    #[test]
    fn height_keeps_two_decimals() {
        assert_eq!(distance_to_display(6.0, METRIC, DistanceContext::Height), "1.83 m");
        assert_eq!(height_to_display(70.0, METRIC), "1.78 m");
        assert_eq!(height_to_display(70.0, IMPERIAL), "5'10\"");
        assert_eq!(height_to_display(72.0, IMPERIAL), "6'");
    }

    #[test]
    fn malformed_input_degrades_to_zero_placeholder() {
        assert_eq!(weight_to_display(f64::NAN, METRIC), "0 kg");
        assert_eq!(weight_to_display(f64::NAN, IMPERIAL), "0 lbs");
        assert_eq!(
            distance_to_display(f64::INFINITY, METRIC, DistanceContext::Range),
            "0 m"
        );
        assert_eq!(height_to_display(f64::NAN, IMPERIAL), "0'");
    }

    #[test]
    fn conversion_is_idempotent() {
        let first = distance_to_display(37.0, METRIC, DistanceContext::Movement);
        let second = distance_to_display(37.0, METRIC, DistanceContext::Movement);
        assert_eq!(first, second);
        assert_eq!(weight_to_display(3.3, METRIC), weight_to_display(3.3, METRIC));
    }
}
