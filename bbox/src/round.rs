use crate::common::*;

/// Decimal rounding for floating point values.
pub trait RoundTo: Float {
    /// Round to `decimals` places after the decimal point, halfway cases away from zero.
    fn round_to(self, decimals: i32) -> Self {
        let two = Self::one() + Self::one();
        let ten = two * two * two + two;
        let scale = ten.powi(decimals);
        (self * scale).round() / scale
    }
}

impl<T> RoundTo for T where T: Float {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn round_to_four_decimals() {
        assert_abs_diff_eq!(0.123456_f64.round_to(4), 0.1235);
        assert_abs_diff_eq!((1.0_f64 / 3.0).round_to(4), 0.3333);
        assert_abs_diff_eq!(2.0_f64.round_to(4), 2.0);
        assert_abs_diff_eq!((-0.98765_f64).round_to(2), -0.99);
        assert_abs_diff_eq!(0.55555_f32.round_to(3), 0.556);
    }
}
