/// Decimal places kept when displaying a fractional number.
const DISPLAY_DECIMALS: usize = 10;

/// Format a number for display.
///
/// Whole numbers print without a fraction; fractions are rounded to ten
/// places with trailing zeros removed, so `0.1 + 0.2` shows as `0.3`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        let fixed = format!("{:.*}", DISPLAY_DECIMALS, n);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        if trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn test_format_whole_and_fractional() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_number(f64::NAN), "#NAN!");
        assert_eq!(format_number(f64::INFINITY), "#INF!");
    }
}
