// Label-value formatting and unit conversion shared by every level of
// the flattening walk. The formats are part of the wire contract:
// dashboards select series by these exact strings.

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// iperf3 reports TCP_INFO round-trip times in microseconds.
pub fn micros_to_seconds(us: f64) -> f64 {
    us / MICROS_PER_SECOND
}

/// Socket numbers and other integers: plain decimal.
pub fn int(v: i32) -> String {
    v.to_string()
}

/// Window boundaries: six digits after the decimal point.
pub fn window(v: f64) -> String {
    format!("{v:.6}")
}

/// `true` / `false`
pub fn flag(v: bool) -> String {
    v.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_boundaries_have_six_decimals() {
        assert_eq!(window(0.0), "0.000000");
        assert_eq!(window(1.000043), "1.000043");
        assert_eq!(window(10.5), "10.500000");
    }

    #[test]
    fn integers_and_flags() {
        assert_eq!(int(5), "5");
        assert_eq!(int(12), "12");
        assert_eq!(flag(true), "true");
        assert_eq!(flag(false), "false");
    }

    #[test]
    fn rtt_is_scaled_to_seconds() {
        assert_eq!(micros_to_seconds(15_000.0), 0.015);
        assert_eq!(micros_to_seconds(0.0), 0.0);
        assert_eq!(micros_to_seconds(1_000_000.0), 1.0);
    }
}
