use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Smallest MSS iperf3 accepts (RFC 879 minimum plus headers).
pub const MIN_MSS: u32 = 535;

// ─── CLI ─────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "iperf3-exporter", about = "Prometheus probe exporter for iperf3", version)]
pub struct Args {
    /// Address to listen on for the probe endpoint and landing page.
    #[arg(
        long = "web.listen-address",
        env = "IPERF3_EXPORTER_LISTEN",
        default_value = "0.0.0.0:9579",
    )]
    pub listen_address: SocketAddr,

    /// Log filter (a level such as `debug`, or a full tracing directive).
    /// `RUST_LOG` takes precedence when set.
    #[arg(long = "log.level", env = "IPERF3_EXPORTER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Hard deadline for one iperf3 run.
    #[arg(
        long = "iperf3.timeout",
        env = "IPERF3_EXPORTER_TIMEOUT",
        default_value = "30s",
        value_parser = parse_duration,
    )]
    pub timeout: Duration,

    /// iperf3 binary path.
    #[arg(long = "iperf3.path", env = "IPERF3_EXPORTER_IPERF3_PATH", default_value = "iperf3")]
    pub iperf3_path: PathBuf,

    /// Default time to transmit for.
    #[arg(
        long = "iperf3.time",
        env = "IPERF3_EXPORTER_TIME",
        default_value = "10s",
        value_parser = parse_duration,
    )]
    pub duration: Duration,

    /// Default warm-up to omit, skipping past TCP slow-start.
    #[arg(
        long = "iperf3.omit-time",
        env = "IPERF3_EXPORTER_OMIT_TIME",
        default_value = "5s",
        value_parser = parse_duration,
    )]
    pub omit_duration: Duration,

    /// Default TCP maximum segment size (MTU - 40 bytes).
    #[arg(
        long = "iperf3.mss",
        env = "IPERF3_EXPORTER_MSS",
        default_value = "1400",
        value_parser = parse_mss,
    )]
    pub mss: u32,
}

/// Process-wide probe settings that requests may override.
#[derive(Debug, Clone)]
pub struct ProbeDefaults {
    pub timeout: Duration,
    pub iperf3_path: PathBuf,
    pub duration: Duration,
    pub omit_duration: Duration,
    pub mss: u32,
}

impl From<&Args> for ProbeDefaults {
    fn from(args: &Args) -> Self {
        Self {
            timeout: args.timeout,
            iperf3_path: args.iperf3_path.clone(),
            duration: args.duration,
            omit_duration: args.omit_duration,
            mss: args.mss,
        }
    }
}

// ─── Value parsers ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration {input:?}: {reason}")]
pub struct DurationError {
    pub input: String,
    pub reason: &'static str,
}

/// Parse a duration such as `5s`, `1m30s`, `1.5s` or `250ms`.
///
/// A sequence of decimal numbers, each with an optional fraction and a
/// unit suffix (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`). A bare `0` is
/// accepted; negative durations are not.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let fail = |reason| DurationError {
        input: input.to_string(),
        reason,
    };

    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.starts_with('-') {
        return Err(fail("negative durations are not allowed"));
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(fail("empty"));
    }

    let mut nanos: f64 = 0.0;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (num, tail) = rest.split_at(num_len);
        if num.is_empty() || num == "." {
            return Err(fail("expected a number"));
        }
        let value: f64 = num.parse().map_err(|_| fail("malformed number"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(fail("missing unit")),
            _ => return Err(fail("unknown unit")),
        };

        nanos += value * scale;
        rest = tail;
    }

    if nanos > u64::MAX as f64 {
        return Err(fail("out of range"));
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Accepts the usual spellings: `1 t T TRUE true True` and
/// `0 f F FALSE false False`.
pub fn parse_bool(input: &str) -> Option<bool> {
    match input {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Integer MSS no smaller than [`MIN_MSS`].
pub fn parse_mss(input: &str) -> Result<u32, String> {
    match input.parse::<u32>() {
        Ok(mss) if mss >= MIN_MSS => Ok(mss),
        _ => Err(format!("mss must be an integer >= {MIN_MSS}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_durations() {
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration("+3s"), Ok(Duration::from_secs(3)));
    }

    #[test]
    fn compound_and_fractional_durations() {
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_duration("1h2m3s4ms"), Ok(Duration::from_millis(3_723_004)));
        assert_eq!(parse_duration("10us"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration("10µs"), Ok(Duration::from_micros(10)));
    }

    #[test]
    fn rejected_durations() {
        for bad in ["", "5", "s", "abc", "5x", "-5s", "1..5s", ".s", "5s3"] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should be rejected");
        }
        assert_eq!(
            parse_duration("-1s").unwrap_err().reason,
            "negative durations are not allowed"
        );
    }

    #[test]
    fn bool_spellings() {
        for t in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(t), Some(true));
        }
        for f in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(f), Some(false));
        }
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool("tRUE"), None);
    }

    #[test]
    fn mss_lower_bound() {
        assert_eq!(parse_mss("535"), Ok(535));
        assert_eq!(parse_mss("1400"), Ok(1400));
        assert!(parse_mss("534").is_err());
        assert!(parse_mss("400").is_err());
        assert!(parse_mss("-1").is_err());
        assert!(parse_mss("fast").is_err());
    }

    #[test]
    fn cli_defaults() {
        let args = Args::try_parse_from(["iperf3-exporter"]).unwrap();
        let defaults = ProbeDefaults::from(&args);

        assert_eq!(args.listen_address.port(), 9579);
        assert_eq!(defaults.timeout, Duration::from_secs(30));
        assert_eq!(defaults.duration, Duration::from_secs(10));
        assert_eq!(defaults.omit_duration, Duration::from_secs(5));
        assert_eq!(defaults.mss, 1400);
        assert_eq!(defaults.iperf3_path, PathBuf::from("iperf3"));
    }

    #[test]
    fn cli_rejects_small_mss() {
        assert!(Args::try_parse_from(["iperf3-exporter", "--iperf3.mss", "500"]).is_err());
        let args =
            Args::try_parse_from(["iperf3-exporter", "--iperf3.time", "1m", "--iperf3.mss", "535"])
                .unwrap();
        assert_eq!(args.duration, Duration::from_secs(60));
        assert_eq!(args.mss, 535);
    }
}
