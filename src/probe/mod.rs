pub mod descriptors;
pub mod labels;
pub mod mapper;
pub mod runner;
pub mod schema;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, error, Instrument};
use uuid::Uuid;

pub use mapper::SampleSet;
pub use runner::Iperf3Runner;

// ─── Per-cycle input ─────────────────────────────────────────────

/// Everything one probe needs. Built by the HTTP layer from the
/// process defaults plus query parameters, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Host (or address) of the iperf3 server
    pub target: String,
    /// Hard deadline for the iperf3 process
    pub timeout: Duration,
    /// Path to the iperf3 binary
    pub iperf3_path: PathBuf,
    /// How long to transmit (`-t`)
    pub duration: Duration,
    /// Warm-up period excluded from the totals (`-O`)
    pub omit_duration: Duration,
    /// TCP maximum segment size (`-M`)
    pub mss: u32,
    /// Server sends, client receives (`-R`)
    pub reverse: bool,
}

// ─── Failures ────────────────────────────────────────────────────

/// Why a probe cycle produced no samples. Terminal, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("iperf3 did not finish within {0:?}")]
    Timeout(Duration),

    #[error("iperf3 execution failed: {detail}")]
    Execution { detail: String },

    #[error("cannot decode iperf3 output: {0}")]
    Decode(String),
}

// ─── Runner seam ─────────────────────────────────────────────────

/// Executes one measurement and hands back iperf3's raw stdout.
pub trait Runner: Send + Sync + 'static {
    fn run(
        &self,
        config: &ProbeConfig,
    ) -> impl Future<Output = Result<Vec<u8>, ProbeError>> + Send;
}

// ─── Collection cycle ────────────────────────────────────────────

/// Outcome of one cycle, ready for exposition.
#[derive(Debug)]
pub struct ProbeReport {
    pub success: bool,
    /// Always empty when `success` is false
    pub samples: SampleSet,
}

impl ProbeReport {
    fn failed() -> Self {
        Self {
            success: false,
            samples: SampleSet::new(),
        }
    }
}

/// Run → decode → flatten. Any failure is logged and collapses into a
/// report carrying only the failed success indicator.
pub async fn collect<R: Runner>(runner: &R, config: &ProbeConfig) -> ProbeReport {
    let span = tracing::info_span!(
        "probe",
        probe_id = %Uuid::new_v4(),
        target = %config.target,
    );

    async {
        debug!(
            iperf3_path = %config.iperf3_path.display(),
            duration = ?config.duration,
            omit_duration = ?config.omit_duration,
            mss = config.mss,
            reverse = config.reverse,
            "performing iperf3"
        );

        let raw = match runner.run(config).await {
            Ok(raw) => raw,
            Err(err) => {
                error!(%err, "iperf3 probe failed");
                return ProbeReport::failed();
            }
        };
        debug!(bytes = raw.len(), "iperf3 done");

        match mapper::flatten(&raw) {
            Ok(samples) => {
                debug!(samples = samples.len(), "flattened iperf3 results");
                ProbeReport {
                    success: true,
                    samples,
                }
            }
            Err(err) => {
                error!(%err, "deserialize iperf3 results failed");
                ProbeReport::failed()
            }
        }
    }
    .instrument(span)
    .await
}

// ─── Test doubles ────────────────────────────────────────────────

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::config::ProbeDefaults;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub const FIXTURE: &str = include_str!("testdata/two_sockets.json");

    /// Canned runner that counts invocations and remembers the last
    /// config it saw.
    pub struct FakeRunner {
        outcome: fn() -> Result<Vec<u8>, ProbeError>,
        pub calls: AtomicUsize,
        pub last_config: Mutex<Option<ProbeConfig>>,
    }

    impl FakeRunner {
        pub fn new(outcome: fn() -> Result<Vec<u8>, ProbeError>) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
                last_config: Mutex::new(None),
            }
        }

        pub fn fixture() -> Self {
            Self::new(|| Ok(FIXTURE.as_bytes().to_vec()))
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Runner for FakeRunner {
        async fn run(&self, config: &ProbeConfig) -> Result<Vec<u8>, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_config.lock().unwrap() = Some(config.clone());
            (self.outcome)()
        }
    }

    pub fn defaults() -> ProbeDefaults {
        ProbeDefaults {
            timeout: Duration::from_secs(30),
            iperf3_path: PathBuf::from("iperf3"),
            duration: Duration::from_secs(10),
            omit_duration: Duration::from_secs(5),
            mss: 1400,
        }
    }

    pub fn config(target: &str) -> ProbeConfig {
        ProbeConfig {
            target: target.into(),
            timeout: Duration::from_secs(30),
            iperf3_path: PathBuf::from("iperf3"),
            duration: Duration::from_secs(10),
            omit_duration: Duration::from_secs(5),
            mss: 1400,
            reverse: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{config, FakeRunner};
    use super::*;

    #[tokio::test]
    async fn successful_cycle_carries_all_samples() {
        let runner = FakeRunner::fixture();
        let report = collect(&runner, &config("10.0.0.9")).await;

        assert!(report.success);
        assert_eq!(report.samples.len(), 64);
        assert_eq!(runner.calls(), 1);
    }

    #[tokio::test]
    async fn runner_failures_leave_no_samples() {
        let outcomes: [fn() -> Result<Vec<u8>, ProbeError>; 3] = [
            || Err(ProbeError::Timeout(Duration::from_secs(30))),
            || {
                Err(ProbeError::Execution {
                    detail: "unable to connect to server".into(),
                })
            },
            || Err(ProbeError::Decode("eof".into())),
        ];

        for outcome in outcomes {
            let runner = FakeRunner::new(outcome);
            let report = collect(&runner, &config("10.0.0.9")).await;

            assert!(!report.success);
            assert!(report.samples.is_empty());
            assert_eq!(runner.calls(), 1);
        }
    }

    #[tokio::test]
    async fn undecodable_output_fails_the_cycle() {
        let runner = FakeRunner::new(|| Ok(b"{\"start\": {}}".to_vec()));
        let report = collect(&runner, &config("10.0.0.9")).await;

        assert!(!report.success);
        assert!(report.samples.is_empty());
    }
}
