use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use super::{ProbeConfig, ProbeError, Runner};

/// Congestion control algorithm requested from iperf3 for every test.
pub const CONGESTION_ALGORITHM: &str = "reno";

// ─── Runner impl ─────────────────────────────────────────────────

/// Runs the real iperf3 binary named in `ProbeConfig::iperf3_path`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iperf3Runner;

impl Runner for Iperf3Runner {
    async fn run(&self, config: &ProbeConfig) -> Result<Vec<u8>, ProbeError> {
        let mut child = Command::new(&config.iperf3_path)
            .args(build_args(config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProbeError::Execution {
                detail: format!("cannot start {}: {e}", config.iperf3_path.display()),
            })?;

        // Drain both pipes while waiting so a chatty child never blocks
        // on a full pipe buffer. The deadline covers the drain too: a
        // grandchild can hold the pipes open after iperf3 itself exits.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let drains = [stdout.abort_handle(), stderr.abort_handle()];

        let finished = async {
            let status = child.wait().await?;
            let stdout = collect_pipe(stdout).await;
            let stderr = collect_pipe(stderr).await;
            Ok::<_, std::io::Error>((status, stdout, stderr))
        };
        let outcome = tokio::time::timeout(config.timeout, finished).await;

        let (status, stdout, stderr) = match outcome {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => {
                terminate(&mut child).await;
                drains.iter().for_each(AbortHandle::abort);
                return Err(ProbeError::Execution {
                    detail: format!("waiting for iperf3: {e}"),
                });
            }
            Err(_) => {
                terminate(&mut child).await;
                drains.iter().for_each(AbortHandle::abort);
                return Err(ProbeError::Timeout(config.timeout));
            }
        };

        if !status.success() {
            return Err(ProbeError::Execution {
                detail: failure_detail(status, &stdout, &stderr),
            });
        }

        Ok(stdout)
    }
}

// ─── Argument vector ─────────────────────────────────────────────

/// `-J -M <mss> -t <secs> -O <secs> -C reno [-R] -c <target>`
///
/// iperf3 only takes whole seconds, so durations are rounded.
pub fn build_args(config: &ProbeConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-J".into(),
        "-M".into(),
        config.mss.to_string().into(),
        "-t".into(),
        whole_seconds(config.duration).to_string().into(),
        "-O".into(),
        whole_seconds(config.omit_duration).to_string().into(),
        "-C".into(),
        CONGESTION_ALGORITHM.into(),
    ];
    if config.reverse {
        args.push("-R".into());
    }
    args.push("-c".into());
    args.push(config.target.as_str().into());
    args
}

fn whole_seconds(d: Duration) -> u64 {
    d.as_secs_f64().round() as u64
}

// ─── Process plumbing ────────────────────────────────────────────

fn drain<P>(pipe: Option<P>) -> JoinHandle<Vec<u8>>
where
    P: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                warn!(error = %e, "reading iperf3 output failed");
            }
        }
        buf
    })
}

async fn collect_pipe(handle: JoinHandle<Vec<u8>>) -> Vec<u8> {
    handle.await.unwrap_or_default()
}

/// Kill and reap. Never leaves the child running past this call.
async fn terminate(child: &mut Child) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    let pid = child.id();
    match child.kill().await {
        Ok(()) => debug!(?pid, "iperf3 killed"),
        Err(e) => warn!(error = %e, "failed to kill iperf3"),
    }
}

/// Best explanation for a non-zero exit: iperf3's own JSON `error`
/// field, then stderr, then the bare exit status.
fn failure_detail(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> String {
    let reported = serde_json::from_slice::<serde_json::Value>(stdout)
        .ok()
        .and_then(|doc| doc.get("error")?.as_str().map(str::to_owned));
    if let Some(msg) = reported {
        return format!("{status}: {msg}");
    }

    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::testing::config;
    use std::time::Instant;

    fn args(config: &ProbeConfig) -> Vec<String> {
        build_args(config)
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    #[test]
    fn forward_argument_vector() {
        assert_eq!(
            args(&config("10.0.0.9")),
            ["-J", "-M", "1400", "-t", "10", "-O", "5", "-C", "reno", "-c", "10.0.0.9"]
        );
    }

    #[test]
    fn reverse_adds_flag_before_target() {
        let mut cfg = config("iperf.example.net");
        cfg.reverse = true;
        cfg.mss = 535;
        assert_eq!(
            args(&cfg),
            [
                "-J", "-M", "535", "-t", "10", "-O", "5", "-C", "reno", "-R", "-c",
                "iperf.example.net",
            ]
        );
    }

    #[test]
    fn durations_round_to_whole_seconds() {
        let mut cfg = config("h");
        cfg.duration = Duration::from_millis(2_600);
        cfg.omit_duration = Duration::from_millis(400);
        let a = args(&cfg);
        assert_eq!(a[4], "3");
        assert_eq!(a[6], "0");
    }

    #[cfg(unix)]
    #[test]
    fn json_error_wins_over_stderr() {
        let status = exit_status(1);
        let stdout =
            br#"{"start": {}, "error": "unable to connect to server: Connection refused"}"#;

        let detail = failure_detail(status, stdout, b"ignored");
        assert!(detail.ends_with("unable to connect to server: Connection refused"));

        let detail = failure_detail(status, b"", b"  iperf3: parameter error\n");
        assert!(detail.ends_with("iperf3: parameter error"));

        assert_eq!(failure_detail(status, b"", b""), status.to_string());
    }

    #[cfg(unix)]
    fn exit_status(code: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_returned_verbatim() {
        // echo ignores every flag and prints the argument vector back
        let mut cfg = config("10.0.0.9");
        cfg.iperf3_path = "echo".into();

        let out = Iperf3Runner.run(&cfg).await.unwrap();
        assert_eq!(out, b"-J -M 1400 -t 10 -O 5 -C reno -c 10.0.0.9\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_an_execution_error() {
        let mut cfg = config("10.0.0.9");
        cfg.iperf3_path = "false".into();

        let err = Iperf3Runner.run(&cfg).await.unwrap_err();
        assert!(matches!(err, ProbeError::Execution { .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_an_execution_error() {
        let mut cfg = config("10.0.0.9");
        cfg.iperf3_path = "/nonexistent/iperf3".into();

        match Iperf3Runner.run(&cfg).await {
            Err(ProbeError::Execution { detail }) => assert!(detail.contains("cannot start")),
            other => panic!("expected execution error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn inherited_pipes_do_not_outlive_the_deadline() {
        use std::os::unix::fs::PermissionsExt;

        // the shell exits at once, its background sleep keeps stdout open
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("iperf3");
        std::fs::write(&script, "#!/bin/sh\nsleep 5 &\nexit 0\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut cfg = config("10.0.0.9");
        cfg.iperf3_path = script;
        cfg.timeout = Duration::from_millis(200);

        let started = Instant::now();
        let err = Iperf3Runner.run(&cfg).await.unwrap_err();

        assert!(matches!(err, ProbeError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_is_killed_at_the_deadline() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("iperf3");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut cfg = config("10.0.0.9");
        cfg.iperf3_path = script;
        cfg.timeout = Duration::from_millis(200);

        let started = Instant::now();
        let err = Iperf3Runner.run(&cfg).await.unwrap_err();

        assert!(matches!(err, ProbeError::Timeout(t) if t == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
