use serde::Deserialize;

// ─── Result tree ─────────────────────────────────────────────────
//
// Mirrors the document iperf3 prints with `-J`. Only the fields the
// exporter re-emits are modelled; serde skips everything else.
// Fields iperf3 leaves out on some platforms (TCP_INFO extras) or for
// some protocols default to zero instead of failing the decode.

/// Whole `-J` document.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultTree {
    pub start: Start,
    pub intervals: Vec<Interval>,
    pub end: End,
}

// ─── start ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Start {
    /// One entry per socket, in the order iperf3 opened them.
    pub connected: Vec<Connected>,
    pub version: String,
    pub system_info: String,
    #[serde(default)]
    pub tcp_mss: u64,
    #[serde(rename = "sock_bufsize", default)]
    pub socket_buffer_size: u64,
    #[serde(rename = "sndbuf_actual", default)]
    pub send_buffer_size: u64,
    #[serde(rename = "rcvbuf_actual", default)]
    pub receive_buffer_size: u64,
    pub test_start: TestParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connected {
    pub socket: i32,
    pub local_host: String,
    pub local_port: u16,
    pub remote_host: String,
    pub remote_port: u16,
}

/// The `test_start` record: what the client asked for.
#[derive(Debug, Clone, Deserialize)]
pub struct TestParameters {
    pub protocol: String,
    pub num_streams: u32,
    /// Warm-up seconds excluded from the totals
    pub omit: u64,
    /// Requested duration (seconds)
    pub duration: u64,
    /// Byte target (0 = time-bounded test)
    pub bytes: u64,
    /// Block target (0 = time-bounded test)
    pub blocks: u64,
    /// 1 when the server sends and the client receives
    pub reverse: u8,
}

// ─── intervals ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Interval {
    pub streams: Vec<StreamSample>,
    #[serde(rename = "sum")]
    pub summary: IntervalSummary,
}

/// One socket's statistics for one interval window.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSample {
    pub socket: i32,
    pub start: f64,
    pub end: f64,
    pub seconds: f64,
    pub bytes: u64,
    #[serde(default)]
    pub retransmits: u64,
    #[serde(rename = "snd_cwnd", default)]
    pub congestion_window: u64,
    /// Microseconds
    #[serde(rename = "rtt", default)]
    pub round_trip_time: f64,
    /// Microseconds
    #[serde(rename = "rttvar", default)]
    pub round_trip_time_variance: f64,
    #[serde(rename = "pmtu", default)]
    pub path_mtu: u64,
    pub omitted: bool,
    pub sender: bool,
}

/// All sockets of one interval window added together.
#[derive(Debug, Clone, Deserialize)]
pub struct IntervalSummary {
    pub start: f64,
    pub end: f64,
    pub seconds: f64,
    pub bytes: u64,
    #[serde(default)]
    pub retransmits: u64,
    pub omitted: bool,
    pub sender: bool,
}

// ─── end ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct End {
    pub streams: Vec<EndStream>,
    #[serde(rename = "sum_sent")]
    pub sent: Totals,
    #[serde(rename = "sum_received")]
    pub received: Totals,
    #[serde(rename = "cpu_utilization_percent")]
    pub cpu: CpuUtilization,
    #[serde(rename = "sender_tcp_congestion", default)]
    pub sender_congestion: String,
    #[serde(rename = "receiver_tcp_congestion", default)]
    pub receiver_congestion: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndStream {
    pub sender: SenderSummary,
    pub receiver: ReceiverSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenderSummary {
    pub socket: i32,
    pub start: f64,
    pub end: f64,
    pub seconds: f64,
    pub bytes: u64,
    #[serde(default)]
    pub retransmits: u64,
    #[serde(rename = "max_snd_cwnd", default)]
    pub max_congestion_window: u64,
    /// Microseconds
    #[serde(rename = "max_rtt", default)]
    pub max_round_trip_time: f64,
    /// Microseconds
    #[serde(rename = "min_rtt", default)]
    pub min_round_trip_time: f64,
    /// Microseconds
    #[serde(rename = "mean_rtt", default)]
    pub mean_round_trip_time: f64,
    pub sender: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiverSummary {
    pub socket: i32,
    pub start: f64,
    pub end: f64,
    pub seconds: f64,
    pub bytes: u64,
    pub sender: bool,
}

/// `sum_sent` / `sum_received`
#[derive(Debug, Clone, Deserialize)]
pub struct Totals {
    pub seconds: f64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpuUtilization {
    pub host_total: f64,
    pub host_user: f64,
    pub host_system: f64,
    pub remote_total: f64,
    pub remote_user: f64,
    pub remote_system: f64,
}

// ─── Invariants ──────────────────────────────────────────────────

impl ResultTree {
    /// Structural checks serde cannot express. Returns a message
    /// describing the first violation.
    pub fn validate(&self) -> Result<(), String> {
        let declared = self.start.test_start.num_streams as usize;
        let connected = self.start.connected.len();
        if connected != declared {
            return Err(format!(
                "start.connected has {connected} entries but test_start.num_streams is {declared}"
            ));
        }

        if let Some(first) = self.intervals.first() {
            let width = first.streams.len();
            for (i, interval) in self.intervals.iter().enumerate() {
                if interval.streams.len() != width {
                    return Err(format!(
                        "interval {i} has {} streams, expected {width}",
                        interval.streams.len()
                    ));
                }
            }
        }

        Ok(())
    }
}
