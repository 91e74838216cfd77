//! Static catalogue of every metric the exporter can emit.
//!
//! Built at compile time and shared read-only by all probe cycles.

/// Kind of the exposed time series. iperf3 results are snapshots, so
/// everything is a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
}

/// Name, help text and label schema of one metric family.
#[derive(Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

const fn gauge(
    name: &'static str,
    help: &'static str,
    labels: &'static [&'static str],
) -> Descriptor {
    Descriptor {
        name,
        help,
        kind: MetricKind::Gauge,
        labels,
    }
}

const NO_LABELS: &[&str] = &[];
const INTERVAL_STREAM_LABELS: &[&str] = &["socket", "start", "end", "omitted", "sender"];
const INTERVAL_SUMMARY_LABELS: &[&str] = &["start", "end", "omitted", "sender"];
const END_STREAM_LABELS: &[&str] = &["socket", "start", "end", "sender"];

// ─── Probe outcome ───────────────────────────────────────────────

pub static SUCCESS: Descriptor = gauge("iperf3_success", "1 if probe was successful", NO_LABELS);

// ─── start ───────────────────────────────────────────────────────

pub static LOCAL_PORT: Descriptor =
    gauge("iperf3_local_port_info", "Local port", &["socket", "local_host"]);
pub static REMOTE_PORT: Descriptor =
    gauge("iperf3_remote_port_info", "Remote port", &["socket", "remote_host"]);
pub static VERSION: Descriptor =
    gauge("iperf3_version_info", "Iperf3 version information", &["version"]);
pub static SYSTEM_INFO: Descriptor =
    gauge("iperf3_system_info", "System information", &["system_info"]);
pub static TCP_MSS: Descriptor =
    gauge("iperf3_tcp_mss_bytes", "TCP maximum segment size", NO_LABELS);
pub static SOCKET_BUFFER_SIZE: Descriptor =
    gauge("iperf3_socket_buffer_size_bytes", "Socket buffer size", NO_LABELS);
pub static SEND_BUFFER_SIZE: Descriptor =
    gauge("iperf3_send_buffer_size_bytes", "Send buffer size", NO_LABELS);
pub static RECEIVE_BUFFER_SIZE: Descriptor =
    gauge("iperf3_receive_buffer_size_bytes", "Receive buffer size", NO_LABELS);

pub static PROTOCOL: Descriptor = gauge("iperf3_protocol_info", "Test protocol", &["protocol"]);
pub static NUM_STREAMS: Descriptor =
    gauge("iperf3_num_streams_info", "Number of streams", NO_LABELS);
pub static OMIT: Descriptor = gauge(
    "iperf3_omit_seconds",
    "Seconds to omit to skip past the TCP slow-start period",
    NO_LABELS,
);
pub static DURATION: Descriptor = gauge("iperf3_duration_seconds", "Test duration", NO_LABELS);
pub static BYTES: Descriptor = gauge("iperf3_bytes", "Test bytes to transfer", NO_LABELS);
pub static BLOCKS: Descriptor = gauge("iperf3_blocks_count", "Test blocks to transfer", NO_LABELS);
pub static REVERSE: Descriptor =
    gauge("iperf3_reverse_bool", "Whether the test ran in reverse", NO_LABELS);

// ─── intervals ───────────────────────────────────────────────────

pub static INTERVAL_STREAM_SECONDS: Descriptor = gauge(
    "iperf3_intervals_streams_seconds",
    "Duration of the interval in seconds",
    INTERVAL_STREAM_LABELS,
);
pub static INTERVAL_STREAM_BYTES: Descriptor = gauge(
    "iperf3_intervals_streams_bytes",
    "Bytes transferred in interval",
    INTERVAL_STREAM_LABELS,
);
pub static INTERVAL_STREAM_RETRANSMITS: Descriptor = gauge(
    "iperf3_intervals_streams_retransmits_count",
    "Retransmissions in interval",
    INTERVAL_STREAM_LABELS,
);
pub static INTERVAL_STREAM_CONGESTION_WINDOW: Descriptor = gauge(
    "iperf3_intervals_streams_congestion_window_size_byte",
    "TCP congestion window size in interval",
    INTERVAL_STREAM_LABELS,
);
pub static INTERVAL_STREAM_RTT: Descriptor = gauge(
    "iperf3_intervals_streams_round_trip_time_seconds",
    "Round trip time in interval",
    INTERVAL_STREAM_LABELS,
);
pub static INTERVAL_STREAM_RTT_VARIANCE: Descriptor = gauge(
    "iperf3_intervals_streams_round_trip_time_variance",
    "Round trip time variance in interval (seconds)",
    INTERVAL_STREAM_LABELS,
);
pub static INTERVAL_STREAM_PATH_MTU: Descriptor = gauge(
    "iperf3_intervals_streams_path_mtu",
    "Path MTU discovered in interval",
    INTERVAL_STREAM_LABELS,
);

pub static INTERVAL_SUMMARY_SECONDS: Descriptor = gauge(
    "iperf3_intervals_summary_seconds",
    "Duration of the interval in seconds",
    INTERVAL_SUMMARY_LABELS,
);
pub static INTERVAL_SUMMARY_BYTES: Descriptor = gauge(
    "iperf3_intervals_summary_bytes",
    "Total bytes transferred in interval",
    INTERVAL_SUMMARY_LABELS,
);
pub static INTERVAL_SUMMARY_RETRANSMITS: Descriptor = gauge(
    "iperf3_intervals_summary_retransmits_count",
    "Total retransmits in interval",
    INTERVAL_SUMMARY_LABELS,
);

// ─── end ─────────────────────────────────────────────────────────

pub static END_SENDER_SECONDS: Descriptor = gauge(
    "iperf3_end_streams_sender_seconds",
    "Total send time for stream",
    END_STREAM_LABELS,
);
pub static END_SENDER_BYTES: Descriptor = gauge(
    "iperf3_end_streams_sender_bytes",
    "Total bytes sent in stream",
    END_STREAM_LABELS,
);
pub static END_SENDER_RETRANSMITS: Descriptor = gauge(
    "iperf3_end_streams_sender_retransmits",
    "Total retransmit count in stream",
    END_STREAM_LABELS,
);
pub static END_SENDER_MAX_CONGESTION_WINDOW: Descriptor = gauge(
    "iperf3_end_streams_sender_max_send_congestion_window_bytes",
    "Maximum send congestion window size",
    END_STREAM_LABELS,
);
pub static END_SENDER_MAX_RTT: Descriptor = gauge(
    "iperf3_end_streams_sender_max_round_trip_time",
    "Maximum round trip time (seconds)",
    END_STREAM_LABELS,
);
pub static END_SENDER_MIN_RTT: Descriptor = gauge(
    "iperf3_end_streams_sender_min_round_trip_time",
    "Minimum round trip time (seconds)",
    END_STREAM_LABELS,
);
pub static END_SENDER_MEAN_RTT: Descriptor = gauge(
    "iperf3_end_streams_sender_mean_round_trip_time",
    "Mean round trip time (seconds)",
    END_STREAM_LABELS,
);

pub static END_RECEIVER_SECONDS: Descriptor = gauge(
    "iperf3_end_streams_receiver_seconds",
    "Total receive time for stream",
    END_STREAM_LABELS,
);
pub static END_RECEIVER_BYTES: Descriptor = gauge(
    "iperf3_end_streams_receiver_bytes",
    "Total received bytes in stream",
    END_STREAM_LABELS,
);

pub static SUM_SENT_SECONDS: Descriptor =
    gauge("iperf3_sum_sent_seconds", "Total send duration", NO_LABELS);
pub static SUM_SENT_BYTES: Descriptor =
    gauge("iperf3_sum_sent_bytes", "Total bytes sent", NO_LABELS);
pub static SUM_RECEIVED_SECONDS: Descriptor =
    gauge("iperf3_sum_received_seconds", "Total receive duration", NO_LABELS);
pub static SUM_RECEIVED_BYTES: Descriptor =
    gauge("iperf3_sum_received_bytes", "Total received bytes", NO_LABELS);

pub static CPU_HOST_TOTAL: Descriptor = gauge(
    "iperf3_cpu_utilization_host_total_percent",
    "CPU utilization host total",
    NO_LABELS,
);
pub static CPU_HOST_USER: Descriptor = gauge(
    "iperf3_cpu_utilization_host_user_percent",
    "CPU utilization host user",
    NO_LABELS,
);
pub static CPU_HOST_SYSTEM: Descriptor = gauge(
    "iperf3_cpu_utilization_host_system_percent",
    "CPU utilization host system",
    NO_LABELS,
);
pub static CPU_REMOTE_TOTAL: Descriptor = gauge(
    "iperf3_cpu_utilization_remote_total_percent",
    "CPU utilization remote total",
    NO_LABELS,
);
pub static CPU_REMOTE_USER: Descriptor = gauge(
    "iperf3_cpu_utilization_remote_user_percent",
    "CPU utilization remote user",
    NO_LABELS,
);
pub static CPU_REMOTE_SYSTEM: Descriptor = gauge(
    "iperf3_cpu_utilization_remote_system_percent",
    "CPU utilization remote system",
    NO_LABELS,
);

pub static SENDER_CONGESTION: Descriptor = gauge(
    "iperf3_sender_tcp_congestion_control_algorithm_info",
    "Sender TCP congestion control algorithm",
    &["algorithm"],
);
pub static RECEIVER_CONGESTION: Descriptor = gauge(
    "iperf3_receiver_tcp_congestion_control_algorithm_info",
    "Receiver TCP congestion control algorithm",
    &["algorithm"],
);

/// Every descriptor, in the order the mapper emits them. Listed on the
/// landing page.
pub static ALL: &[&Descriptor] = &[
    &SUCCESS,
    &LOCAL_PORT,
    &REMOTE_PORT,
    &VERSION,
    &SYSTEM_INFO,
    &TCP_MSS,
    &SOCKET_BUFFER_SIZE,
    &SEND_BUFFER_SIZE,
    &RECEIVE_BUFFER_SIZE,
    &PROTOCOL,
    &NUM_STREAMS,
    &OMIT,
    &DURATION,
    &BYTES,
    &BLOCKS,
    &REVERSE,
    &INTERVAL_STREAM_SECONDS,
    &INTERVAL_STREAM_BYTES,
    &INTERVAL_STREAM_RETRANSMITS,
    &INTERVAL_STREAM_CONGESTION_WINDOW,
    &INTERVAL_STREAM_RTT,
    &INTERVAL_STREAM_RTT_VARIANCE,
    &INTERVAL_STREAM_PATH_MTU,
    &INTERVAL_SUMMARY_SECONDS,
    &INTERVAL_SUMMARY_BYTES,
    &INTERVAL_SUMMARY_RETRANSMITS,
    &END_SENDER_SECONDS,
    &END_SENDER_BYTES,
    &END_SENDER_RETRANSMITS,
    &END_SENDER_MAX_CONGESTION_WINDOW,
    &END_SENDER_MAX_RTT,
    &END_SENDER_MIN_RTT,
    &END_SENDER_MEAN_RTT,
    &END_RECEIVER_SECONDS,
    &END_RECEIVER_BYTES,
    &SUM_SENT_SECONDS,
    &SUM_SENT_BYTES,
    &SUM_RECEIVED_SECONDS,
    &SUM_RECEIVED_BYTES,
    &CPU_HOST_TOTAL,
    &CPU_HOST_USER,
    &CPU_HOST_SYSTEM,
    &CPU_REMOTE_TOTAL,
    &CPU_REMOTE_USER,
    &CPU_REMOTE_SYSTEM,
    &SENDER_CONGESTION,
    &RECEIVER_CONGESTION,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = ALL.iter().map(|d| d.name).collect();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn label_keys_are_unique_per_descriptor() {
        for d in ALL {
            let keys: HashSet<_> = d.labels.iter().collect();
            assert_eq!(keys.len(), d.labels.len(), "{}", d.name);
        }
    }

    #[test]
    fn success_comes_first() {
        assert_eq!(ALL[0].name, "iperf3_success");
        assert!(ALL[0].labels.is_empty());
    }
}
