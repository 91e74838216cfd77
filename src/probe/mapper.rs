use super::descriptors::{self as d, Descriptor, MetricKind};
use super::labels;
use super::schema::{
    CpuUtilization, IntervalSummary, ReceiverSummary, ResultTree, SenderSummary, Start,
    StreamSample, TestParameters, Totals,
};
use super::ProbeError;

// ─── Output types ────────────────────────────────────────────────

/// One labeled value. `labels` lines up positionally with
/// `descriptor.labels`.
#[derive(Debug, Clone)]
pub struct Sample {
    pub descriptor: &'static Descriptor,
    pub value: f64,
    pub labels: Vec<String>,
}

impl Sample {
    pub fn kind(&self) -> MetricKind {
        self.descriptor.kind
    }

    /// Value of one label by key.
    #[cfg(test)]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.descriptor
            .labels
            .iter()
            .position(|k| *k == key)
            .map(|i| self.labels[i].as_str())
    }
}

/// Ordered samples produced from one result tree.
pub type SampleSet = Vec<Sample>;

// ─── Field tables ────────────────────────────────────────────────
//
// One table per nesting level. Each row pairs a descriptor with the
// accessor that reads (and, for RTTs, converts) the raw field.

struct Field<T> {
    descriptor: &'static Descriptor,
    value: fn(&T) -> f64,
}

static START_FIELDS: &[Field<Start>] = &[
    Field {
        descriptor: &d::TCP_MSS,
        value: |s| s.tcp_mss as f64,
    },
    Field {
        descriptor: &d::SOCKET_BUFFER_SIZE,
        value: |s| s.socket_buffer_size as f64,
    },
    Field {
        descriptor: &d::SEND_BUFFER_SIZE,
        value: |s| s.send_buffer_size as f64,
    },
    Field {
        descriptor: &d::RECEIVE_BUFFER_SIZE,
        value: |s| s.receive_buffer_size as f64,
    },
];

static TEST_FIELDS: &[Field<TestParameters>] = &[
    Field {
        descriptor: &d::NUM_STREAMS,
        value: |t| t.num_streams as f64,
    },
    Field {
        descriptor: &d::OMIT,
        value: |t| t.omit as f64,
    },
    Field {
        descriptor: &d::DURATION,
        value: |t| t.duration as f64,
    },
    Field {
        descriptor: &d::BYTES,
        value: |t| t.bytes as f64,
    },
    Field {
        descriptor: &d::BLOCKS,
        value: |t| t.blocks as f64,
    },
    Field {
        descriptor: &d::REVERSE,
        value: |t| t.reverse as f64,
    },
];

static INTERVAL_STREAM_FIELDS: &[Field<StreamSample>] = &[
    Field {
        descriptor: &d::INTERVAL_STREAM_SECONDS,
        value: |s| s.seconds,
    },
    Field {
        descriptor: &d::INTERVAL_STREAM_BYTES,
        value: |s| s.bytes as f64,
    },
    Field {
        descriptor: &d::INTERVAL_STREAM_RETRANSMITS,
        value: |s| s.retransmits as f64,
    },
    Field {
        descriptor: &d::INTERVAL_STREAM_CONGESTION_WINDOW,
        value: |s| s.congestion_window as f64,
    },
    Field {
        descriptor: &d::INTERVAL_STREAM_RTT,
        value: |s| labels::micros_to_seconds(s.round_trip_time),
    },
    Field {
        descriptor: &d::INTERVAL_STREAM_RTT_VARIANCE,
        value: |s| labels::micros_to_seconds(s.round_trip_time_variance),
    },
    Field {
        descriptor: &d::INTERVAL_STREAM_PATH_MTU,
        value: |s| s.path_mtu as f64,
    },
];

static INTERVAL_SUMMARY_FIELDS: &[Field<IntervalSummary>] = &[
    Field {
        descriptor: &d::INTERVAL_SUMMARY_SECONDS,
        value: |s| s.seconds,
    },
    Field {
        descriptor: &d::INTERVAL_SUMMARY_BYTES,
        value: |s| s.bytes as f64,
    },
    Field {
        descriptor: &d::INTERVAL_SUMMARY_RETRANSMITS,
        value: |s| s.retransmits as f64,
    },
];

static END_SENDER_FIELDS: &[Field<SenderSummary>] = &[
    Field {
        descriptor: &d::END_SENDER_SECONDS,
        value: |s| s.seconds,
    },
    Field {
        descriptor: &d::END_SENDER_BYTES,
        value: |s| s.bytes as f64,
    },
    Field {
        descriptor: &d::END_SENDER_RETRANSMITS,
        value: |s| s.retransmits as f64,
    },
    Field {
        descriptor: &d::END_SENDER_MAX_CONGESTION_WINDOW,
        value: |s| s.max_congestion_window as f64,
    },
    Field {
        descriptor: &d::END_SENDER_MAX_RTT,
        value: |s| labels::micros_to_seconds(s.max_round_trip_time),
    },
    Field {
        descriptor: &d::END_SENDER_MIN_RTT,
        value: |s| labels::micros_to_seconds(s.min_round_trip_time),
    },
    Field {
        descriptor: &d::END_SENDER_MEAN_RTT,
        value: |s| labels::micros_to_seconds(s.mean_round_trip_time),
    },
];

static END_RECEIVER_FIELDS: &[Field<ReceiverSummary>] = &[
    Field {
        descriptor: &d::END_RECEIVER_SECONDS,
        value: |r| r.seconds,
    },
    Field {
        descriptor: &d::END_RECEIVER_BYTES,
        value: |r| r.bytes as f64,
    },
];

static SENT_FIELDS: &[Field<Totals>] = &[
    Field {
        descriptor: &d::SUM_SENT_SECONDS,
        value: |t| t.seconds,
    },
    Field {
        descriptor: &d::SUM_SENT_BYTES,
        value: |t| t.bytes as f64,
    },
];

static RECEIVED_FIELDS: &[Field<Totals>] = &[
    Field {
        descriptor: &d::SUM_RECEIVED_SECONDS,
        value: |t| t.seconds,
    },
    Field {
        descriptor: &d::SUM_RECEIVED_BYTES,
        value: |t| t.bytes as f64,
    },
];

static CPU_FIELDS: &[Field<CpuUtilization>] = &[
    Field {
        descriptor: &d::CPU_HOST_TOTAL,
        value: |c| c.host_total,
    },
    Field {
        descriptor: &d::CPU_HOST_USER,
        value: |c| c.host_user,
    },
    Field {
        descriptor: &d::CPU_HOST_SYSTEM,
        value: |c| c.host_system,
    },
    Field {
        descriptor: &d::CPU_REMOTE_TOTAL,
        value: |c| c.remote_total,
    },
    Field {
        descriptor: &d::CPU_REMOTE_USER,
        value: |c| c.remote_user,
    },
    Field {
        descriptor: &d::CPU_REMOTE_SYSTEM,
        value: |c| c.remote_system,
    },
];

// ─── Public entry point ──────────────────────────────────────────

/// Decode iperf3's `-J` output and flatten it into samples.
///
/// All-or-nothing: a document that fails to decode or violates the
/// tree invariants yields an error and no samples.
pub fn flatten(raw: &[u8]) -> Result<SampleSet, ProbeError> {
    let tree: ResultTree =
        serde_json::from_slice(raw).map_err(|e| ProbeError::Decode(e.to_string()))?;
    tree.validate().map_err(ProbeError::Decode)?;
    Ok(walk(&tree))
}

fn walk(tree: &ResultTree) -> SampleSet {
    let mut out = Emitter::default();
    let start = &tree.start;

    // ── start ───────────────────────────────────────────────────
    for conn in &start.connected {
        let socket = labels::int(conn.socket);
        out.emit(
            &d::LOCAL_PORT,
            conn.local_port as f64,
            vec![socket.clone(), conn.local_host.clone()],
        );
        out.emit(
            &d::REMOTE_PORT,
            conn.remote_port as f64,
            vec![socket, conn.remote_host.clone()],
        );
    }
    out.info(&d::VERSION, &start.version);
    out.info(&d::SYSTEM_INFO, &start.system_info);
    out.fields(START_FIELDS, start, &[]);
    out.info(&d::PROTOCOL, &start.test_start.protocol);
    out.fields(TEST_FIELDS, &start.test_start, &[]);

    // ── intervals ───────────────────────────────────────────────
    for interval in &tree.intervals {
        for stream in &interval.streams {
            let key = [
                labels::int(stream.socket),
                labels::window(stream.start),
                labels::window(stream.end),
                labels::flag(stream.omitted),
                labels::flag(stream.sender),
            ];
            out.fields(INTERVAL_STREAM_FIELDS, stream, &key);
        }

        let sum = &interval.summary;
        let key = [
            labels::window(sum.start),
            labels::window(sum.end),
            labels::flag(sum.omitted),
            labels::flag(sum.sender),
        ];
        out.fields(INTERVAL_SUMMARY_FIELDS, sum, &key);
    }

    // ── end ─────────────────────────────────────────────────────
    let end = &tree.end;
    for stream in &end.streams {
        let s = &stream.sender;
        let key = [
            labels::int(s.socket),
            labels::window(s.start),
            labels::window(s.end),
            labels::flag(s.sender),
        ];
        out.fields(END_SENDER_FIELDS, s, &key);

        let r = &stream.receiver;
        let key = [
            labels::int(r.socket),
            labels::window(r.start),
            labels::window(r.end),
            labels::flag(r.sender),
        ];
        out.fields(END_RECEIVER_FIELDS, r, &key);
    }

    out.fields(SENT_FIELDS, &end.sent, &[]);
    out.fields(RECEIVED_FIELDS, &end.received, &[]);
    out.fields(CPU_FIELDS, &end.cpu, &[]);
    out.info(&d::SENDER_CONGESTION, &end.sender_congestion);
    out.info(&d::RECEIVER_CONGESTION, &end.receiver_congestion);

    out.samples
}

// ─── Emitter ─────────────────────────────────────────────────────

#[derive(Default)]
struct Emitter {
    samples: SampleSet,
}

impl Emitter {
    /// The single emission point every table row goes through.
    fn emit(&mut self, descriptor: &'static Descriptor, value: f64, labels: Vec<String>) {
        debug_assert_eq!(
            labels.len(),
            descriptor.labels.len(),
            "label arity mismatch for {}",
            descriptor.name
        );
        self.samples.push(Sample {
            descriptor,
            value,
            labels,
        });
    }

    fn fields<T>(&mut self, table: &[Field<T>], record: &T, key: &[String]) {
        for field in table {
            self.emit(field.descriptor, (field.value)(record), key.to_vec());
        }
    }

    /// Identity metric: value 1, the string carried in its only label.
    fn info(&mut self, descriptor: &'static Descriptor, label: &str) {
        self.emit(descriptor, 1.0, vec![label.to_owned()]);
    }
}
