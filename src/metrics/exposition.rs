use std::collections::hash_map::Entry;
use std::collections::HashMap;

use prometheus::core::Collector;
use prometheus::{Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::probe::descriptors::{self, Descriptor, MetricKind};
use crate::probe::ProbeReport;

/// `text/plain; version=0.0.4`
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

// ─── Rendering ───────────────────────────────────────────────────

/// Render one probe report in the Prometheus text format.
///
/// `iperf3_success` always comes first. Everything else goes through a
/// registry built for this call only, so nothing leaks between scrapes.
pub fn render(report: &ProbeReport) -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let mut out = String::new();

    let success = Gauge::with_opts(Opts::new(
        descriptors::SUCCESS.name,
        descriptors::SUCCESS.help,
    ))?;
    success.set(if report.success { 1.0 } else { 0.0 });
    encoder.encode_utf8(&success.collect(), &mut out)?;

    if report.samples.is_empty() {
        return Ok(out);
    }

    let registry = Registry::new();
    let mut families: HashMap<&'static str, GaugeVec> = HashMap::new();

    for sample in &report.samples {
        let family = match families.entry(sample.descriptor.name) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let family = new_family(sample.descriptor)?;
                registry.register(Box::new(family.clone()))?;
                e.insert(family)
            }
        };

        let values: Vec<&str> = sample.labels.iter().map(String::as_str).collect();
        match sample.kind() {
            MetricKind::Gauge => family
                .get_metric_with_label_values(&values)?
                .set(sample.value),
        }
    }

    encoder.encode_utf8(&registry.gather(), &mut out)?;
    Ok(out)
}

fn new_family(descriptor: &Descriptor) -> prometheus::Result<GaugeVec> {
    match descriptor.kind {
        MetricKind::Gauge => GaugeVec::new(
            Opts::new(descriptor.name, descriptor.help),
            descriptor.labels,
        ),
    }
}
