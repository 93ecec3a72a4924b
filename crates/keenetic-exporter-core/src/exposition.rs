//! Prometheus text exposition of a store snapshot.
//!
//! Output is built fresh for every scrape by walking the snapshot: one
//! gauge family per [`MetricField`], one series per device, labelled with
//! `device_name` and `device_ip`.

use crate::metrics::MetricField;
use crate::store::DeviceRecord;
use std::fmt::{self, Write};

/// Content type of the rendered body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render a snapshot in the text exposition format.
///
/// The same snapshot always renders to the same bytes. A family that
/// cannot be formatted is left out and the rest is still returned.
#[must_use]
pub fn render(snapshot: &[DeviceRecord]) -> Vec<u8> {
    let mut output = String::new();

    for field in MetricField::ALL {
        let mut family = String::new();
        match write_family(&mut family, field, snapshot) {
            Ok(()) => output.push_str(&family),
            Err(e) => {
                tracing::warn!(metric = field.metric_name(), error = %e, "Dropping metric family from scrape");
            }
        }
    }

    output.into_bytes()
}

fn write_family(out: &mut String, field: MetricField, snapshot: &[DeviceRecord]) -> fmt::Result {
    let name = field.metric_name();
    writeln!(out, "# HELP {name} {}", field.help())?;
    writeln!(out, "# TYPE {name} gauge")?;

    for record in snapshot {
        writeln!(
            out,
            "{name}{{device_name=\"{}\",device_ip=\"{}\"}} {}",
            LabelValue(&record.config.name),
            LabelValue(&record.config.id),
            GaugeValue(record.metrics.gauge_value(field)),
        )?;
    }

    Ok(())
}

/// Label value with `\`, `"` and newline escaped.
struct LabelValue<'a>(&'a str);

impl fmt::Display for LabelValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '\\' => f.write_str("\\\\")?,
                '"' => f.write_str("\\\"")?,
                '\n' => f.write_str("\\n")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

struct GaugeValue(f64);

impl fmt::Display for GaugeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            f.write_str("NaN")
        } else if v.is_infinite() {
            f.write_str(if v.is_sign_positive() { "+Inf" } else { "-Inf" })
        } else {
            write!(f, "{v}")
        }
    }
}
