//! Rendering trace records as text.

use std::fmt::Write;
use std::time::Duration;

use retort_foundation::Value;

use super::record::{TraceEvent, TraceRecord};

/// Renders trace records.
pub trait TraceFormatter {
    /// Appends one rendered record to `out`.
    fn write_record(&self, out: &mut String, record: &TraceRecord);

    /// Renders one record.
    fn format(&self, record: &TraceRecord) -> String {
        let mut out = String::new();
        self.write_record(&mut out, record);
        out
    }

    /// Renders several records, one per line.
    fn format_many(&self, records: &[&TraceRecord]) -> String {
        let mut out = String::new();
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            self.write_record(&mut out, record);
        }
        out
    }
}

// =============================================================================
// Human
// =============================================================================

/// One line per record: step, then the event indented by how deep in the
/// network it happened.
///
/// ```text
/// S0003 +FACT f-1
/// S0003   +WME (f-1 color red)
/// S0003     +NODE n4 join
/// ```
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    /// Prefix lines with the record id.
    pub show_ids: bool,
    /// Show time since the tracer started.
    pub show_timestamps: bool,
}

impl HumanFormatter {
    /// Creates a formatter showing only steps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also show record ids.
    #[must_use]
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }

    /// Also show elapsed time.
    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamps = true;
        self
    }
}

fn indent(event: &TraceEvent) -> usize {
    match event {
        TraceEvent::FactAdded { .. }
        | TraceEvent::FactRemoved { .. }
        | TraceEvent::ProductionAdded { .. }
        | TraceEvent::ProductionRemoved { .. }
        | TraceEvent::MatchFired { .. } => 0,
        TraceEvent::WmeAdded { .. }
        | TraceEvent::WmeRemoved { .. }
        | TraceEvent::ActivationAdded { .. }
        | TraceEvent::ActivationRemoved { .. } => 2,
        TraceEvent::NodeCreated { .. }
        | TraceEvent::NodeRemoved { .. }
        | TraceEvent::AlphaMemoryCreated { .. }
        | TraceEvent::AlphaMemoryRemoved { .. } => 4,
    }
}

impl TraceFormatter for HumanFormatter {
    fn write_record(&self, out: &mut String, record: &TraceRecord) {
        if self.show_ids {
            let _ = write!(out, "[{:06}] ", record.id);
        }
        let _ = write!(out, "S{:04} ", record.step);
        if self.show_timestamps {
            let elapsed = format!("{:?}", Duration::from_nanos(record.timestamp_ns));
            let _ = write!(out, "{elapsed:>10} ");
        }
        let _ = write!(out, "{:width$}", "", width = indent(&record.event));

        let _ = match &record.event {
            TraceEvent::FactAdded { fact } => write!(out, "+FACT {fact}"),
            TraceEvent::FactRemoved { fact } => write!(out, "-FACT {fact}"),
            TraceEvent::WmeAdded { wme } => write!(out, "+WME {wme}"),
            TraceEvent::WmeRemoved { wme } => write!(out, "-WME {wme}"),
            TraceEvent::ProductionAdded { production, name } => {
                write!(out, "+PRODUCTION {production} {name}")
            }
            TraceEvent::ProductionRemoved { production, name } => {
                write!(out, "-PRODUCTION {production} {name}")
            }
            TraceEvent::NodeCreated { node, kind } => write!(out, "+NODE {node} {kind}"),
            TraceEvent::NodeRemoved { node, kind } => write!(out, "-NODE {node} {kind}"),
            TraceEvent::AlphaMemoryCreated { memory, key } => {
                write!(out, "+ALPHA {memory} {key}")
            }
            TraceEvent::AlphaMemoryRemoved { memory } => write!(out, "-ALPHA {memory}"),
            TraceEvent::ActivationAdded { production, token } => {
                write!(out, "ACTIVATED {production} {token}")
            }
            TraceEvent::ActivationRemoved { production, token } => {
                write!(out, "DEACTIVATED {production} {token}")
            }
            TraceEvent::MatchFired { production, token } => {
                write!(out, "FIRING {production} {token}")
            }
        };
    }
}

// =============================================================================
// JSON
// =============================================================================

/// One JSON object per record; lists render as a JSON array.
///
/// Ids render as their display strings (`"f-1"`, `"n4"`). Non-finite floats
/// render as `null`.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    /// Put each record of a list on its own line.
    pub pretty: bool,
}

impl JsonFormatter {
    /// Creates a compact formatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One record per line in lists.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

fn push_json_str(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn push_json_value(out: &mut String, value: &Value) {
    match value {
        Value::Nil => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Float(f) if f.is_finite() => {
            let _ = write!(out, "{f:?}");
        }
        Value::Float(_) => out.push_str("null"),
        Value::String(s) => push_json_str(out, s),
        Value::FactRef(id) => push_json_str(out, &id.to_string()),
    }
}

/// Appends `,"key":"display"`.
fn push_field(out: &mut String, key: &str, value: &impl std::fmt::Display) {
    let _ = write!(out, ",\"{key}\":");
    push_json_str(out, &value.to_string());
}

impl TraceFormatter for JsonFormatter {
    fn write_record(&self, out: &mut String, record: &TraceRecord) {
        let _ = write!(
            out,
            "{{\"id\":{},\"step\":{},\"timestamp_ns\":{},\"type\":\"{}\"",
            record.id,
            record.step,
            record.timestamp_ns,
            record.event_type()
        );
        match &record.event {
            TraceEvent::FactAdded { fact } | TraceEvent::FactRemoved { fact } => {
                push_field(out, "fact", fact);
            }
            TraceEvent::WmeAdded { wme } | TraceEvent::WmeRemoved { wme } => {
                out.push_str(",\"wme\":[");
                push_json_value(out, &wme.identifier);
                out.push(',');
                push_json_value(out, &wme.attribute);
                out.push(',');
                push_json_value(out, &wme.value);
                out.push(']');
            }
            TraceEvent::ProductionAdded { production, name }
            | TraceEvent::ProductionRemoved { production, name } => {
                push_field(out, "production", production);
                push_field(out, "name", name);
            }
            TraceEvent::NodeCreated { node, kind } | TraceEvent::NodeRemoved { node, kind } => {
                push_field(out, "node", node);
                push_field(out, "kind", kind);
            }
            TraceEvent::AlphaMemoryCreated { memory, key } => {
                push_field(out, "memory", memory);
                push_field(out, "key", key);
            }
            TraceEvent::AlphaMemoryRemoved { memory } => push_field(out, "memory", memory),
            TraceEvent::ActivationAdded { production, token }
            | TraceEvent::ActivationRemoved { production, token }
            | TraceEvent::MatchFired { production, token } => {
                push_field(out, "production", production);
                push_field(out, "token", token);
            }
        }
        out.push('}');
    }

    fn format_many(&self, records: &[&TraceRecord]) -> String {
        let sep = if self.pretty { ",\n  " } else { "," };
        let mut out = String::from(if self.pretty { "[\n  " } else { "[" });
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            self.write_record(&mut out, record);
        }
        out.push_str(if self.pretty { "\n]" } else { "]" });
        out
    }
}
