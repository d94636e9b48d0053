use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use msgslot_core::DeviceId;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Result of one script operation.
#[derive(Debug, Clone, Default)]
pub struct OpRecord {
    pub line: usize,
    pub op: &'static str,
    pub session: Option<String>,
    pub device: Option<DeviceId>,
    pub channel: Option<u32>,
    pub bytes: Option<usize>,
    pub payload: Option<Vec<u8>>,
    /// `(channel, length)` pairs for `dump`.
    pub channels: Option<Vec<(u32, usize)>>,
    pub occupied: Option<bool>,
    pub error: Option<String>,
}

impl OpRecord {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Serialize)]
struct ChannelOutput {
    channel: u32,
    len: usize,
}

#[derive(Serialize)]
struct RecordOutput<'a> {
    schema_id: &'a str,
    line: usize,
    op: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<Vec<ChannelOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    occupied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> RecordOutput<'a> {
    fn from_record(record: &'a OpRecord) -> Self {
        Self {
            schema_id: "https://schemas.3leaps.dev/msgslot/cli/v1/op-result.schema.json",
            line: record.line,
            op: record.op,
            ok: record.ok(),
            session: record.session.as_deref(),
            device: record.device,
            channel: record.channel,
            bytes: record.bytes,
            payload: record.payload.as_deref().map(payload_preview),
            channels: record.channels.as_ref().map(|list| {
                list.iter()
                    .map(|(channel, len)| ChannelOutput {
                        channel: *channel,
                        len: *len,
                    })
                    .collect()
            }),
            occupied: record.occupied,
            error: record.error.as_deref(),
        }
    }
}

/// Emits records in the selected format. Tables are buffered until
/// [`RecordPrinter::finish`].
pub struct RecordPrinter {
    format: OutputFormat,
    table: Option<Table>,
}

impl RecordPrinter {
    pub fn new(format: OutputFormat) -> Self {
        let table = matches!(format, OutputFormat::Table).then(|| {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LINE", "OP", "SESSION", "DEVICE", "CHANNEL", "RESULT"]);
            table
        });
        Self { format, table }
    }

    pub fn emit(&mut self, record: &OpRecord) {
        match self.format {
            OutputFormat::Json => {
                let out = RecordOutput::from_record(record);
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Table => {
                if let Some(table) = self.table.as_mut() {
                    table.add_row(vec![
                        record.line.to_string(),
                        record.op.to_string(),
                        opt_cell(record.session.as_deref()),
                        opt_cell(record.device),
                        opt_cell(record.channel),
                        result_text(record),
                    ]);
                }
            }
            OutputFormat::Pretty => {
                println!(
                    "line={} op={} {}",
                    record.line,
                    record.op,
                    result_text(record)
                );
            }
            OutputFormat::Raw => {
                if let Some(payload) = &record.payload {
                    print_raw(payload);
                }
            }
        }
    }

    pub fn finish(self) {
        if let Some(table) = self.table {
            println!("{table}");
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn result_text(record: &OpRecord) -> String {
    if let Some(err) = &record.error {
        return format!("error: {err}");
    }
    if let Some(payload) = &record.payload {
        return format!("{} bytes: {}", payload.len(), payload_preview(payload));
    }
    if let Some(channels) = &record.channels {
        let list: Vec<String> = channels
            .iter()
            .map(|(channel, len)| format!("{channel}:{len}"))
            .collect();
        let state = if record.occupied == Some(true) {
            "open"
        } else {
            "closed"
        };
        return format!("{state} [{}]", list.join(" "));
    }
    if let Some(bytes) = record.bytes {
        return format!("{bytes} bytes");
    }
    "ok".to_string()
}

fn opt_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
