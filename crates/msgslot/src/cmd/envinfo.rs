use comfy_table::{presets::UTF8_FULL, Table};
use msgslot_core::{DeviceId, RegistryConfig, MAX_MSG_LEN};
use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

/// Settings an `exec` run would start with under the current environment.
#[derive(Debug, Serialize)]
struct SlotEnv {
    schema_id: &'static str,
    version: &'static str,
    target: &'static str,
    max_msg_len: usize,
    /// `None` means any device id is admitted.
    device_id_limit: Option<DeviceId>,
}

impl SlotEnv {
    fn new(config: RegistryConfig) -> Self {
        Self {
            schema_id: "https://schemas.3leaps.dev/msgslot/cli/v1/envinfo.schema.json",
            version: env!("CARGO_PKG_VERSION"),
            target: option_env!("MSGSLOT_BUILD_TARGET").unwrap_or("unknown"),
            max_msg_len: MAX_MSG_LEN,
            device_id_limit: config.device_id_limit,
        }
    }
}

pub fn run(args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let config = RegistryConfig {
        device_id_limit: args.device_limit,
    };
    let info = SlotEnv::new(config);
    tracing::debug!(?info, "resolved environment");

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", table(&info)),
        OutputFormat::Raw => println!("{}", info.version),
    }
    Ok(SUCCESS)
}

fn table(info: &SlotEnv) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["SETTING", "VALUE"]);
    table.add_row(vec!["version".to_string(), info.version.to_string()]);
    table.add_row(vec!["target".to_string(), info.target.to_string()]);
    table.add_row(vec!["max_msg_len".to_string(), info.max_msg_len.to_string()]);
    table.add_row(vec![
        "device_id_limit".to_string(),
        info.device_id_limit
            .map_or_else(|| "unlimited".to_string(), |limit| limit.to_string()),
    ]);
    table
}
