use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use msgslot_core::{DeviceRegistry, RegistryConfig, Session, SlotError};

use crate::cmd::ExecArgs;
use crate::exit::{io_error, slot_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{OpRecord, OutputFormat, RecordPrinter};
use crate::script::{parse_script, Op, ScriptLine};

pub fn run(args: ExecArgs, format: OutputFormat) -> CliResult<i32> {
    let source = read_source(args.script.as_deref())?;
    let lines = parse_script(&source)?;

    let config = RegistryConfig {
        device_id_limit: args.device_limit,
    };
    let mut executor = Executor::new(DeviceRegistry::with_config(config));
    let mut printer = RecordPrinter::new(format);

    let first_failure = run_lines(&mut executor, &lines, &mut printer, args.keep_going);

    printer.finish();
    let released = executor.shutdown();
    tracing::debug!(operations = lines.len(), released, "script finished");

    match first_failure {
        Some(err) => Err(err),
        None => Ok(SUCCESS),
    }
}

/// Apply each line and emit its record. Returns the first failure, whether
/// a slot error or a session-name usage error.
fn run_lines(
    executor: &mut Executor,
    lines: &[ScriptLine],
    printer: &mut RecordPrinter,
    keep_going: bool,
) -> Option<CliError> {
    let mut first_failure: Option<CliError> = None;

    for line in lines {
        let failure = match executor.apply(line) {
            Ok(record) => {
                printer.emit(&record);
                executor
                    .take_failure()
                    .map(|err| slot_error(&format!("line {}", line.number), &err))
            }
            Err(err) => {
                printer.emit(&OpRecord {
                    line: line.number,
                    op: line.op.name(),
                    session: line.op.session().map(str::to_string),
                    error: Some(err.message.clone()),
                    ..OpRecord::default()
                });
                Some(err)
            }
        };

        if let Some(err) = failure {
            tracing::warn!(line = line.number, op = line.op.name(), error = %err, "operation failed");
            first_failure.get_or_insert(err);
            if !keep_going {
                break;
            }
        }
    }

    first_failure
}

fn read_source(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err)),
        _ => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(|err| io_error("failed reading stdin", err))?;
            Ok(source)
        }
    }
}

/// Runs script operations against one registry, tracking sessions by name.
struct Executor {
    registry: DeviceRegistry,
    sessions: HashMap<String, Session>,
    failure: Option<SlotError>,
}

impl Executor {
    fn new(registry: DeviceRegistry) -> Self {
        Self {
            registry,
            sessions: HashMap::new(),
            failure: None,
        }
    }

    /// Apply one operation. Slot failures land in the record (see
    /// [`Executor::take_failure`]); misuse of session names is a usage error.
    fn apply(&mut self, line: &ScriptLine) -> CliResult<OpRecord> {
        let mut record = OpRecord {
            line: line.number,
            op: line.op.name(),
            session: line.op.session().map(str::to_string),
            ..OpRecord::default()
        };

        let outcome = match &line.op {
            Op::Open { session, device } => {
                record.device = Some(*device);
                if self.sessions.contains_key(session) {
                    return Err(usage(line, format!("session `{session}` is already open")));
                }
                self.registry.open(*device).map(|opened| {
                    self.sessions.insert(session.clone(), opened);
                })
            }
            Op::Select { session, channel } => {
                let s = self.session_mut(line, session)?;
                record.device = Some(s.device_id());
                let result = s.select_channel(*channel);
                record.channel = s.selected_channel().map(u32::from);
                result
            }
            Op::Write { session, payload } => {
                let s = self.session(line, session)?;
                describe(&mut record, s);
                s.write(payload).map(|written| {
                    record.bytes = Some(written);
                })
            }
            Op::Read { session, capacity } => {
                let s = self.session(line, session)?;
                describe(&mut record, s);
                s.read(*capacity).map(|payload| {
                    record.bytes = Some(payload.len());
                    record.payload = Some(payload.to_vec());
                })
            }
            Op::Close { session } => {
                let s = self
                    .sessions
                    .remove(session)
                    .ok_or_else(|| unknown_session(line, session))?;
                record.device = Some(s.device_id());
                s.close()
            }
            Op::Dump { device } => {
                record.device = Some(*device);
                let snapshot = self.registry.snapshot(*device);
                record.occupied = Some(snapshot.as_ref().is_some_and(|snap| snap.occupied));
                record.channels = Some(
                    snapshot
                        .map(|snap| {
                            snap.channels
                                .into_iter()
                                .map(|(channel, len)| (channel.get(), len))
                                .collect()
                        })
                        .unwrap_or_default(),
                );
                Ok(())
            }
        };

        if let Err(err) = outcome {
            record.error = Some(err.to_string());
            self.failure = Some(err);
        }
        Ok(record)
    }

    fn take_failure(&mut self) -> Option<SlotError> {
        self.failure.take()
    }

    fn session(&self, line: &ScriptLine, name: &str) -> CliResult<&Session> {
        self.sessions
            .get(name)
            .ok_or_else(|| unknown_session(line, name))
    }

    fn session_mut(&mut self, line: &ScriptLine, name: &str) -> CliResult<&mut Session> {
        self.sessions
            .get_mut(name)
            .ok_or_else(|| unknown_session(line, name))
    }

    /// Close leftover sessions and tear the registry down.
    fn shutdown(mut self) -> usize {
        for (name, session) in self.sessions.drain() {
            tracing::debug!(session = %name, device = session.device_id(), "closing leftover session");
            if let Err(err) = session.close() {
                tracing::warn!(session = %name, error = %err, "close failed");
            }
        }
        self.registry.teardown()
    }
}

fn describe(record: &mut OpRecord, session: &Session) {
    record.device = Some(session.device_id());
    record.channel = session.selected_channel().map(u32::from);
}

fn usage(line: &ScriptLine, message: String) -> CliError {
    CliError::new(USAGE, format!("line {}: {message}", line.number))
}

fn unknown_session(line: &ScriptLine, name: &str) -> CliError {
    usage(line, format!("no open session named `{name}`"))
}
