//! Operation scripts for `msgslot exec`.
//!
//! One operation per line; `#` starts a comment.
//!
//! ```text
//! open <session> <device>
//! select <session> <channel>
//! write <session> <text...>
//! write-hex <session> <hex>
//! read <session> [capacity]
//! close <session>
//! dump <device>
//! ```

use msgslot_core::{DeviceId, MAX_MSG_LEN};

use crate::exit::{CliError, CliResult, USAGE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Open { session: String, device: DeviceId },
    Select { session: String, channel: i64 },
    Write { session: String, payload: Vec<u8> },
    Read { session: String, capacity: usize },
    Close { session: String },
    Dump { device: DeviceId },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Open { .. } => "open",
            Op::Select { .. } => "select",
            Op::Write { .. } => "write",
            Op::Read { .. } => "read",
            Op::Close { .. } => "close",
            Op::Dump { .. } => "dump",
        }
    }

    pub fn session(&self) -> Option<&str> {
        match self {
            Op::Open { session, .. }
            | Op::Select { session, .. }
            | Op::Write { session, .. }
            | Op::Read { session, .. }
            | Op::Close { session } => Some(session),
            Op::Dump { .. } => None,
        }
    }
}

/// A parsed operation and its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub number: usize,
    pub op: Op,
}

pub fn parse_script(source: &str) -> CliResult<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let number = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let op = parse_line(line)
            .map_err(|msg| CliError::new(USAGE, format!("line {number}: {msg}")))?;
        lines.push(ScriptLine { number, op });
    }
    Ok(lines)
}

fn parse_line(line: &str) -> Result<Op, String> {
    let (verb, rest) = split_word(line);
    match verb {
        "open" => {
            let (session, rest) = session_arg(rest)?;
            let device = single_number(rest, "device")?;
            Ok(Op::Open { session, device })
        }
        "select" => {
            let (session, rest) = session_arg(rest)?;
            let channel = single_number(rest, "channel")?;
            Ok(Op::Select { session, channel })
        }
        "write" => {
            let (session, rest) = session_arg(rest)?;
            // Text is taken verbatim after the session name, inner spaces included.
            Ok(Op::Write {
                session,
                payload: rest.as_bytes().to_vec(),
            })
        }
        "write-hex" => {
            let (session, rest) = session_arg(rest)?;
            let payload = decode_hex(rest)?;
            Ok(Op::Write { session, payload })
        }
        "read" => {
            let (session, rest) = session_arg(rest)?;
            let capacity = if rest.is_empty() {
                MAX_MSG_LEN
            } else {
                single_number(rest, "capacity")?
            };
            Ok(Op::Read { session, capacity })
        }
        "close" => {
            let (session, rest) = session_arg(rest)?;
            expect_end(rest)?;
            Ok(Op::Close { session })
        }
        "dump" => {
            let device = single_number(rest, "device")?;
            Ok(Op::Dump { device })
        }
        other => Err(format!("unknown operation `{other}`")),
    }
}

fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

fn session_arg(rest: &str) -> Result<(String, &str), String> {
    let (session, rest) = split_word(rest);
    if session.is_empty() {
        return Err("missing session name".to_string());
    }
    Ok((session.to_string(), rest))
}

fn single_number<T: std::str::FromStr>(rest: &str, what: &str) -> Result<T, String> {
    let (word, tail) = split_word(rest);
    if word.is_empty() {
        return Err(format!("missing {what}"));
    }
    expect_end(tail)?;
    word.parse().map_err(|_| format!("invalid {what} `{word}`"))
}

fn expect_end(rest: &str) -> Result<(), String> {
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(format!("unexpected trailing input `{}`", rest.trim()))
    }
}

fn decode_hex(input: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = input.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err("hex payload has an odd number of digits".to_string());
    }
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|_| "invalid hex".to_string())?;
            u8::from_str_radix(text, 16).map_err(|_| format!("invalid hex byte `{text}`"))
        })
        .collect()
}
