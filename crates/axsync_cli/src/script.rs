//! Bus scripts: one transaction per line.
//!
//! ```text
//! # bring the port up, then poke a register
//! reset 4
//! write 0x10 0xdeadbeef
//! write 0x10 0xff 0x01
//! read  0x10
//! expect 0x10 0xdeadbeff
//! idle 8
//! ```

use std::io::Write;

use axsync_sim::Transactor;

/// One parsed script command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptCommand {
    /// Hold reset for the given cycles, or the configured default.
    Reset(Option<u32>),
    /// Let the clock run without driving a transaction.
    Idle(u32),
    /// Write `data` to the lanes of `addr` selected by `strb`.
    Write {
        /// Byte address.
        addr: u32,
        /// Write data.
        data: u64,
        /// Byte-lane strobe.
        strb: u8,
    },
    /// Read `addr` and print the result.
    Read(u32),
    /// Read `addr` and compare it against `data`.
    Expect {
        /// Byte address.
        addr: u32,
        /// Expected read data.
        data: u64,
    },
}

/// A command together with the line it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based source line.
    pub line: usize,
    /// The command on that line.
    pub command: ScriptCommand,
}

/// Parses script text. Blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>, String> {
    let mut lines = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let command = parse_command(content).map_err(|e| format!("line {line}: {e}"))?;
        lines.push(ScriptLine { line, command });
    }
    Ok(lines)
}

fn parse_command(content: &str) -> Result<ScriptCommand, String> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    let (name, args) = tokens
        .split_first()
        .ok_or_else(|| "empty command".to_string())?;
    let command = match (*name, args) {
        ("reset", []) => ScriptCommand::Reset(None),
        ("reset", [n]) => ScriptCommand::Reset(Some(parse_number(n)?)),
        ("idle", [n]) => ScriptCommand::Idle(parse_number(n)?),
        ("write", [addr, data]) => ScriptCommand::Write {
            addr: parse_number(addr)?,
            data: parse_number(data)?,
            strb: 0xff,
        },
        ("write", [addr, data, strb]) => ScriptCommand::Write {
            addr: parse_number(addr)?,
            data: parse_number(data)?,
            strb: parse_number(strb)?,
        },
        ("read", [addr]) => ScriptCommand::Read(parse_number(addr)?),
        ("expect", [addr, data]) => ScriptCommand::Expect {
            addr: parse_number(addr)?,
            data: parse_number(data)?,
        },
        ("reset" | "idle" | "write" | "read" | "expect", _) => {
            return Err(format!("wrong number of arguments to `{name}`"))
        }
        _ => return Err(format!("unknown command `{name}`")),
    };
    Ok(command)
}

/// Parses `0x`-prefixed hex or decimal into any unsigned width.
fn parse_number<T: TryFrom<u64>>(token: &str) -> Result<T, String> {
    let cleaned = token.replace('_', "");
    let value = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => cleaned.parse::<u64>(),
    }
    .map_err(|_| format!("invalid number `{token}`"))?;
    T::try_from(value).map_err(|_| format!("`{token}` is out of range"))
}

/// Result of running a script to completion.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScriptOutcome {
    /// Commands executed.
    pub commands: usize,
    /// Mismatch messages from failed `expect` commands.
    pub mismatches: Vec<String>,
}

impl ScriptOutcome {
    /// Whether every `expect` matched.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Runs `script` against `transactor`, printing read results to `out`.
///
/// Failed `expect` commands are collected and execution continues; a bus
/// error response or timeout stops the script.
pub fn execute(
    script: &[ScriptLine],
    transactor: &mut Transactor,
    reset_cycles: u32,
    out: &mut dyn Write,
) -> Result<ScriptOutcome, Box<dyn std::error::Error>> {
    let mut outcome = ScriptOutcome::default();
    for ScriptLine { line, command } in script {
        match *command {
            ScriptCommand::Reset(cycles) => transactor.reset(cycles.unwrap_or(reset_cycles)),
            ScriptCommand::Idle(cycles) => transactor.next_cycle_high(cycles),
            ScriptCommand::Write { addr, data, strb } => transactor
                .axi_write_strobed(addr, data, strb)
                .map_err(|e| format!("line {line}: write {addr:#010x}: {e}"))?,
            ScriptCommand::Read(addr) => {
                let data = transactor
                    .axi_read(addr)
                    .map_err(|e| format!("line {line}: read {addr:#010x}: {e}"))?;
                writeln!(out, "{addr:#010x}: {data:016x}")?;
            }
            ScriptCommand::Expect { addr, data } => {
                let actual = transactor
                    .axi_read(addr)
                    .map_err(|e| format!("line {line}: read {addr:#010x}: {e}"))?;
                if actual != data {
                    outcome.mismatches.push(format!(
                        "line {line}: {addr:#010x} expected {data:016x}, got {actual:016x}"
                    ));
                }
            }
        }
        outcome.commands += 1;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axsync_sim::{ModelConfig, SyncSession, TransactorConfig};

    #[test]
    fn parse_all_commands() {
        let text = "\
# setup
reset
reset 2
idle 10
write 0x10 0xdead_beef
write 16 255 0x0f   # low lanes only
read 0x10
expect 0x10 3735928559
";
        let script = parse_script(text).unwrap();
        let commands: Vec<_> = script.iter().map(|l| l.command.clone()).collect();
        assert_eq!(
            commands,
            vec![
                ScriptCommand::Reset(None),
                ScriptCommand::Reset(Some(2)),
                ScriptCommand::Idle(10),
                ScriptCommand::Write {
                    addr: 0x10,
                    data: 0xdead_beef,
                    strb: 0xff
                },
                ScriptCommand::Write {
                    addr: 16,
                    data: 255,
                    strb: 0x0f
                },
                ScriptCommand::Read(0x10),
                ScriptCommand::Expect {
                    addr: 0x10,
                    data: 0xdead_beef
                },
            ]
        );
        assert_eq!(script[0].line, 2);
        assert_eq!(script[6].line, 8);
    }

    #[test]
    fn parse_errors_name_the_line() {
        let err = parse_script("reset\nfrobnicate 1\n").unwrap_err();
        assert_eq!(err, "line 2: unknown command `frobnicate`");

        let err = parse_script("read\n").unwrap_err();
        assert!(err.contains("wrong number of arguments"));

        let err = parse_script("write 0x10 zz\n").unwrap_err();
        assert!(err.contains("invalid number `zz`"));
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        let err = parse_script("read 0x1_0000_0000\n").unwrap_err();
        assert!(err.contains("out of range"));
        let err = parse_script("write 0 0 0x100\n").unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn execute_prints_reads_and_collects_mismatches() {
        let script = parse_script(
            "reset 2\nwrite 0x8 0x1234\nread 0x8\nexpect 0x8 0x1234\nexpect 0x8 0x1\n",
        )
        .unwrap();
        let mut t = Transactor::default();
        let mut out = Vec::new();
        let outcome = execute(&script, &mut t, 4, &mut out).unwrap();

        assert_eq!(outcome.commands, 5);
        assert!(!outcome.passed());
        assert_eq!(outcome.mismatches.len(), 1);
        assert!(outcome.mismatches[0].starts_with("line 5:"));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0x00000008: 0000000000001234\n"
        );
    }

    #[test]
    fn execute_stops_on_decode_error() {
        let script = parse_script("reset\nread 0x100\nread 0x0\n").unwrap();
        let mut t = Transactor::new(
            SyncSession::with_config(ModelConfig {
                base_address: 0,
                register_count: 4,
            }),
            TransactorConfig::default(),
        );
        let mut out = Vec::new();
        let err = execute(&script, &mut t, 2, &mut out).unwrap_err();
        assert!(err.to_string().starts_with("line 2: read 0x00000100"));
        assert!(out.is_empty());
    }

    #[test]
    fn idle_advances_the_clock() {
        let script = parse_script("idle 7\n").unwrap();
        let mut t = Transactor::default();
        execute(&script, &mut t, 4, &mut Vec::new()).unwrap();
        assert_eq!(t.total_cycles(), 7);
    }
}
