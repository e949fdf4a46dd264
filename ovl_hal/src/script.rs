//! Register-access scripts.
//!
//! One operation per line:
//!
//! ```text
//! # comment
//! write tproc 0x04 0xDEADBEEF      # width defaults to 4
//! read  tproc 0x04
//! read  axi_gpio 0x0 1
//! read_array tproc 0x0 4 4         # offset, count, width
//! dump  tproc
//! ```
//!
//! Numbers are decimal or `0x`-prefixed hex and may contain `_` separators.
//! Widths are validated when the operation executes, not when it is parsed.

use ovl_common::consts::DEFAULT_ACCESS_WIDTH;
use thiserror::Error;

/// Script parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// First token is not a known command
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand {
        /// 1-based line number
        line: usize,
        /// Offending token
        command: String,
    },

    /// A required argument is missing
    #[error("line {line}: missing {expected}")]
    MissingArgument {
        /// 1-based line number
        line: usize,
        /// Name of the missing argument
        expected: &'static str,
    },

    /// A numeric argument could not be parsed
    #[error("line {line}: invalid number '{text}'")]
    InvalidNumber {
        /// 1-based line number
        line: usize,
        /// Offending token
        text: String,
    },

    /// More arguments than the command accepts
    #[error("line {line}: unexpected argument '{text}'")]
    TrailingArgument {
        /// 1-based line number
        line: usize,
        /// First extra token
        text: String,
    },
}

/// A single register operation against a named region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOp {
    /// Read one register.
    Read {
        /// Region name
        region: String,
        /// Byte offset
        offset: usize,
        /// Width in bytes
        width: usize,
    },
    /// Write one register.
    Write {
        /// Region name
        region: String,
        /// Byte offset
        offset: usize,
        /// Width in bytes
        width: usize,
        /// Value (truncated to width)
        value: u64,
    },
    /// Read a run of consecutive registers.
    ReadArray {
        /// Region name
        region: String,
        /// Byte offset of the first register
        offset: usize,
        /// Number of registers
        count: usize,
        /// Width in bytes
        width: usize,
    },
    /// Read the whole region byte by byte.
    Dump {
        /// Region name
        region: String,
    },
}

impl AccessOp {
    /// Region the operation targets.
    pub fn region(&self) -> &str {
        match self {
            Self::Read { region, .. }
            | Self::Write { region, .. }
            | Self::ReadArray { region, .. }
            | Self::Dump { region } => region,
        }
    }
}

/// Parse a decimal or `0x` hex number, allowing `_` separators.
pub fn parse_number(text: &str) -> Option<u64> {
    let cleaned = text.replace('_', "");
    match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => cleaned.parse().ok(),
    }
}

/// Tokens of one line with typed accessors.
struct Args<'a> {
    line: usize,
    tokens: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn word(&mut self, expected: &'static str) -> Result<&'a str, ScriptError> {
        self.tokens.next().ok_or(ScriptError::MissingArgument {
            line: self.line,
            expected,
        })
    }

    fn number(&mut self, expected: &'static str) -> Result<u64, ScriptError> {
        let text = self.word(expected)?;
        self.parse(text)
    }

    fn index(&mut self, expected: &'static str) -> Result<usize, ScriptError> {
        let text = self.word(expected)?;
        self.parse_index(text)
    }

    fn optional_width(&mut self) -> Result<usize, ScriptError> {
        match self.tokens.next() {
            Some(text) => self.parse_index(text),
            None => Ok(DEFAULT_ACCESS_WIDTH),
        }
    }

    fn finish(mut self) -> Result<(), ScriptError> {
        match self.tokens.next() {
            Some(text) => Err(ScriptError::TrailingArgument {
                line: self.line,
                text: text.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn parse(&self, text: &str) -> Result<u64, ScriptError> {
        parse_number(text).ok_or_else(|| ScriptError::InvalidNumber {
            line: self.line,
            text: text.to_string(),
        })
    }

    fn parse_index(&self, text: &str) -> Result<usize, ScriptError> {
        self.parse(text)
            .and_then(|n| usize::try_from(n).map_err(|_| ScriptError::InvalidNumber {
                line: self.line,
                text: text.to_string(),
            }))
    }
}

/// Parse one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: usize, text: &str) -> Result<Option<AccessOp>, ScriptError> {
    let content = text.split('#').next().unwrap_or_default();
    let mut args = Args {
        line,
        tokens: content.split_whitespace(),
    };
    let Some(command) = args.tokens.next() else {
        return Ok(None);
    };

    let op = match command {
        "read" | "r" => {
            let region = args.word("region")?.to_string();
            let offset = args.index("offset")?;
            let width = args.optional_width()?;
            AccessOp::Read {
                region,
                offset,
                width,
            }
        }
        "write" | "w" => {
            let region = args.word("region")?.to_string();
            let offset = args.index("offset")?;
            let value = args.number("value")?;
            let width = args.optional_width()?;
            AccessOp::Write {
                region,
                offset,
                width,
                value,
            }
        }
        "read_array" => {
            let region = args.word("region")?.to_string();
            let offset = args.index("offset")?;
            let count = args.index("count")?;
            let width = args.optional_width()?;
            AccessOp::ReadArray {
                region,
                offset,
                count,
                width,
            }
        }
        "dump" => AccessOp::Dump {
            region: args.word("region")?.to_string(),
        },
        other => {
            return Err(ScriptError::UnknownCommand {
                line,
                command: other.to_string(),
            });
        }
    };

    args.finish()?;
    Ok(Some(op))
}

/// Parse a whole script.
pub fn parse_script(text: &str) -> Result<Vec<AccessOp>, ScriptError> {
    let mut ops = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(op) = parse_line(idx + 1, line)? {
            ops.push(op);
        }
    }
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(parse_number("42"), Some(42));
        assert_eq!(parse_number("0x2A"), Some(42));
        assert_eq!(parse_number("0XdeadBEEF"), Some(0xDEAD_BEEF));
        assert_eq!(parse_number("0x4000_0000"), Some(0x4000_0000));
        assert_eq!(parse_number("0x"), None);
        assert_eq!(parse_number("-1"), None);
        assert_eq!(parse_number("ten"), None);
    }

    #[test]
    fn full_script() {
        let ops = parse_script(
            "# bring-up\n\
             write tproc 0x04 0xDEADBEEF\n\
             \n\
             read tproc 4   # readback\n\
             r axi_gpio 0 1\n\
             read_array tproc 0 4 8\n\
             dump tproc\n",
        )
        .unwrap();

        assert_eq!(
            ops,
            vec![
                AccessOp::Write {
                    region: "tproc".into(),
                    offset: 4,
                    width: 4,
                    value: 0xDEAD_BEEF
                },
                AccessOp::Read {
                    region: "tproc".into(),
                    offset: 4,
                    width: 4
                },
                AccessOp::Read {
                    region: "axi_gpio".into(),
                    offset: 0,
                    width: 1
                },
                AccessOp::ReadArray {
                    region: "tproc".into(),
                    offset: 0,
                    count: 4,
                    width: 8
                },
                AccessOp::Dump {
                    region: "tproc".into()
                },
            ]
        );
        assert_eq!(ops[4].region(), "tproc");
    }

    #[test]
    fn unsupported_width_parses() {
        let op = parse_line(1, "read tproc 0 3").unwrap().unwrap();
        assert_eq!(
            op,
            AccessOp::Read {
                region: "tproc".into(),
                offset: 0,
                width: 3
            }
        );
    }

    #[test]
    fn errors_carry_line_numbers() {
        assert_eq!(
            parse_script("read tproc 0\npoke tproc 0"),
            Err(ScriptError::UnknownCommand {
                line: 2,
                command: "poke".into()
            })
        );
        assert_eq!(
            parse_line(3, "write tproc 0"),
            Err(ScriptError::MissingArgument {
                line: 3,
                expected: "value"
            })
        );
        assert_eq!(
            parse_line(1, "read tproc zz"),
            Err(ScriptError::InvalidNumber {
                line: 1,
                text: "zz".into()
            })
        );
        assert_eq!(
            parse_line(1, "dump tproc extra"),
            Err(ScriptError::TrailingArgument {
                line: 1,
                text: "extra".into()
            })
        );
    }
}
