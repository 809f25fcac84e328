//! Line command parser
//!
//! ```text
//! open r|w|rw
//! close <id>
//! read <id> <len>
//! write <id> <text...>
//! pread <id> <offset> <len>
//! pwrite <id> <offset> <text...>
//! seek <id> set|cur|end|<0-2> <offset>
//! status
//! setmax <n>
//! ioctl <cmd> <arg>
//! mmap <offset> <len>
//! ```

use ramdisk::{AccessMode, HandleId, Whence};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(AccessMode),
    Close(HandleId),
    Read { id: HandleId, len: usize },
    Write { id: HandleId, data: Vec<u8> },
    ReadAt { id: HandleId, offset: usize, len: usize },
    WriteAt { id: HandleId, offset: usize, data: Vec<u8> },
    Seek { id: HandleId, whence: Whence, offset: i64 },
    Status,
    SetMax(i64),
    Ioctl { cmd: u32, arg: i64 },
    Mmap { offset: usize, len: usize },
}

fn number<T: FromStr>(token: Option<&str>, what: &str) -> Result<T, String> {
    let token = token.ok_or_else(|| format!("missing {what}"))?;
    token
        .parse()
        .map_err(|_| format!("invalid {what} '{token}'"))
}

fn handle(token: Option<&str>) -> Result<HandleId, String> {
    number(token, "handle").map(HandleId::new)
}

fn whence(token: Option<&str>) -> Result<Whence, String> {
    match token {
        Some("set") => Ok(Whence::Start),
        Some("cur") => Ok(Whence::Current),
        Some("end") => Ok(Whence::End),
        other => {
            let raw = number(other, "whence")?;
            Whence::from_raw(raw).map_err(|e| e.to_string())
        }
    }
}

/// Command number, decimal or `0x` hex
fn command_number(token: Option<&str>) -> Result<u32, String> {
    let token = token.ok_or_else(|| "missing command".to_string())?;
    let parsed = match token.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => token.parse(),
    };
    parsed.map_err(|_| format!("invalid command '{token}'"))
}

/// Remainder of the line after `skip` whitespace-separated words
fn text_after(line: &str, skip: usize) -> Result<Vec<u8>, String> {
    let mut rest = line.trim_start();
    for _ in 0..skip {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest.get(end..).unwrap_or_default().trim_start();
    }
    if rest.is_empty() {
        return Err("missing text".to_string());
    }
    Ok(rest.as_bytes().to_vec())
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err("empty command".to_string());
        };
        let command = match name {
            "open" => {
                let mode = words.next().ok_or("missing access mode")?;
                Self::Open(mode.parse().map_err(|e: ramdisk::StoreError| e.to_string())?)
            }
            "close" => Self::Close(handle(words.next())?),
            "read" => Self::Read {
                id: handle(words.next())?,
                len: number(words.next(), "length")?,
            },
            "write" => Self::Write {
                id: handle(words.next())?,
                data: text_after(line, 2)?,
            },
            "pread" => Self::ReadAt {
                id: handle(words.next())?,
                offset: number(words.next(), "offset")?,
                len: number(words.next(), "length")?,
            },
            "pwrite" => Self::WriteAt {
                id: handle(words.next())?,
                offset: number(words.next(), "offset")?,
                data: text_after(line, 3)?,
            },
            "seek" => Self::Seek {
                id: handle(words.next())?,
                whence: whence(words.next())?,
                offset: number(words.next(), "offset")?,
            },
            "status" => Self::Status,
            "setmax" => Self::SetMax(number(words.next(), "limit")?),
            "ioctl" => Self::Ioctl {
                cmd: command_number(words.next())?,
                arg: number(words.next(), "argument")?,
            },
            "mmap" => Self::Mmap {
                offset: number(words.next(), "offset")?,
                len: number(words.next(), "length")?,
            },
            _ => return Err(format!("unknown command '{name}'")),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_write_keeps_spaces() {
        let cmd: Command = "write 3 hello  big world".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Write {
                id: HandleId::new(3),
                data: b"hello  big world".to_vec()
            }
        );
    }

    #[test]
    fn test_parse_pwrite() {
        let cmd: Command = "pwrite 1 4096 abc".parse().unwrap();
        assert_eq!(
            cmd,
            Command::WriteAt {
                id: HandleId::new(1),
                offset: 4096,
                data: b"abc".to_vec()
            }
        );
    }

    #[test]
    fn test_parse_seek_forms() {
        let cmd: Command = "seek 2 end -5".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Seek {
                id: HandleId::new(2),
                whence: Whence::End,
                offset: -5
            }
        );
        let cmd: Command = "seek 2 1 7".parse().unwrap();
        assert!(matches!(cmd, Command::Seek { whence: Whence::Current, .. }));
        assert!("seek 2 9 0".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_ioctl_hex() {
        let cmd: Command = "ioctl 0x40046b01 3".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Ioctl {
                cmd: 0x4004_6b01,
                arg: 3
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>().unwrap_err(), "empty command");
        assert_eq!("open".parse::<Command>().unwrap_err(), "missing access mode");
        assert_eq!(
            "read x 3".parse::<Command>().unwrap_err(),
            "invalid handle 'x'"
        );
        assert_eq!("write 1".parse::<Command>().unwrap_err(), "missing text");
        assert!("frobnicate".parse::<Command>().is_err());
    }
}
