//! Executes parsed commands against a device

use ramdisk::{Device, StoreError};
use std::io::{self, BufRead, Write};
use tracing::{debug, warn};

use crate::command::Command;

/// Bytes of each exported page shown by `mmap`
const PAGE_PREVIEW: usize = 16;

fn describe(e: &StoreError) -> String {
    let partial = e.transferred();
    if partial > 0 {
        format!("error: {e} (errno {}, {partial} bytes transferred)", e.errno())
    } else {
        format!("error: {e} (errno {})", e.errno())
    }
}

pub struct Session<'d> {
    device: &'d Device,
}

impl<'d> Session<'d> {
    #[must_use]
    pub fn new(device: &'d Device) -> Self {
        Self { device }
    }

    /// Run one command and render its result.
    ///
    /// # Errors
    ///
    /// Returns the rendered device error.
    pub fn execute(&self, command: &Command) -> Result<String, String> {
        debug!(?command, "executing");
        let dev = self.device;
        let out = match command {
            Command::Open(mode) => {
                let id = dev.open(*mode).map_err(|e| describe(&e))?;
                format!("handle {id}")
            }
            Command::Close(id) => {
                dev.close(*id).map_err(|e| describe(&e))?;
                format!("closed {id}")
            }
            Command::Read { id, len } => {
                let mut buf = vec![0u8; self.readable(*len)];
                let n = dev.read(*id, &mut buf).map_err(|e| describe(&e))?;
                render_bytes(buf.get(..n).unwrap_or_default())
            }
            Command::ReadAt { id, offset, len } => {
                let mut buf = vec![0u8; self.readable(*len)];
                let n = dev
                    .read_at(*id, *offset, &mut buf)
                    .map_err(|e| describe(&e))?;
                render_bytes(buf.get(..n).unwrap_or_default())
            }
            Command::Write { id, data } => {
                let n = dev.write(*id, data).map_err(|e| describe(&e))?;
                format!("wrote {n}")
            }
            Command::WriteAt { id, offset, data } => {
                let n = dev
                    .write_at(*id, *offset, data)
                    .map_err(|e| describe(&e))?;
                format!("wrote {n}")
            }
            Command::Seek { id, whence, offset } => {
                let pos = dev
                    .seek(*id, *whence, *offset)
                    .map_err(|e| describe(&e))?;
                format!("pos {pos}")
            }
            Command::Status => dev.status().to_string().trim_end().to_string(),
            Command::SetMax(limit) => {
                dev.set_max_concurrent(*limit).map_err(|e| describe(&e))?;
                "ok".to_string()
            }
            Command::Ioctl { cmd, arg } => {
                let ret = dev.control(*cmd, *arg).map_err(|e| describe(&e))?;
                format!("ok {ret}")
            }
            Command::Mmap { offset, len } => {
                let pages = dev
                    .export_pages(*offset, *len)
                    .map_err(|e| describe(&e))?;
                let mut lines = vec![format!("{} pages", pages.len())];
                for page in &pages {
                    let bytes = page.to_vec();
                    let preview = bytes.get(..PAGE_PREVIEW).unwrap_or(bytes.as_slice());
                    lines.push(format!(
                        "page {}: {}",
                        page.index(),
                        preview.escape_ascii()
                    ));
                }
                lines.join("\n")
            }
        };
        Ok(out)
    }

    /// Buffer size for a read of `len` bytes; no read returns more than the
    /// data size.
    fn readable(&self, len: usize) -> usize {
        len.min(self.device.status().data_size)
    }

    /// Read commands line by line from `input` and write one result block
    /// per command to `output`. Blank lines and `#` comments are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails;
    /// command failures are written to `output`.
    pub fn run(&self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let result = trimmed
                .parse::<Command>()
                .map_err(|e| format!("error: {e}"))
                .and_then(|command| self.execute(&command));
            match result {
                Ok(text) => writeln!(output, "{text}")?,
                Err(text) => {
                    warn!(line = trimmed, "{text}");
                    writeln!(output, "{text}")?;
                }
            }
        }
        output.flush()
    }
}

fn render_bytes(bytes: &[u8]) -> String {
    format!("{}: {}", bytes.len(), String::from_utf8_lossy(bytes))
}
