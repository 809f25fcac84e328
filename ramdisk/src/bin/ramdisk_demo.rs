//! Ramdisk demo
//!
//! Writes stdin lines into the device through one handle while reader
//! threads poll it through their own handles, then prints the status report.
//! Run with `RUST_LOG=debug` to see page growth.

use embedded_io::{Read, Write};
use ramdisk::{AccessMode, Device, DeviceConfig};
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let device = Device::new(
        DeviceConfig::new()
            .with_name("demo")
            .with_page_size(64)
            .with_max_handles(3),
    )?;
    let done = AtomicBool::new(false);

    thread::scope(|s| -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = device.open_file(AccessMode::WriteOnly)?;
        let readers = [
            ("r1", device.open_file(AccessMode::ReadOnly)?),
            ("r2", device.open_file(AccessMode::ReadOnly)?),
        ];
        for (name, mut reader) in readers {
            let done = &done;
            s.spawn(move || read_all(name, &mut reader, done));
        }

        let result = feed_stdin(&mut writer);
        drop(writer);
        done.store(true, Ordering::Release);
        result
    })?;

    print!("{}", device.status());
    device.teardown();
    Ok(())
}

fn feed_stdin(
    writer: &mut impl Write<Error = ramdisk::StoreError>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Enter text (empty line to quit):");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Err(e) = writer.write_all(trimmed.as_bytes()) {
            eprintln!("Write error: {e}");
            break;
        }
    }
    Ok(())
}

/// Follow the device contents until the writer is finished and all data
/// has been seen.
fn read_all(name: &str, reader: &mut impl Read, done: &AtomicBool) {
    let mut buf = [0u8; 16];
    loop {
        let finished = done.load(Ordering::Acquire);
        match reader.read(&mut buf) {
            Ok(0) if finished => {
                println!("({name}) EOF");
                break;
            }
            Ok(0) => thread::sleep(Duration::from_millis(20)),
            Ok(n) => {
                let data = String::from_utf8_lossy(&buf[..n]);
                println!("({name}): {data}");
            }
            Err(e) => {
                eprintln!("({name}) Error: {e:?}");
                break;
            }
        }
    }
}
