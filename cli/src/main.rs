use cli::Session;
use ramdisk::{Device, DeviceConfig};
use std::io;
use tracing::info;

fn load_config() -> Result<DeviceConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read(&path)?;
            info!(path, "loading config");
            Ok(DeviceConfig::from_slice(&json)?)
        }
        None => Ok(DeviceConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let device = Device::new(load_config()?)?;
    Session::new(&device).run(io::stdin().lock(), io::stdout().lock())?;

    let status = device.teardown();
    info!(
        pages = status.num_pages,
        data_size = status.data_size,
        "device released"
    );
    Ok(())
}
