use embedded_io::{Read, Seek, SeekFrom, Write};
use ramdisk::{AccessMode, Device, DeviceConfig, StoreError};

fn device() -> Device {
    Device::new(DeviceConfig::new().with_page_size(32).with_max_handles(2)).unwrap()
}

#[test]
fn test_write_seek_read() {
    let dev = device();
    let mut file = dev.open_file(AccessMode::ReadWrite).unwrap();
    file.write_all(b"the quick brown fox jumps over the lazy dog").unwrap();
    assert_eq!(file.seek(SeekFrom::Start(4)).unwrap(), 4);

    let mut buf = [0u8; 5];
    file.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"quick");
    assert_eq!(file.seek(SeekFrom::Current(0)).unwrap(), 9);
    assert_eq!(file.seek(SeekFrom::End(-3)).unwrap(), 40);
}

#[test]
fn test_drop_closes_handle() {
    let dev = device();
    {
        let _a = dev.open_file(AccessMode::ReadOnly).unwrap();
        let _b = dev.open_file(AccessMode::ReadOnly).unwrap();
        assert_eq!(dev.open_file(AccessMode::ReadOnly).unwrap_err(), StoreError::Busy);
    }
    assert_eq!(dev.status().active_count, 0);
    dev.open_file(AccessMode::ReadOnly).unwrap();
}

#[test]
fn test_partial_write_reported_as_count() {
    let dev = Device::new(DeviceConfig::new().with_page_size(32).with_max_pages(1)).unwrap();
    let mut file = dev.open_file(AccessMode::WriteOnly).unwrap();
    assert_eq!(file.write(&[9u8; 50]).unwrap(), 32);
    assert_eq!(
        file.write(&[9u8; 1]).unwrap_err(),
        StoreError::OutOfMemory { written: 0 }
    );
    assert_eq!(file.position().unwrap(), 32);
}

#[tokio::test]
async fn test_async_read_write() {
    use embedded_io_async::{Read as AsyncRead, Write as AsyncWrite};

    let dev = device();
    let mut writer = dev.open_file(AccessMode::WriteOnly).unwrap();
    AsyncWrite::write_all(&mut writer, b"async bytes").await.unwrap();

    let mut reader = dev.open_file(AccessMode::ReadOnly).unwrap();
    let mut buf = [0u8; 32];
    let n = AsyncRead::read(&mut reader, &mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"async bytes");
    assert_eq!(AsyncRead::read(&mut reader, &mut buf).await.unwrap(), 0);
}
