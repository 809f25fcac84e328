use ramdisk::{AccessMode, Device, DeviceConfig, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

const PAGE: usize = 256;

fn device(max_handles: u32) -> Device {
    Device::new(
        DeviceConfig::new()
            .with_page_size(PAGE)
            .with_max_handles(max_handles),
    )
    .unwrap()
}

#[test]
fn test_disjoint_writers_round_trip() {
    let dev = device(9);
    let setup = dev.open(AccessMode::ReadWrite).unwrap();
    // Preallocate so every writer overwrites inside the data size
    dev.write(setup, &vec![0u8; 8 * 1000]).unwrap();

    thread::scope(|s| {
        for t in 0..8u8 {
            let dev = &dev;
            s.spawn(move || {
                let id = dev.open(AccessMode::ReadWrite).unwrap();
                let chunk = vec![t + 1; 1000];
                for _ in 0..20 {
                    assert_eq!(dev.write_at(id, usize::from(t) * 1000, &chunk).unwrap(), 1000);
                    let mut buf = vec![0u8; 1000];
                    dev.read_at(id, usize::from(t) * 1000, &mut buf).unwrap();
                    assert_eq!(buf, chunk);
                }
                dev.close(id).unwrap();
            });
        }
    });

    let mut all = vec![0u8; 8000];
    assert_eq!(dev.read_at(setup, 0, &mut all).unwrap(), 8000);
    for (t, chunk) in all.chunks(1000).enumerate() {
        assert!(chunk.iter().all(|b| usize::from(*b) == t + 1));
    }
}

#[test]
fn test_concurrent_appends_keep_invariant() {
    let dev = device(4);
    thread::scope(|s| {
        for _ in 0..4 {
            let dev = &dev;
            s.spawn(move || {
                let id = dev.open(AccessMode::ReadWrite).unwrap();
                for _ in 0..50 {
                    let end = dev.store().data_size();
                    // Another appender may win the race; a refused write is fine
                    match dev.write_at(id, end, &[0xEE; 100]) {
                        Ok(100) | Err(StoreError::InvalidArgument(_)) => {}
                        other => panic!("unexpected write result {other:?}"),
                    }
                    let sizes = dev.store().sizes();
                    assert!(sizes.data_size <= sizes.capacity());
                }
                dev.close(id).unwrap();
            });
        }
    });

    let sizes = dev.store().sizes();
    assert!(sizes.data_size <= sizes.capacity());
    assert_eq!(sizes.num_pages, sizes.data_size.div_ceil(PAGE));
}

#[test]
fn test_truncate_races_writes() {
    let dev = device(8);
    thread::scope(|s| {
        for _ in 0..3 {
            let dev = &dev;
            s.spawn(move || {
                let id = dev.open(AccessMode::ReadWrite).unwrap();
                for _ in 0..200 {
                    let end = dev.store().data_size();
                    let _ = dev.write_at(id, end, &[1u8; 300]);
                }
                dev.close(id).unwrap();
            });
        }
        let dev = &dev;
        s.spawn(move || {
            for _ in 0..50 {
                let id = dev.open(AccessMode::WriteOnly).unwrap();
                dev.close(id).unwrap();
            }
        });
    });

    let sizes = dev.store().sizes();
    assert!(sizes.data_size <= sizes.capacity());
    assert_eq!(dev.status().active_count, 0);
}

#[test]
fn test_admission_under_contention() {
    let dev = device(3);
    let peak = AtomicUsize::new(0);
    let current = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..12 {
            s.spawn(|| {
                for _ in 0..200 {
                    if let Ok(id) = dev.open(AccessMode::ReadOnly) {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        current.fetch_sub(1, Ordering::SeqCst);
                        dev.close(id).unwrap();
                    }
                }
            });
        }
    });

    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(dev.status().active_count, 0);
}
