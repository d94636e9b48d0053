use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use msgslot_core::{DeviceRegistry, ErrorKind, SlotError, MAX_MSG_LEN};
use proptest::prelude::*;

#[test]
fn channels_are_isolated() {
    let registry = DeviceRegistry::new();
    let mut session = registry.open(0).expect("open should succeed");

    session.select_channel(2).unwrap();
    session.write(b"B").unwrap();
    session.select_channel(1).unwrap();
    session.write(b"A").unwrap();

    session.select_channel(2).unwrap();
    assert_eq!(session.read(MAX_MSG_LEN).unwrap().as_ref(), b"B");
    session.select_channel(1).unwrap();
    assert_eq!(session.read(MAX_MSG_LEN).unwrap().as_ref(), b"A");
}

#[test]
fn overwrite_keeps_only_latest() {
    let registry = DeviceRegistry::new();
    let mut session = registry.open(0).unwrap();
    session.select_channel(5).unwrap();
    session.write(b"first message, rather long").unwrap();
    session.write(b"second").unwrap();
    assert_eq!(session.read(MAX_MSG_LEN).unwrap().as_ref(), b"second");
}

#[test]
fn messages_persist_across_sessions() {
    let registry = DeviceRegistry::new();

    let mut writer = registry.open(7).unwrap();
    writer.select_channel(33).unwrap();
    writer.write(b"left behind").unwrap();
    writer.close().unwrap();

    let mut reader = registry.open(7).unwrap();
    assert_eq!(reader.selected_channel(), None);
    reader.select_channel(33).unwrap();
    assert_eq!(reader.read(MAX_MSG_LEN).unwrap().as_ref(), b"left behind");
    reader.close().unwrap();
}

#[test]
fn devices_do_not_share_channels() {
    let registry = DeviceRegistry::new();
    let mut a = registry.open(1).unwrap();
    let mut b = registry.open(2).unwrap();
    a.select_channel(1).unwrap();
    b.select_channel(1).unwrap();

    a.write(b"on device one").unwrap();
    assert_eq!(b.read(MAX_MSG_LEN).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn second_open_is_busy_until_close() {
    let registry = DeviceRegistry::new();
    let first = registry.open(4).unwrap();

    let err = registry.open(4).unwrap_err();
    assert_eq!(err, SlotError::Busy(4));
    assert_eq!(err.kind(), ErrorKind::Busy);

    first.close().unwrap();
    registry.open(4).expect("open after close should succeed");
}

#[test]
fn boundary_conditions() {
    let registry = DeviceRegistry::new();
    let mut session = registry.open(0).unwrap();

    assert_eq!(
        session.read(MAX_MSG_LEN).unwrap_err().kind(),
        ErrorKind::NoChannelSelected
    );
    assert_eq!(
        session.select_channel(0).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );

    session.select_channel(9).unwrap();
    assert_eq!(
        session.read(MAX_MSG_LEN).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        session.write(&[]).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        session.write(&[1u8; MAX_MSG_LEN + 1]).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(session.write(&[1u8; MAX_MSG_LEN]).unwrap(), MAX_MSG_LEN);
}

#[test]
fn concurrent_open_admits_exactly_one() {
    let registry = Arc::new(DeviceRegistry::new());
    let barrier = Arc::new(Barrier::new(16));
    let admitted = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            let admitted = Arc::clone(&admitted);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                barrier.wait();
                let held = match registry.open(42) {
                    Ok(session) => {
                        admitted.fetch_add(1, Ordering::SeqCst);
                        Some(session)
                    }
                    Err(err) => {
                        assert_eq!(err, SlotError::Busy(42));
                        None
                    }
                };
                // Hold any admitted session until every thread has tried.
                done.wait();
                drop(held);
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread should finish");
    }
    assert_eq!(admitted.load(Ordering::SeqCst), 1);
    assert!(!registry.is_occupied(42));
}

#[test]
fn concurrent_devices_never_tear_messages() {
    let registry = Arc::new(DeviceRegistry::new());

    let handles: Vec<_> = (0..8u32)
        .map(|device| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut session = registry.open(device).unwrap();
                for round in 0..200u32 {
                    let channel = i64::from(round % 4 + 1);
                    session.select_channel(channel).unwrap();
                    let fill = (round % 251) as u8;
                    let len = (round as usize % MAX_MSG_LEN) + 1;
                    session.write(&vec![fill; len]).unwrap();

                    let got = session.read(MAX_MSG_LEN).unwrap();
                    assert_eq!(got.len(), len);
                    assert!(got.iter().all(|b| *b == fill));
                }
                session.close().unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread should finish");
    }
    assert_eq!(registry.device_count(), 8);
    for device in 0..8 {
        assert_eq!(registry.snapshot(device).unwrap().channels.len(), 4);
    }
}

#[test]
fn shared_session_reads_are_never_torn() {
    const WRITERS: u8 = 4;
    const ROUNDS: usize = 500;

    let registry = DeviceRegistry::new();
    let mut session = registry.open(12).unwrap();
    session.select_channel(1).unwrap();
    session.write(&[0u8; MAX_MSG_LEN]).unwrap();
    let session = &session;

    // Writer `w` only ever stores `w` repeated to a length derived from `w`.
    let len_for = |fill: u8| MAX_MSG_LEN - usize::from(fill) * 7;

    thread::scope(|scope| {
        for fill in 1..=WRITERS {
            scope.spawn(move || {
                let payload = vec![fill; len_for(fill)];
                for _ in 0..ROUNDS {
                    assert_eq!(session.write(&payload).unwrap(), payload.len());
                }
            });
        }
        for _ in 0..WRITERS {
            scope.spawn(move || {
                for _ in 0..ROUNDS {
                    let got = session.read(MAX_MSG_LEN).unwrap();
                    let fill = got[0];
                    assert!(got.iter().all(|b| *b == fill), "mixed message {got:?}");
                    let expected = if fill == 0 { MAX_MSG_LEN } else { len_for(fill) };
                    assert_eq!(got.len(), expected, "length does not match fill {fill}");
                }
            });
        }
    });

    let last = session.read(MAX_MSG_LEN).unwrap();
    assert!((1..=WRITERS).contains(&last[0]));
}

#[test]
fn one_device_many_channels_under_contention() {
    let registry = Arc::new(DeviceRegistry::new());
    let entry = registry.get_or_create(13).unwrap();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (1..=8u32)
        .map(|channel| {
            let entry = Arc::clone(&entry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let id = msgslot_core::ChannelId::try_from(channel).unwrap();
                barrier.wait();
                for round in 0..300usize {
                    let fill = channel as u8;
                    let len = round % MAX_MSG_LEN + 1;
                    entry.upsert(id, &vec![fill; len]).unwrap();
                    let got = entry.lookup(id).unwrap();
                    assert_eq!(got.len(), len);
                    assert!(got.as_bytes().iter().all(|b| *b == fill));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread should finish");
    }
    assert_eq!(registry.snapshot(13).unwrap().channels.len(), 8);
}

proptest! {
    #[test]
    fn write_then_read_returns_exact_bytes(
        channel in 1i64..=i64::from(u32::MAX),
        payload in proptest::collection::vec(any::<u8>(), 1..=MAX_MSG_LEN),
    ) {
        let registry = DeviceRegistry::new();
        let mut session = registry.open(0).unwrap();
        session.select_channel(channel).unwrap();
        prop_assert_eq!(session.write(&payload).unwrap(), payload.len());
        let got = session.read(payload.len()).unwrap();
        prop_assert_eq!(got.as_ref(), payload.as_slice());
    }
}
