use rstest::rstest;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thread_probe::*;

/// What the native side would keep behind its opaque handle: the
/// token doubles as a pointer to this record, exactly like the
/// harness this crate serves.
#[derive(Default)]
struct RunRecord {
    invocations: AtomicUsize,
    observed_token: AtomicU64,
    observed_thread: AtomicU64,
}

extern "C" fn record_run(token: Token) {
    let record = unsafe { &*(token.into_raw() as *const RunRecord) };
    record.invocations.fetch_add(1, Ordering::SeqCst);
    record.observed_token.store(token.into_raw(), Ordering::SeqCst);
    record
        .observed_thread
        .store(current_thread_id(), Ordering::SeqCst);
}

extern "C" fn noop(_token: Token) {}

#[rstest]
fn callback_runs_exactly_once_on_the_main_thread_with_its_token() {
    let mut main_loop = MessageLoop::new().unwrap();
    let main_id = main_thread_id(&main_loop);
    let record = RunRecord::default();
    let raw = &record as *const RunRecord as u64;

    run_on_main_thread(&main_loop, record_run, Token::from_raw(raw));
    // Shutdown drains the queue and joins, so the callback has run.
    main_loop.shutdown();

    assert_eq!(record.invocations.load(Ordering::SeqCst), 1);
    assert_eq!(record.observed_token.load(Ordering::SeqCst), raw);
    assert_eq!(record.observed_thread.load(Ordering::SeqCst), main_id);
}

#[rstest]
fn posted_jobs_run_in_fifo_order() {
    let mut main_loop = MessageLoop::new().unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    for n in 1..=3u64 {
        let order = Arc::clone(&order);
        main_loop
            .post(Box::new(move || order.lock().unwrap().push(n)))
            .unwrap();
    }
    main_loop.shutdown();

    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
}

#[rstest]
fn post_after_shutdown_is_rejected() {
    let mut main_loop = MessageLoop::new().unwrap();
    main_loop.shutdown();

    let result = main_loop.post(Box::new(|| {}));
    assert!(matches!(result, Err(Error::Dispatch(_))));
}

#[rstest]
fn main_thread_id_survives_shutdown() {
    let mut main_loop = MessageLoop::new().unwrap();
    let before = main_thread_id(&main_loop);
    main_loop.shutdown();

    assert_eq!(main_thread_id(&main_loop), before);
}

#[test]
#[should_panic(expected = "posting to the main-thread dispatcher failed")]
fn run_on_main_thread_escalates_a_rejected_post() {
    let mut main_loop = MessageLoop::new().unwrap();
    main_loop.shutdown();

    run_on_main_thread(&main_loop, noop, Token::from_raw(0));
}
