//! Thread probe. A test helper for verifying thread affinity.
//!
//! This crate backs a native test harness that needs to check on which
//! thread an SDK under test runs its callbacks. It answers three
//! identity questions (current thread, main thread, a freshly spawned
//! thread) and marshals an opaque native callback onto the main
//! thread's message queue.
//!
//! # Usage
//!
//! Comparing the caller against the main thread:
//!
//! ```rust
//! use thread_probe::*;
//!
//! let main_loop = MessageLoop::new().unwrap();
//! assert_ne!(main_thread_id(&main_loop), current_thread_id());
//! ```
//!
//! # More examples
//!
//! ### Capturing a throwaway worker's id
//!
//! ```rust
//! use thread_probe::*;
//!
//! let worker = spawned_thread_id().unwrap();
//! assert_ne!(worker, current_thread_id());
//! ```
//!
//! ### Running a native callback on the main thread
//!
//! The callback is identified by an opaque [`Token`]; what the token
//! means is entirely up to the native side.
//!
//! ```rust
//! use thread_probe::*;
//!
//! extern "C" fn nudge(_token: Token) {}
//!
//! let main_loop = MessageLoop::new().unwrap();
//! run_on_main_thread(&main_loop, nudge, Token::from_raw(7));
//! ```
//!
//! The main thread is not assumed to be the process entry thread: any
//! [`MainThreadDispatcher`] can stand in for the platform's real UI
//! dispatcher, which keeps the helper runnable in plain test binaries.
#![warn(missing_docs)]
#![deny(warnings)]

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};

#[cfg(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "ios",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "android",
))]
pub mod unix;
#[cfg(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "ios",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "android",
))]
pub use unix::*;

#[cfg(windows)]
pub mod windows;
#[cfg(windows)]
pub use windows::*;

/// A error type
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// The producer side of an id handshake died before signaling, so
    /// the captured value can never arrive. Waiting any longer would
    /// hang the caller forever.
    Handshake(&'static str),
    /// The main-thread dispatcher no longer accepts work, usually
    /// because its queue has been shut down.
    Dispatch(&'static str),
    /// The OS refused to spawn a helper thread. Carries the
    /// [`std::io::ErrorKind`] reported by the spawn call.
    Spawn(std::io::ErrorKind),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Spawn(e.kind())
    }
}

/// An opaque handle accompanying a native callback.
///
/// The value crosses this crate unchanged; only the native side knows
/// whether it is a pointer, an index or anything else.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Token(u64);

impl Token {
    /// Wraps a raw value obtained from the native side.
    pub fn from_raw(value: u64) -> Self {
        Token(value)
    }

    /// Returns the raw value for handing back to the native side.
    pub fn into_raw(self) -> u64 {
        self.0
    }
}

/// A native callback, parameterized by its opaque [`Token`].
///
/// This is the unit under test: everything it does is owned by the
/// calling/native side and out of scope here.
pub type NativeCallback = extern "C" fn(Token);

/// A unit of work accepted by a [`MainThreadDispatcher`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The injected stand-in for the platform's main-thread dispatcher.
///
/// On a real device this would be backed by the UI event loop; in
/// tests, [`MessageLoop`] provides the same shape on a plain thread.
pub trait MainThreadDispatcher {
    /// Returns the native id of the thread that runs posted jobs.
    ///
    /// The value must be stable for the lifetime of the dispatcher.
    fn thread_id(&self) -> ThreadId;

    /// Enqueues a job behind any previously posted work.
    ///
    /// Returns [`Error::Dispatch`] if the queue no longer accepts
    /// work. Never blocks on the job's execution.
    fn post(&self, job: Job) -> Result<(), Error>;
}

/// Single-use holder carrying a captured thread id from the thread
/// that owns it to the one waiting for it.
///
/// The `captured` flag is the wait predicate; the waiter re-checks it
/// after every wakeup, so spurious wakeups and lost notifications are
/// both harmless.
struct IdCapture {
    state: Mutex<CaptureState>,
    ready: Condvar,
}

struct CaptureState {
    captured: bool,
    id: ThreadId,
}

impl IdCapture {
    fn new() -> Self {
        IdCapture {
            state: Mutex::new(CaptureState {
                captured: false,
                id: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Publishes the producer's id and wakes the waiter. The notify
    /// happens under the lock so the waiter cannot miss it.
    fn record(&self, id: ThreadId) {
        if let Ok(mut state) = self.state.lock() {
            state.id = id;
            state.captured = true;
            self.ready.notify_all();
        }
    }

    /// Blocks until the producer has published its id.
    ///
    /// There is no timeout: a producer that never runs leaves the
    /// caller blocked indefinitely. A producer that dies while holding
    /// the lock poisons it, which surfaces as [`Error::Handshake`].
    fn wait_for_id(&self) -> Result<ThreadId, Error> {
        let poisoned = Error::Handshake("the id-capture producer died before signaling");
        let mut state = self.state.lock().map_err(|_| poisoned.clone())?;
        while !state.captured {
            state = self.ready.wait(state).map_err(|_| poisoned.clone())?;
        }
        Ok(state.id)
    }
}

/// Returns the calling thread's native id.
///
/// # Usage
///
/// ```rust
/// use thread_probe::*;
///
/// assert_eq!(current_thread_id(), current_thread_id());
/// ```
pub fn current_thread_id() -> ThreadId {
    thread_native_id()
}

/// Returns the native id of the dispatcher's main thread.
///
/// The value is stable across repeated calls for one dispatcher.
pub fn main_thread_id<D: MainThreadDispatcher + ?Sized>(dispatcher: &D) -> ThreadId {
    dispatcher.thread_id()
}

/// Spawns a throwaway worker thread and returns its native id.
///
/// The worker records its own id into a fresh holder and signals; the
/// caller blocks until that signal arrives. The worker is detached and
/// never reused, and each call gets its own holder, so concurrent
/// callers always observe distinct, freshly created workers.
///
/// No timeout is applied to the wait. A worker that dies mid-handshake
/// surfaces as [`Error::Handshake`]; a spawn refused by the OS
/// surfaces as [`Error::Spawn`].
///
/// # Usage
///
/// ```rust
/// use thread_probe::*;
///
/// let worker = spawned_thread_id().unwrap();
/// assert_ne!(worker, current_thread_id());
/// ```
pub fn spawned_thread_id() -> Result<ThreadId, Error> {
    let capture = Arc::new(IdCapture::new());
    let producer = Arc::clone(&capture);

    std::thread::Builder::new()
        .name("id-capture".to_owned())
        .spawn(move || producer.record(thread_native_id()))?;

    log::debug!(
        "Waiting for the id-capture worker spawned from Rust Thread ID {:?}",
        std::thread::current().id(),
    );
    capture.wait_for_id()
}

/// Schedules a native callback to run on the dispatcher's main thread.
///
/// Returns as soon as the job is queued; the callback itself runs
/// later, behind any work already in the queue.
///
/// # Panics
///
/// Panics if the dispatcher rejects the job. Failing to schedule test
/// instrumentation leaves the harness with nothing meaningful to
/// verify, so the failure aborts the test instead of being swallowed.
pub fn run_on_main_thread<D: MainThreadDispatcher + ?Sized>(
    dispatcher: &D,
    callback: NativeCallback,
    token: Token,
) {
    let result = dispatcher.post(Box::new(move || callback(token)));
    if let Err(e) = result {
        log::error!("Couldn't post the native callback for token {token:?}: {e:?}");
        panic!("posting to the main-thread dispatcher failed: {e:?}");
    }
}

/// A minimal message loop backing [`MainThreadDispatcher`] in tests.
///
/// A dedicated thread drains an unbounded channel in FIFO order,
/// mirroring the shape of a platform UI loop without depending on one.
/// Dropping the loop closes the queue, lets already-posted jobs finish
/// and joins the thread.
///
/// ```rust
/// use thread_probe::*;
///
/// let main_loop = MessageLoop::new().unwrap();
/// assert_eq!(main_thread_id(&main_loop), main_thread_id(&main_loop));
/// ```
pub struct MessageLoop {
    sender: Option<mpsc::Sender<Job>>,
    thread_id: ThreadId,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl MessageLoop {
    /// Starts the loop thread and waits for it to publish its id.
    pub fn new() -> Result<Self, Error> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let capture = Arc::new(IdCapture::new());
        let producer = Arc::clone(&capture);

        let handle = std::thread::Builder::new()
            .name("message-loop".to_owned())
            .spawn(move || {
                producer.record(thread_native_id());
                while let Ok(job) = receiver.recv() {
                    job();
                }
            })?;
        let thread_id = capture.wait_for_id()?;

        Ok(MessageLoop {
            sender: Some(sender),
            thread_id,
            handle: Some(handle),
        })
    }

    /// Closes the queue and joins the loop thread.
    ///
    /// Jobs already in the queue still run before the thread exits.
    /// Posting after shutdown yields [`Error::Dispatch`].
    pub fn shutdown(&mut self) {
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl MainThreadDispatcher for MessageLoop {
    fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    fn post(&self, job: Job) -> Result<(), Error> {
        let sender = self
            .sender
            .as_ref()
            .ok_or(Error::Dispatch("the message loop has been shut down"))?;
        sender
            .send(job)
            .map_err(|_| Error::Dispatch("the message loop thread is gone"))
    }
}

impl Drop for MessageLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}
