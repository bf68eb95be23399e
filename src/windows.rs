//! This module defines the windows thread identity query.

use windows::Win32::System::Threading::GetCurrentThreadId;

/// An alias type for a native thread id.
///
/// The value is the WinAPI thread id, not related to
/// [`std::thread::ThreadId`] in any way.
pub type ThreadId = u64;

/// Returns the calling thread's native id.
///
/// The WinAPI id is process-wide unique and is what debuggers and
/// profilers on Windows report for a thread.
///
/// # Usage
///
/// ```rust
/// use thread_probe::thread_native_id;
///
/// assert!(thread_native_id() > 0);
/// ```
pub fn thread_native_id() -> ThreadId {
    unsafe { GetCurrentThreadId() as ThreadId }
}
