//! This module defines the unix thread identity query.
//!
//! Every unix-like target exposes some notion of a native thread
//! identifier, but not through a single API; this module picks the
//! most specific one available and widens it to a common alias.

/// An alias type for a native thread id.
///
/// The value is an OS-level identifier, not related to
/// [`std::thread::ThreadId`] in any way.
pub type ThreadId = u64;

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        /// Returns the calling thread's native id.
        ///
        /// On Linux and Android this is the kernel thread id
        /// (`gettid`), which is what the platform's own tooling
        /// reports for a thread.
        ///
        /// # Usage
        ///
        /// ```rust
        /// use thread_probe::thread_native_id;
        ///
        /// assert!(thread_native_id() > 0);
        /// ```
        pub fn thread_native_id() -> ThreadId {
            // gettid(2) has no failure mode for the calling thread.
            unsafe { libc::syscall(libc::SYS_gettid) as ThreadId }
        }
    } else if #[cfg(any(target_os = "macos", target_os = "ios"))] {
        /// Returns the calling thread's native id.
        ///
        /// On Apple platforms this is the system-wide unique thread
        /// id reported by `pthread_threadid_np`.
        pub fn thread_native_id() -> ThreadId {
            let mut tid: u64 = 0;
            // Cannot fail when querying the calling thread with a
            // valid output pointer.
            let rc = unsafe { libc::pthread_threadid_np(libc::pthread_self(), &mut tid) };
            debug_assert_eq!(rc, 0);
            tid
        }
    } else {
        /// Returns the calling thread's native id.
        ///
        /// On the remaining unix-likes the pthread handle itself is
        /// the only portable identifier.
        pub fn thread_native_id() -> ThreadId {
            unsafe { libc::pthread_self() as ThreadId }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::unix::*;

    #[test]
    fn native_id_is_nonzero_and_stable() {
        let first = thread_native_id();
        let second = thread_native_id();

        assert!(first > 0);
        assert_eq!(first, second);
    }

    #[test]
    fn native_id_differs_across_threads() {
        let here = thread_native_id();
        let there = std::thread::spawn(thread_native_id)
            .join()
            .expect("worker thread panicked");

        assert_ne!(here, there);
    }
}
