//! Poisoned-lock handling
//!
//! The camera slot, the fake backend counters and the logger handle sit behind
//! std mutexes. A panic while holding one of them surfaces as an error of the
//! caller's own type instead of a second panic.

use std::sync::LockResult;

/// Convert a poisoned lock into an application error
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use listscan::core::sync::handle_mutex_poison;
/// use listscan::camera::CameraError;
///
/// let slot = Mutex::new(None::<u64>);
/// let guard = handle_mutex_poison(slot.lock(), |reason| CameraError::Backend { reason }).unwrap();
/// assert!(guard.is_none());
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). A panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct SlotError {
        message: String,
    }

    #[test]
    fn test_handle_mutex_poison_success() {
        let mutex = Mutex::new(Some(7u64));
        let result = handle_mutex_poison(mutex.lock(), |msg| SlotError { message: msg });

        assert_eq!(*result.unwrap(), Some(7));
    }

    #[test]
    fn test_handle_mutex_poison_with_poisoned_mutex() {
        let mutex = Arc::new(Mutex::new(0u64));
        let mutex_clone = Arc::clone(&mutex);

        let _ = thread::spawn(move || {
            let _guard = mutex_clone.lock().unwrap();
            panic!("Intentional panic to poison mutex");
        })
        .join();

        let error = handle_mutex_poison(mutex.lock(), |msg| SlotError { message: msg })
            .unwrap_err();
        assert!(error.message.contains("mutex poisoned"));
    }
}
