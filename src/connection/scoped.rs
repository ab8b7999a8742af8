use std::ops::{Deref, DerefMut};

use super::Closeable;
use crate::observer::ExecutionObserver;

/// Owns an acquired handle and closes it exactly once when dropped.
///
/// Release runs on every exit path, including early returns through `?`
/// and unwinding. A failing `close` is reported to the observer and
/// otherwise ignored, so it can never mask the error that caused the exit.
pub struct Scoped<'o, T: Closeable + ?Sized> {
    handle: Box<T>,
    observer: &'o dyn ExecutionObserver,
}

impl<'o, T: Closeable + ?Sized> Scoped<'o, T> {
    pub fn new(handle: Box<T>, observer: &'o dyn ExecutionObserver) -> Self {
        Self { handle, observer }
    }
}

impl<T: Closeable + ?Sized> Deref for Scoped<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.handle
    }
}

impl<T: Closeable + ?Sized> DerefMut for Scoped<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.handle
    }
}

impl<T: Closeable + ?Sized> Drop for Scoped<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.handle.close() {
            self.observer.on_release_failure(self.handle.resource_name(), &e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DriverError;
    use std::cell::{Cell, RefCell};

    struct Handle<'a> {
        closes: &'a Cell<usize>,
        fail: bool,
    }

    impl Closeable for Handle<'_> {
        fn resource_name(&self) -> &'static str {
            "statement"
        }

        fn close(&mut self) -> Result<(), DriverError> {
            self.closes.set(self.closes.get() + 1);
            if self.fail {
                Err(DriverError::database("close failed"))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        failures: RefCell<Vec<String>>,
    }

    impl ExecutionObserver for Recorder {
        fn on_command(&self, _operation: &str, _sql: &str) {}
        fn on_comment(&self, _message: &str) {}
        fn on_release_failure(&self, resource: &'static str, error: &DriverError) {
            self.failures.borrow_mut().push(format!("{resource}: {error}"));
        }
    }

    #[test]
    fn test_closes_once_on_drop() {
        let closes = Cell::new(0);
        let recorder = Recorder::default();
        {
            let _guard = Scoped::new(Box::new(Handle { closes: &closes, fail: false }), &recorder);
        }
        assert_eq!(closes.get(), 1);
        assert!(recorder.failures.borrow().is_empty());
    }

    #[test]
    fn test_close_failure_goes_to_observer_only() {
        let closes = Cell::new(0);
        let recorder = Recorder::default();

        let outcome: Result<(), String> = (|| {
            let _guard = Scoped::new(Box::new(Handle { closes: &closes, fail: true }), &recorder);
            Err("execution failed".to_string())
        })();

        assert_eq!(outcome, Err("execution failed".to_string()));
        assert_eq!(closes.get(), 1);
        assert_eq!(*recorder.failures.borrow(), vec!["statement: close failed".to_string()]);
    }
}
