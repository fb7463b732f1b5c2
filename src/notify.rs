//! Transient user-facing messages.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

pub trait Notifier {
    fn notify(&self, level: Level, message: &str);

    fn success(&self, message: &str) {
        self.notify(Level::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }
}

/// Prints successes to stdout and errors to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Success => println!("✓ {}", message),
            Level::Error => eprintln!("✗ {}", message),
        }
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryNotifier;

#[cfg(test)]
mod memory {
    use super::{Level, Notifier};
    use std::cell::RefCell;

    /// Keeps every message so tests can inspect them.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryNotifier {
        messages: RefCell<Vec<(Level, String)>>,
    }

    impl MemoryNotifier {
        pub(crate) fn messages(&self) -> Vec<(Level, String)> {
            self.messages.borrow().clone()
        }

        pub(crate) fn errors(&self) -> Vec<String> {
            self.messages
                .borrow()
                .iter()
                .filter(|(level, _)| *level == Level::Error)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl Notifier for MemoryNotifier {
        fn notify(&self, level: Level, message: &str) {
            self.messages.borrow_mut().push((level, message.to_string()));
        }
    }

    #[test]
    fn errors_are_filtered_by_level() {
        let notifier = MemoryNotifier::default();
        notifier.success("ok");
        notifier.error("bad");
        assert_eq!(notifier.messages().len(), 2);
        assert_eq!(notifier.errors(), ["bad"]);
    }
}
