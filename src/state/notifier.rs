use crate::state::entity::ChangeEvent;
use anyhow::Result;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{error, warn};

/// Receives every change committed to the entity store.
///
/// Called synchronously on the mutating task, while the store still holds
/// its commit lock. Implementations must not block and must not mutate the
/// store (reads via `get`/`snapshot` are fine).
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, event: &ChangeEvent) -> Result<()>;
}

impl<F> ChangeObserver for F
where
    F: Fn(&ChangeEvent) -> Result<()> + Send + Sync,
{
    fn on_change(&self, event: &ChangeEvent) -> Result<()> {
        self(event)
    }
}

/// Ordered list of observers, registered once at startup
#[derive(Default)]
pub struct ChangeNotifier {
    observers: RwLock<Vec<Arc<dyn ChangeObserver>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. There is no removal; observers live as long as the process.
    pub fn add_observer(&self, observer: Arc<dyn ChangeObserver>) {
        self.observers
            .write()
            .expect("observer list lock poisoned")
            .push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .expect("observer list lock poisoned")
            .len()
    }

    /// Invoke every observer in registration order.
    ///
    /// A failing or panicking observer is logged and skipped; the rest still run.
    pub fn notify(&self, event: &ChangeEvent) {
        let observers = self.observers.read().expect("observer list lock poisoned");

        for (index, observer) in observers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| observer.on_change(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(entity = %event.entity, observer = index, error = %e, "Change observer failed");
                }
                Err(_panic) => {
                    error!(entity = %event.entity, observer = index, "Change observer panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::sync::Mutex;

    fn event(name: &str) -> ChangeEvent {
        ChangeEvent::new(name, Map::new())
    }

    #[test]
    fn test_observers_run_in_registration_order() {
        let notifier = ChangeNotifier::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let calls = Arc::clone(&calls);
            notifier.add_observer(Arc::new(move |e: &ChangeEvent| -> Result<()> {
                calls.lock().unwrap().push(format!("{}:{}", tag, e.entity));
                Ok(())
            }));
        }

        notifier.notify(&event("a"));

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["first:a", "second:a", "third:a"]
        );
    }

    #[test]
    fn test_failing_observer_does_not_stop_others() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(0));

        notifier.add_observer(Arc::new(|_: &ChangeEvent| -> Result<()> {
            anyhow::bail!("boom")
        }));
        let seen_clone = Arc::clone(&seen);
        notifier.add_observer(Arc::new(move |_: &ChangeEvent| -> Result<()> {
            *seen_clone.lock().unwrap() += 1;
            Ok(())
        }));

        notifier.notify(&event("a"));
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn test_panicking_observer_is_contained() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(0));

        notifier.add_observer(Arc::new(|_: &ChangeEvent| -> Result<()> {
            panic!("observer exploded")
        }));
        let seen_clone = Arc::clone(&seen);
        notifier.add_observer(Arc::new(move |_: &ChangeEvent| -> Result<()> {
            *seen_clone.lock().unwrap() += 1;
            Ok(())
        }));

        notifier.notify(&event("a"));
        notifier.notify(&event("b"));
        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
