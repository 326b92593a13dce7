//! Busy indicator shared by everything that starts long-running work.
//!
//! Work registers itself by acquiring a [`BusyGuard`]; the indicator reads as busy while at
//! least one guard is alive. Guards release on drop, so early returns, errors and panics all
//! clear their entry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::trace;

#[derive(Debug)]
struct Entry {
    id: u64,
    label: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    next_id: AtomicU64,
    entries: Mutex<Vec<Entry>>,
}

impl State {
    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle to a shared busy state.
#[derive(Clone, Debug, Default)]
pub struct BusyIndicator {
    state: Arc<State>,
}

impl BusyIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the indicator busy until the returned guard is dropped.
    pub fn acquire(&self, label: Option<&str>) -> BusyGuard {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        self.state.entries().push(Entry {
            id,
            label: label.map(str::to_owned),
        });
        trace!("busy token {} acquired ({:?})", id, label);
        BusyGuard {
            state: Arc::clone(&self.state),
            id,
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.state.entries().is_empty()
    }

    /// Number of guards currently alive.
    pub fn outstanding(&self) -> usize {
        self.state.entries().len()
    }

    /// Label of the most recently acquired guard that carries one.
    pub fn current_label(&self) -> Option<String> {
        self.state
            .entries()
            .iter()
            .rev()
            .find_map(|entry| entry.label.clone())
    }

    /// Runs `work` while holding a guard.
    pub fn wrap<T>(&self, label: Option<&str>, work: impl FnOnce() -> T) -> T {
        let _guard = self.acquire(label);
        work()
    }
}

/// Token returned by [`BusyIndicator::acquire`].
#[must_use = "the indicator is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BusyGuard {
    state: Arc<State>,
    id: u64,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut entries = self.state.entries();
        if let Some(position) = entries.iter().position(|entry| entry.id == self.id) {
            entries.remove(position);
        }
        trace!("busy token {} released", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_clears_on_drop() {
        let busy = BusyIndicator::new();
        assert!(!busy.is_busy());
        {
            let _guard = busy.acquire(Some("Génération du PDF"));
            assert!(busy.is_busy());
            assert_eq!(busy.current_label().as_deref(), Some("Génération du PDF"));
        }
        assert!(!busy.is_busy());
        assert_eq!(busy.current_label(), None);
    }

    #[test]
    fn nested_guards_compose() {
        let busy = BusyIndicator::new();
        let outer = busy.acquire(Some("outer"));
        let inner = busy.clone().acquire(None);
        assert_eq!(busy.outstanding(), 2);
        assert_eq!(busy.current_label().as_deref(), Some("outer"));

        drop(outer);
        assert!(busy.is_busy());
        drop(inner);
        assert!(!busy.is_busy());
    }

    #[test]
    fn released_after_error_and_panic() {
        let busy = BusyIndicator::new();
        let result: Result<(), &str> = busy.wrap(Some("failing"), || Err("boom"));
        assert!(result.is_err());
        assert!(!busy.is_busy());

        let shared = busy.clone();
        let outcome = std::panic::catch_unwind(move || {
            shared.wrap(None, || panic!("renderer crashed"));
        });
        assert!(outcome.is_err());
        assert!(!busy.is_busy());
    }

    #[test]
    fn guards_cross_threads() {
        let busy = BusyIndicator::new();
        let guard = busy.acquire(Some("worker"));
        let handle = std::thread::spawn(move || drop(guard));
        handle.join().expect("thread");
        assert!(!busy.is_busy());
    }
}
