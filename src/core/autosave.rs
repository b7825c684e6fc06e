//! Per-entity debounce for keystroke-rate edits: one cancellable delay
//! task per attendance cell. Scheduling again for the same key aborts the
//! previous task, so a burst of edits produces a single write. The commit
//! future is built by the caller and must re-read the current overlay
//! value when it runs, never a value captured at schedule time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use actix_web::rt::{self, task::JoinHandle, time::sleep};

use crate::core::overlay::OverlayKey;

pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 600;

/// Cancellable-task registry keyed by attendance cell.
#[derive(Debug)]
pub struct AutoSave {
    delay: Duration,
    tasks: Mutex<HashMap<OverlayKey, JoinHandle<()>>>,
}

impl AutoSave {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Arm (or re-arm) the timer for `key`. Any task already pending for
    /// the same key is aborted, which is what coalesces a burst of edits
    /// into one commit carrying the final value.
    pub fn schedule<F>(&self, key: OverlayKey, commit: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let delay = self.delay;
        let handle = rt::spawn(async move {
            sleep(delay).await;
            commit.await;
        });

        let mut tasks = self.tasks.lock().unwrap();
        if let Some(previous) = tasks.insert(key, handle) {
            previous.abort();
        }
    }

    /// Drop any pending commit for `key` without running it.
    pub fn cancel(&self, key: &OverlayKey) {
        if let Some(handle) = self.tasks.lock().unwrap().remove(key) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn key(member: u64) -> OverlayKey {
        (7, member, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
    }

    #[actix_web::test]
    async fn burst_of_edits_commits_once_with_the_final_value() {
        let autosave = AutoSave::new(Duration::from_millis(40));
        let current = Arc::new(Mutex::new(String::new()));
        let writes: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        for n in 1..=5 {
            *current.lock().unwrap() = format!("draft {n}");
            let current = Arc::clone(&current);
            let writes = Arc::clone(&writes);
            autosave.schedule(key(1), async move {
                let value = current.lock().unwrap().clone();
                writes.lock().unwrap().push(value);
            });
            sleep(Duration::from_millis(5)).await;
        }

        sleep(Duration::from_millis(120)).await;
        assert_eq!(*writes.lock().unwrap(), vec!["draft 5".to_owned()]);
    }

    #[actix_web::test]
    async fn commit_reads_the_value_current_at_fire_time() {
        let autosave = AutoSave::new(Duration::from_millis(40));
        let current = Arc::new(Mutex::new("scheduled".to_owned()));
        let writes: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        {
            let current = Arc::clone(&current);
            let writes = Arc::clone(&writes);
            autosave.schedule(key(1), async move {
                writes.lock().unwrap().push(current.lock().unwrap().clone());
            });
        }
        // Mutate after scheduling but before the timer fires.
        *current.lock().unwrap() = "edited later".to_owned();

        sleep(Duration::from_millis(120)).await;
        assert_eq!(*writes.lock().unwrap(), vec!["edited later".to_owned()]);
    }

    #[actix_web::test]
    async fn distinct_keys_do_not_cancel_each_other() {
        let autosave = AutoSave::new(Duration::from_millis(20));
        let writes: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));

        for member in [1, 2] {
            let writes = Arc::clone(&writes);
            autosave.schedule(key(member), async move {
                writes.lock().unwrap().push(member);
            });
        }

        sleep(Duration::from_millis(100)).await;
        let mut seen = writes.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);
    }

    #[actix_web::test]
    async fn cancel_drops_the_pending_commit() {
        let autosave = AutoSave::new(Duration::from_millis(20));
        let writes: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));

        {
            let writes = Arc::clone(&writes);
            autosave.schedule(key(1), async move {
                writes.lock().unwrap().push(1);
            });
        }
        autosave.cancel(&key(1));

        sleep(Duration::from_millis(80)).await;
        assert!(writes.lock().unwrap().is_empty());
    }
}
