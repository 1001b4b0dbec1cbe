use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out ordinals `0..total` exactly once across all workers.
#[derive(Debug)]
pub(super) struct TaskQueue {
    total: u64,
    next: AtomicU64,
}

impl TaskQueue {
    pub(super) const fn new(total: u64) -> Self {
        Self {
            total,
            next: AtomicU64::new(0),
        }
    }

    pub(super) fn claim(&self) -> Option<u64> {
        loop {
            let current = self.next.load(Ordering::Relaxed);
            if current >= self.total {
                return None;
            }
            let next = current.checked_add(1)?;
            if self
                .next
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Some(current);
            }
        }
    }

    pub(super) fn dispatched(&self) -> u64 {
        self.next.load(Ordering::Relaxed).min(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn claims_each_ordinal_once_in_order() -> Result<(), String> {
        let queue = TaskQueue::new(3);
        let claimed: Vec<u64> = std::iter::from_fn(|| queue.claim()).collect();
        if claimed != [0, 1, 2] {
            return Err(format!("Unexpected claims: {:?}", claimed));
        }
        if queue.claim().is_some() || queue.dispatched() != 3 {
            return Err("Queue should be exhausted".to_owned());
        }
        Ok(())
    }

    #[test]
    fn concurrent_claims_have_no_gaps_or_duplicates() -> Result<(), String> {
        const TOTAL: u64 = 10_000;
        let queue = Arc::new(TaskQueue::new(TOTAL));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || std::iter::from_fn(|| queue.claim()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = BTreeSet::new();
        for handle in handles {
            let claimed = handle
                .join()
                .map_err(|_join_err| "claim thread panicked".to_owned())?;
            for ordinal in claimed {
                if !seen.insert(ordinal) {
                    return Err(format!("Ordinal {} claimed twice", ordinal));
                }
            }
        }
        let expected: BTreeSet<u64> = (0..TOTAL).collect();
        if seen != expected {
            return Err(format!("Expected {} ordinals, saw {}", TOTAL, seen.len()));
        }
        Ok(())
    }
}
