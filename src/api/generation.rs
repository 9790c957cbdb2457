use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Identifies one request among those issued by a `RequestGeneration`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Monotonic counter handing out request tickets
#[derive(Debug, Default)]
pub struct RequestGeneration {
    issued: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no later request has been started since `ticket`
    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }
}

/// Holds the response of the newest request applied so far.
///
/// A response whose ticket is older than the one already applied is dropped,
/// so a slow early request can never overwrite a faster later one.
#[derive(Debug)]
pub struct LatestOnly<T> {
    generation: RequestGeneration,
    slot: Mutex<Option<(Ticket, T)>>,
}

impl<T> Default for LatestOnly<T> {
    fn default() -> Self {
        Self {
            generation: RequestGeneration::new(),
            slot: Mutex::new(None),
        }
    }
}

impl<T> LatestOnly<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        self.generation.begin()
    }

    /// Stores `value` unless a newer response is already in place
    pub fn apply(&self, ticket: Ticket, value: T) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some((applied, _)) if *applied > ticket => {
                tracing::debug!(?ticket, ?applied, "discarding stale response");
                false
            }
            _ => {
                *slot = Some((ticket, value));
                true
            }
        }
    }

    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

impl<T: Clone> LatestOnly<T> {
    pub fn get(&self) -> Option<T> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|(_, value)| value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_increase() {
        let generation = RequestGeneration::new();
        let a = generation.begin();
        let b = generation.begin();
        assert!(b > a);
        assert!(generation.is_latest(b));
        assert!(!generation.is_latest(a));
    }

    #[test]
    fn slow_early_response_is_discarded() {
        let latest = LatestOnly::new();
        let early = latest.begin();
        let late = latest.begin();

        assert!(latest.apply(late, "fresh"));
        assert!(!latest.apply(early, "stale"));
        assert_eq!(latest.get(), Some("fresh"));
    }

    #[test]
    fn in_order_responses_all_apply() {
        let latest = LatestOnly::new();
        let first = latest.begin();
        assert!(latest.apply(first, 1));
        let second = latest.begin();
        assert!(latest.apply(second, 2));
        assert_eq!(latest.get(), Some(2));

        latest.clear();
        assert_eq!(latest.get(), None);
    }
}
