use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Handle for one in-flight directory request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

impl SearchTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Latest-request-wins guard for search-driven directory fetches.
///
/// Every keystroke issues a new ticket; a response is applied only if its
/// ticket is still the newest one issued, so a slow response to an older
/// query can never overwrite a newer result.
#[derive(Debug, Default)]
pub struct SearchSequencer {
    latest: AtomicU64,
}

impl SearchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Pass the response through if its ticket is current, drop it otherwise.
    pub fn accept<T>(&self, ticket: SearchTicket, response: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(response)
        } else {
            debug!(
                ticket = ticket.0,
                latest = self.latest.load(Ordering::SeqCst),
                "Discarding superseded directory response"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_increase() {
        let seq = SearchSequencer::new();
        let a = seq.issue();
        let b = seq.issue();
        assert!(b > a);
        assert_eq!(a.id(), 1);
    }

    #[test]
    fn test_latest_wins() {
        let seq = SearchSequencer::new();
        let first = seq.issue();
        let second = seq.issue();

        // Second response arrives first and is applied
        assert_eq!(seq.accept(second, "ra"), Some("ra"));
        // The late response to the older query is dropped
        assert_eq!(seq.accept(first, "r"), None);
    }

    #[test]
    fn test_single_request_is_accepted() {
        let seq = SearchSequencer::new();
        let t = seq.issue();
        assert!(seq.is_current(t));
        assert_eq!(seq.accept(t, 5), Some(5));
    }
}
