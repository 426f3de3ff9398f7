//! Bounded, append-only store of dispatched responses.

use ahash::AHashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::dispatch::response::Response;
use crate::error::{Result, TiffinError};

#[derive(Debug, Default)]
struct HistoryInner {
    by_id: AHashMap<Uuid, Response>,
    order: Vec<Uuid>,
}

/// Thread-safe response history keyed by response id.
///
/// Entries are never replaced or removed. Once `capacity` responses are
/// stored, further inserts fail with [`TiffinError::ResourceExhausted`].
#[derive(Debug)]
pub struct ResponseHistory {
    capacity: usize,
    inner: RwLock<HistoryInner>,
}

impl ResponseHistory {
    pub fn new(capacity: usize) -> Self {
        ResponseHistory {
            capacity,
            inner: RwLock::new(HistoryInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a response and return its id.
    pub fn insert(&self, response: Response) -> Result<Uuid> {
        let mut inner = self.inner.write();
        if inner.order.len() >= self.capacity {
            return Err(TiffinError::resource_exhausted(format!(
                "response history is full ({} entries)",
                self.capacity
            )));
        }
        let id = response.id;
        if inner.by_id.contains_key(&id) {
            return Err(TiffinError::invalid_argument(format!(
                "response {id} is already recorded"
            )));
        }

        inner.by_id.insert(id, response);
        inner.order.push(id);
        Ok(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<Response> {
        self.inner.read().by_id.get(id).cloned()
    }

    /// The last `n` responses, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Response> {
        let inner = self.inner.read();
        let start = inner.order.len().saturating_sub(n);
        inner.order[start..]
            .iter()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::Utc;

    use super::*;

    fn response(text: &str) -> Response {
        Response {
            id: Uuid::new_v4(),
            parent_id: None,
            question: text.to_string(),
            predicted_label: "Greeting".to_string(),
            text: text.to_string(),
            response_type: "Greeting".to_string(),
            requires_follow_up: false,
            confidence: 0.9,
            entities: Vec::new(),
            tokens: String::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let history = ResponseHistory::new(4);
        let id = history.insert(response("hi")).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history.get(&id).unwrap().text, "hi");
        assert!(history.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_capacity() {
        let history = ResponseHistory::new(2);
        history.insert(response("a")).unwrap();
        history.insert(response("b")).unwrap();

        let err = history.insert(response("c")).unwrap_err();
        assert!(matches!(err, TiffinError::ResourceExhausted(_)));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let history = ResponseHistory::new(4);
        let first = response("a");
        history.insert(first.clone()).unwrap();
        assert!(history.insert(first).is_err());
    }

    #[test]
    fn test_recent_order() {
        let history = ResponseHistory::new(8);
        for text in ["a", "b", "c"] {
            history.insert(response(text)).unwrap();
        }
        let texts: Vec<String> = history.recent(2).into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[test]
    fn test_concurrent_inserts() {
        let history = Arc::new(ResponseHistory::new(100));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    for _ in 0..25 {
                        let id = history.insert(response("x")).unwrap();
                        assert!(history.get(&id).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.len(), 100);
    }
}
