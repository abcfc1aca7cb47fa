//! FIFO queue of proposed payloads awaiting block inclusion.

use crate::core::block::DATA_LEN;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Ordered pool of pending 32-byte payloads.
///
/// The mempool is the only state shared between the RPC side (proposing) and
/// the engine side (building); all access goes through the internal mutex.
/// Payloads leave the pool only when consumed by a successful block build.
/// Bounded only by host memory.
#[derive(Debug, Default)]
pub struct Mempool {
    queue: Mutex<VecDeque<[u8; DATA_LEN]>>,
}

impl Mempool {
    /// Creates an empty mempool.
    pub fn new() -> Mempool {
        Mempool {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends a payload to the back of the queue.
    pub fn push(&self, data: [u8; DATA_LEN]) {
        self.queue.lock().unwrap().push_back(data);
    }

    /// Removes and returns the payload at the front of the queue.
    pub fn pop(&self) -> Option<[u8; DATA_LEN]> {
        self.queue.lock().unwrap().pop_front()
    }

    /// Returns the number of pending payloads.
    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Returns `true` if no payloads are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn pop_returns_payloads_in_fifo_order() {
        let pool = Mempool::new();
        pool.push([1u8; DATA_LEN]);
        pool.push([2u8; DATA_LEN]);
        pool.push([3u8; DATA_LEN]);

        assert_eq!(pool.pop(), Some([1u8; DATA_LEN]));
        assert_eq!(pool.pop(), Some([2u8; DATA_LEN]));
        assert_eq!(pool.pop(), Some([3u8; DATA_LEN]));
        assert_eq!(pool.pop(), None);
    }

    #[test]
    fn len_tracks_pushes_and_pops() {
        let pool = Mempool::new();
        assert!(pool.is_empty());

        pool.push([0u8; DATA_LEN]);
        pool.push([0u8; DATA_LEN]);
        assert_eq!(pool.len(), 2);

        pool.pop();
        assert_eq!(pool.len(), 1);
        assert!(!pool.is_empty());
    }

    #[test]
    fn concurrent_pushes_are_all_retained() {
        let pool = Arc::new(Mempool::new());
        let mut handles = Vec::new();
        for i in 0..8u8 {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    pool.push([i; DATA_LEN]);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.len(), 800);
    }
}
