//! Identifier pools for files and objects.
//!
//! Ids are small integers handed out from a bounded range. A released id
//! goes back into the pool and may be reused, but never while the holder is
//! still alive. The pool is shared between concurrent loads, so all state
//! sits behind a mutex.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug)]
struct PoolState {
    next: u32,
    last: u32,
    freed: VecDeque<u32>,
    in_use: usize,
}

/// A bounded, thread-safe pool of numeric identifiers.
#[derive(Debug)]
pub struct IdPool {
    start: u32,
    state: Mutex<PoolState>,
}

impl IdPool {
    /// Create a pool handing out ids in `start..=last`.
    pub fn new(start: u32, last: u32) -> Self {
        Self {
            start,
            state: Mutex::new(PoolState {
                next: start,
                last,
                freed: VecDeque::new(),
                in_use: 0,
            }),
        }
    }

    /// Take an id, or `None` when the pool is exhausted.
    pub fn grab(&self) -> Option<u32> {
        let mut st = self.state.lock();
        let id = if let Some(id) = st.freed.pop_front() {
            id
        } else if st.next <= st.last && st.next != u32::MAX {
            let id = st.next;
            st.next += 1;
            id
        } else {
            return None;
        };
        st.in_use += 1;
        Some(id)
    }

    /// Give an id back. Returns `false` for ids this pool never handed out
    /// or that are already free.
    pub fn release(&self, id: u32) -> bool {
        let mut st = self.state.lock();
        if id < self.start || id >= st.next || st.freed.contains(&id) {
            return false;
        }
        st.freed.push_back(id);
        st.in_use -= 1;
        true
    }

    /// Number of ids currently held.
    pub fn in_use(&self) -> usize {
        self.state.lock().in_use
    }
}

impl Default for IdPool {
    fn default() -> Self {
        IdPool::new(0, u32::MAX - 1)
    }
}

impl fmt::Display for IdPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.lock();
        write!(f, "IdPool({}..={}, {} in use)", self.start, st.last, st.in_use)
    }
}
