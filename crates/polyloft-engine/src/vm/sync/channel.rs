//! Channel - typed queue for thread coordination
//!
//! A channel is buffered with an optional capacity bound:
//! - `send` blocks while a bounded queue is full and fails once closed
//! - `recv` blocks until a value arrives, drains the queue after close,
//!   then reports closed with `None`
//! - closing wakes every blocked sender, receiver and `select`

use crate::parser::ast::TypeExpr;
use crate::vm::sync::select::SelectWaker;
use crate::vm::value::Value;
use crate::vm::{VmError, VmResult};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// What a receiver would observe right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// At least one buffered value
    Value,
    /// Closed and drained
    Closed,
    /// Open and empty
    Pending,
}

struct ChannelInner {
    /// `None` means unbounded
    capacity: Option<usize>,
    queue: VecDeque<Value>,
    closed: bool,
    /// Wakers of `select` statements currently waiting on this channel
    watchers: Vec<Arc<SelectWaker>>,
}

impl ChannelInner {
    fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.queue.len() >= cap)
    }

    fn wake_watchers(&self) {
        for waker in &self.watchers {
            waker.wake();
        }
    }
}

/// A Polyloft channel.
pub struct Channel {
    id: u64,
    /// Declared element type: `channel[Int]()`, `Channel<Int>(4)`
    pub element_type: Option<TypeExpr>,
    inner: Mutex<ChannelInner>,
    /// Senders waiting on a full queue
    not_full: Condvar,
    /// Receivers waiting on an empty queue
    not_empty: Condvar,
}

impl Channel {
    /// Create a channel; a capacity of `None` or `0` is unbounded.
    pub fn new(element_type: Option<TypeExpr>, capacity: Option<usize>) -> Self {
        Self {
            id: NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed),
            element_type,
            inner: Mutex::new(ChannelInner {
                capacity: capacity.filter(|&cap| cap > 0),
                queue: VecDeque::new(),
                closed: false,
                watchers: Vec::new(),
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.lock().capacity
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Send a value, blocking while the buffer is full.
    pub fn send(&self, value: Value) -> VmResult<()> {
        let mut inner = self.inner.lock();
        loop {
            if inner.closed {
                return Err(VmError::ClosedChannel);
            }
            if !inner.is_full() {
                inner.queue.push_back(value);
                self.not_empty.notify_one();
                inner.wake_watchers();
                return Ok(());
            }
            self.not_full.wait(&mut inner);
        }
    }

    /// Receive a value, blocking until one arrives.
    ///
    /// Returns `None` once the channel is closed and drained.
    pub fn recv(&self) -> Option<Value> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(value) = inner.queue.pop_front() {
                self.not_full.notify_one();
                return Some(value);
            }
            if inner.closed {
                return None;
            }
            self.not_empty.wait(&mut inner);
        }
    }

    /// Receive without blocking.
    pub fn try_recv(&self) -> Option<Value> {
        let mut inner = self.inner.lock();
        let value = inner.queue.pop_front();
        if value.is_some() {
            self.not_full.notify_one();
        }
        value
    }

    /// Close the channel. Closing twice is a no-op.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
        inner.wake_watchers();
        tracing::debug!(channel = self.id, buffered = inner.queue.len(), "channel closed");
    }

    pub fn readiness(&self) -> Readiness {
        let inner = self.inner.lock();
        if !inner.queue.is_empty() {
            Readiness::Value
        } else if inner.closed {
            Readiness::Closed
        } else {
            Readiness::Pending
        }
    }

    /// Register a select waker; it is woken on every send and on close.
    pub fn watch(&self, waker: &Arc<SelectWaker>) {
        self.inner.lock().watchers.push(Arc::clone(waker));
    }

    pub fn unwatch(&self, waker: &Arc<SelectWaker>) {
        self.inner
            .lock()
            .watchers
            .retain(|w| !Arc::ptr_eq(w, waker));
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("capacity", &inner.capacity)
            .field("length", &inner.queue.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_close_drains_then_reports_closed() {
        let ch = Channel::new(None, None);
        for i in 1..=3 {
            ch.send(Value::Int(i)).unwrap();
        }
        ch.close();
        assert!(matches!(ch.send(Value::Int(4)), Err(VmError::ClosedChannel)));
        assert_eq!(ch.recv().and_then(|v| v.as_int()), Some(1));
        assert_eq!(ch.recv().and_then(|v| v.as_int()), Some(2));
        assert_eq!(ch.recv().and_then(|v| v.as_int()), Some(3));
        assert!(ch.recv().is_none());
        assert_eq!(ch.readiness(), Readiness::Closed);
    }

    #[test]
    fn test_bounded_send_blocks_until_received() {
        let ch = Arc::new(Channel::new(None, Some(1)));
        ch.send(Value::Int(1)).unwrap();

        let producer = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || ch.send(Value::Int(2)))
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(ch.len(), 1);

        assert_eq!(ch.recv().and_then(|v| v.as_int()), Some(1));
        producer.join().unwrap().unwrap();
        assert_eq!(ch.recv().and_then(|v| v.as_int()), Some(2));
    }

    #[test]
    fn test_close_wakes_blocked_receiver() {
        let ch = Arc::new(Channel::new(None, None));
        let receiver = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || ch.recv())
        };
        thread::sleep(Duration::from_millis(20));
        ch.close();
        assert!(receiver.join().unwrap().is_none());
    }

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let ch = Channel::new(None, Some(0));
        for i in 0..100 {
            ch.send(Value::Int(i)).unwrap();
        }
        assert_eq!(ch.len(), 100);
        assert_eq!(ch.capacity(), None);
    }
}
