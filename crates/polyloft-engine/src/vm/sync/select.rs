//! `select` over several channels
//!
//! The waiting thread owns one [`SelectWaker`] and registers it with every
//! channel in the statement. Each round it re-checks readiness after
//! registering, so a send or close that lands between the check and the
//! wait is never lost.

use crate::vm::context::SelectPolicy;
use crate::vm::sync::channel::{Channel, Readiness};
use crate::vm::value::Value;
use parking_lot::{Condvar, Mutex};
use rand::Rng;
use std::sync::Arc;

/// Wakeup flag shared between one `select` and its channels.
#[derive(Default)]
pub struct SelectWaker {
    signalled: Mutex<bool>,
    cond: Condvar,
}

impl SelectWaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn wake(&self) {
        *self.signalled.lock() = true;
        self.cond.notify_all();
    }

    /// Block until woken, then clear the flag.
    fn wait(&self) {
        let mut signalled = self.signalled.lock();
        while !*signalled {
            self.cond.wait(&mut signalled);
        }
        *signalled = false;
    }
}

/// One case of a `select`, already resolved to its channel.
#[derive(Clone)]
pub enum SelectArm {
    /// `case let x = ch.recv()`
    Recv(Arc<Channel>),
    /// `case closed ch`
    Closed(Arc<Channel>),
}

impl SelectArm {
    pub fn channel(&self) -> &Arc<Channel> {
        match self {
            SelectArm::Recv(ch) | SelectArm::Closed(ch) => ch,
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            SelectArm::Recv(ch) => ch.readiness() == Readiness::Value,
            SelectArm::Closed(ch) => ch.readiness() == Readiness::Closed,
        }
    }

    /// Whether the arm can never become ready again.
    fn is_dead(&self) -> bool {
        match self {
            SelectArm::Recv(ch) => ch.readiness() == Readiness::Closed,
            SelectArm::Closed(_) => false,
        }
    }
}

/// Outcome of a `select`.
#[derive(Debug)]
pub enum Selected {
    /// A receive arm fired with this value
    Received { arm: usize, value: Value },
    /// A closed arm fired
    Closed { arm: usize },
    /// Every receive arm is closed and drained and there is no closed arm
    Exhausted,
}

/// Block until one arm is ready and fire it.
pub fn select(arms: &[SelectArm], policy: SelectPolicy) -> Selected {
    if arms.is_empty() {
        return Selected::Exhausted;
    }
    let waker = SelectWaker::new();
    for arm in arms {
        arm.channel().watch(&waker);
    }

    let selected = loop {
        if let Some(fired) = try_fire(arms, policy) {
            break fired;
        }
        if arms.iter().all(SelectArm::is_dead) {
            break Selected::Exhausted;
        }
        waker.wait();
        tracing::trace!(arms = arms.len(), "select woken");
    };

    for arm in arms {
        arm.channel().unwatch(&waker);
    }
    selected
}

fn try_fire(arms: &[SelectArm], policy: SelectPolicy) -> Option<Selected> {
    loop {
        let ready: Vec<usize> = (0..arms.len()).filter(|&i| arms[i].is_ready()).collect();
        if ready.is_empty() {
            return None;
        }
        let arm = match policy {
            SelectPolicy::FirstReady => ready[0],
            SelectPolicy::Random => ready[rand::thread_rng().gen_range(0..ready.len())],
        };
        match &arms[arm] {
            SelectArm::Recv(ch) => {
                // Another receiver may have taken the value since the check
                if let Some(value) = ch.try_recv() {
                    return Some(Selected::Received { arm, value });
                }
            }
            SelectArm::Closed(_) => return Some(Selected::Closed { arm }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn channel() -> Arc<Channel> {
        Arc::new(Channel::new(None, None))
    }

    #[test]
    fn test_first_ready_prefers_declaration_order() {
        let (a, b) = (channel(), channel());
        a.send(Value::Int(1)).unwrap();
        b.send(Value::Int(2)).unwrap();
        let arms = [SelectArm::Recv(a), SelectArm::Recv(b)];
        match select(&arms, SelectPolicy::FirstReady) {
            Selected::Received { arm, value } => {
                assert_eq!(arm, 0);
                assert_eq!(value.as_int(), Some(1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_closed_arm_fires_after_drain() {
        let ch = channel();
        ch.send(Value::Int(7)).unwrap();
        ch.close();
        let arms = [SelectArm::Recv(ch.clone()), SelectArm::Closed(ch)];
        assert!(matches!(
            select(&arms, SelectPolicy::FirstReady),
            Selected::Received { arm: 0, .. }
        ));
        assert!(matches!(
            select(&arms, SelectPolicy::FirstReady),
            Selected::Closed { arm: 1 }
        ));
    }

    #[test]
    fn test_exhausted_without_closed_arm() {
        let ch = channel();
        ch.close();
        let arms = [SelectArm::Recv(ch)];
        assert!(matches!(
            select(&arms, SelectPolicy::Random),
            Selected::Exhausted
        ));
    }

    #[test]
    fn test_wakes_on_send_from_other_thread() {
        let ch = channel();
        let sender = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                ch.send(Value::str("hi")).unwrap();
            })
        };
        let arms = [SelectArm::Recv(ch)];
        match select(&arms, SelectPolicy::FirstReady) {
            Selected::Received { value, .. } => assert_eq!(value.as_str(), Some("hi")),
            other => panic!("unexpected {:?}", other),
        }
        sender.join().unwrap();
    }
}
