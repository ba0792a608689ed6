//! Concurrency primitives
//!
//! One native OS thread per `thread spawn`; channels are a locked queue
//! with a close flag and condition-variable wakeups; `select` waits on a
//! single waker registered with every channel involved.

pub mod channel;
pub mod select;
pub mod thread;

pub use channel::{Channel, Readiness};
pub use select::{select, SelectArm, SelectWaker, Selected};
pub use thread::{spawn_detached, ThreadHandle, ThreadOutcome};
