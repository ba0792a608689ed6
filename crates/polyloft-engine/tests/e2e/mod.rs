//! End-to-end tests for the Polyloft engine
//!
//! These tests parse and evaluate Polyloft source in a fresh runtime,
//! verifying results, printed output and error messages.

mod harness;
mod basics;
mod classes;
mod generics;
mod exceptions;
mod collections;
mod concurrency;
mod futures;
