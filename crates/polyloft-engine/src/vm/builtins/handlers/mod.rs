//! Builtin method handlers
//!
//! One module per builtin value kind. Each exposes the method names it
//! answers to (used when a method is read without being called) and a
//! `call` entry point.

pub mod array;
pub mod channel;
pub mod collection;
pub mod future;
pub mod map;
pub mod number;
pub mod object;
pub mod string;
