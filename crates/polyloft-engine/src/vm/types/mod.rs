//! Runtime type machinery
//!
//! - [`registry`]: per-runtime table of declared classes and interfaces
//! - [`generics`]: type-name rendering, subtyping, `instanceof`, bounds
//!   and variance checks

pub mod generics;
pub mod registry;

pub use generics::TypeBindings;
pub use registry::TypeRegistry;
