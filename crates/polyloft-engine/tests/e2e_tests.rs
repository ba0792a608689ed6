//! End-to-end evaluation tests
//!
//! # Running Tests
//! ```bash
//! cargo test --test e2e_tests
//! ```

mod e2e;
