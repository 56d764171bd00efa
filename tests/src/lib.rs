//! # Settle Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs     # Sample provider service, server spawning
//! │   └── integration/    # Real server on an ephemeral port, signing client
//! └── benches/            # Digest, sign, verify and middleware throughput
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p settle-tests
//! cargo bench -p settle-tests
//! ```

pub mod fixtures;
pub mod integration;
