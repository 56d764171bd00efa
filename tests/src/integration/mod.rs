//! # Integration Tests
//!
//! Signed calls over real sockets: client signing layer, reqwest, axum,
//! verification layer, interceptor chain and a typed handler.

pub mod round_trip;
pub mod rejections;
