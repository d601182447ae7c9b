#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates can reach the core library as
// `snowseq_tonic_core::snowseq`.
pub use snowseq;
