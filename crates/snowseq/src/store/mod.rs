//! Access to the strongly consistent key-value store that coordinates node
//! IDs and counters across processes.
//!
//! Everything that is shared between processes lives in the store and is
//! only ever changed through [`CoordinationStore::cas`].

#[cfg(feature = "consul")]
mod consul;
mod interface;
mod memory;

#[cfg(feature = "consul")]
pub use consul::*;
pub use interface::*;
pub use memory::*;
