mod actor;
mod allocator;
mod counter;
mod error;
mod generator;
mod id;
mod retry;
mod store;
mod time;

pub use crate::actor::*;
pub use crate::allocator::*;
pub use crate::counter::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::retry::*;
pub use crate::store::*;
pub use crate::time::*;
