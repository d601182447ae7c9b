mod interface;
mod system;

pub use interface::*;
pub use system::*;
