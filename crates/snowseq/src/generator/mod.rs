mod snowflake;
mod status;
#[cfg(test)]
mod tests;

pub use snowflake::*;
pub use status::*;
