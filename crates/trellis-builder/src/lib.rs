mod builder;
mod error;

pub use builder::{GraphBuilder, StandardBuilder};
pub use error::BuildError;
