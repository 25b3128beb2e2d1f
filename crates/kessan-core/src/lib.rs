pub mod error;
pub mod mapper;
pub mod types;

pub use error::*;
pub use mapper::*;
pub use types::*;
