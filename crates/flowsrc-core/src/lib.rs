pub mod assemble;
pub mod context;
pub mod error;
pub mod expand;
pub mod ids;
pub mod pathsafe;

pub use assemble::*;
pub use context::*;
pub use error::*;
pub use expand::*;
pub use ids::*;
pub use pathsafe::*;
