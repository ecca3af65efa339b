//! Database bootstrap and generic store primitives

pub mod init;
pub mod store;
pub mod value;

pub use init::*;
pub use store::*;
pub use value::*;
