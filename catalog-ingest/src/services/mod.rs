//! Ingestion services

pub mod awesome_flag;
pub mod classifier;
pub mod reconciler;
pub mod source_client;

pub use awesome_flag::{AwesomeFlag, FixedAwesome, RandomAwesome};
pub use classifier::{classify, normalize_title};
pub use reconciler::{compute_delta, new_links};
pub use source_client::SourceClient;
