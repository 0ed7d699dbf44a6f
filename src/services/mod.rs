pub mod fetcher;
pub mod pacing;
pub mod persister;
pub mod pipeline;
pub mod record_store;
pub mod run_control;
pub mod versium_client;

pub use fetcher::*;
pub use pacing::*;
pub use persister::*;
pub use pipeline::*;
pub use record_store::*;
pub use run_control::*;
pub use versium_client::*;
