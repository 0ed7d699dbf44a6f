pub mod enrichment_config;
pub mod error;
pub mod field_mapping;
pub mod record;

pub use enrichment_config::*;
pub use error::*;
pub use field_mapping::*;
pub use record::*;
