pub mod config_db;
pub mod record_db;
