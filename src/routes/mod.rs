pub mod config_route;
pub mod default_route;
pub mod enrichment_route;
