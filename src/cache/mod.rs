pub mod config_cache;
pub mod namespace_record;
