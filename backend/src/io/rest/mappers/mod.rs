pub mod balance_mapper;
pub mod migration_mapper;
