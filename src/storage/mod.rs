pub mod csv_export;
pub mod profile_store;
