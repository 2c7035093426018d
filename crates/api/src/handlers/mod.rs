pub mod databases;
pub mod tenants;
