//! `q8-core` -- domain logic for the tenant agent.
//!
//! Holds everything that does not need HTTP: tenant types and validation,
//! the on-disk tenant directory manager, the `docker compose` command
//! executor, and the administrative database script builder.

pub mod compose;
pub mod database;
pub mod error;
pub mod tenant;
pub mod tenant_fs;
