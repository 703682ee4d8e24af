//! Pictogram-based incident reporting for schools: the report wizard, the
//! report store and the reviewer side (listing, trend analysis, exports).

pub mod analysis;
pub mod body_map;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod mapping;
pub mod models;
pub mod report;
pub mod script;
pub mod selection;
pub mod session;
pub mod store;
pub mod wizard;
