pub mod db;
pub mod models;
pub mod profile;

pub use rusqlite;
