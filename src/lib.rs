pub mod aggregate;
pub mod args;
pub mod cli;
pub mod commit;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod pipeline;
pub mod store;
mod terminal;
pub mod validate;
