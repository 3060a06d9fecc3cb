// lib.rs
// Library modules for the reaction game client

pub mod defs;
pub mod logging;
pub mod config;
pub mod api_client;
pub mod view;
pub mod terminal;
pub mod session;
