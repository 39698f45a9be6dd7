//! Fuzzy-search media dispatcher: resolve short queries against a local
//! media catalog and push playback directives to connected clients.

pub mod cli;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod media;
pub mod session;
