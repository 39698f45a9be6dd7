//! Connected playback clients and fan-out of playback directives to them.

pub mod broadcast;
pub mod message;
pub mod registry;
