pub mod catalog;
pub mod index;
pub mod matcher;
pub mod mime;
pub mod resolver;
pub mod scanner;
pub mod snapshot;
