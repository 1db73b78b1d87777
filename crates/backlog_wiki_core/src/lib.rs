pub mod client;
pub mod config;
pub mod content;
pub mod credentials;
pub mod extract;
pub mod guard;
pub mod runtime;
pub mod wiki;
