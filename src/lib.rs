pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod http;
pub mod job;
pub mod registry;
pub mod service;
pub mod supervisor;
pub mod util;
pub mod workdir;
