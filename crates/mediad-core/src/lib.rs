pub mod config;
pub mod logging;

pub mod admission;
pub mod domain;
pub mod extract;
pub mod jobs;
pub mod locate;
