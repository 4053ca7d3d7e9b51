mod client;
pub mod types;
mod worker;

pub use client::{AppmClient, AppmError};
pub use worker::{MappingProgress, StatusWorker};
