mod client;
pub mod commands;

pub use client::{ApccClient, ApccError, ResponseStatus, SendCommandResponse};
