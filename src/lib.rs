#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod cli;
pub mod driver;
pub mod enumerate;
pub mod error;
pub mod host;
pub mod job;
pub mod processor;
pub mod progress;
pub mod queue;
pub mod run_state;
pub mod service;
pub mod stats;
pub mod storage;

mod format;
mod keys;
mod logger;
mod serde;
mod task;

#[cfg(test)]
mod testing;
