// src/lib.rs — Library root for deep-research

pub mod agent;
pub mod cli;
pub mod core;
pub mod data;
pub mod infra;
pub mod provider;
pub mod util;
