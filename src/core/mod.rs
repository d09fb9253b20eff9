// src/core/mod.rs — Core refinement loop

pub mod capabilities;
pub mod controller;
pub mod types;
