//! Customer standing and feedback resolution engine for the bistro ordering platform.

pub mod config;
pub mod error;
pub mod reputation;
pub mod telemetry;
