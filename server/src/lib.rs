// server/src/lib.rs

//! Startup wiring for the vital-sign simulator: command line, configuration,
//! census, simulator and gateway.

pub mod cli;
