//! cellbook-engine - cells, references and formula recalculation.

pub mod builtins;
pub mod engine;
