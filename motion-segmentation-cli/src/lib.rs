// Library exports for the motion-seg CLI
// This allows testing of internal modules

pub mod commands;
pub mod config;
pub mod output;
