// Application layer: wiring CLI commands to the engine.

pub mod commands;
