// Library surface for headless/integration tests and reuse.
// The binary in main.rs only wires these together.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod desktop;
pub mod engine;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod typing_policy;
pub mod ui;
