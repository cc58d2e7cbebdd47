pub mod commands;
pub mod script;
pub mod trace_init;
