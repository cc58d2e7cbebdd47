//! Data model for the keyboard input core: editing actions, key capability
//! models, flick geometry, shared keyboard state and virtual-time timers.

pub mod action;
pub mod flick;
pub mod key_model;
pub mod settings;
pub mod state;
pub mod text;
pub mod timer;
