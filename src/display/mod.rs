//! Display formatting for terminal output
//!
//! Provides utilities for formatting backup slots for terminal display.

pub mod slot;

pub use slot::{format_duration, format_slot_list};
