//! Shared vocabulary for emulated components.
//!
//! A component counts the clocks it has executed in [`Ticks`] and exposes
//! its internal state through [`Observable`] so debuggers, test harnesses
//! and front ends can inspect it without reaching into its fields.

mod observable;
mod ticks;

pub use observable::{Observable, Value};
pub use ticks::Ticks;
