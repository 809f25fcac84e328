//! Command-driven front end for the ramdisk device
//!
//! Plays the part of the OS integration layer: each input line becomes one
//! call on the device boundary.

pub mod command;
pub mod session;

pub use command::Command;
pub use session::Session;
