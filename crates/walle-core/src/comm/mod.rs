//! Request channels
//!
//! Producers (keyboard reader, velocity stream, anything else) never touch
//! the link. They send requests over a bounded channel to the single
//! dispatch thread.

pub mod channel;

pub use channel::{bounded_channel, Receiver, Sender};
