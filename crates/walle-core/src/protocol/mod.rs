//! Serial line protocol

pub mod codec;

pub use codec::{decode_command, decode_echo, encode, Command};
