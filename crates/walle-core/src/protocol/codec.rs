//! Line protocol codec
//!
//! Every command is one ASCII line: `<symbol><integer>\n`, e.g. `G50\n`
//! or `Y-25\n`. The device may answer with a line of its own; that echo
//! is opaque diagnostic text.
//!
//! Pure functions only: no I/O, no state.

use std::fmt;

use crate::actuator::ActuatorId;
use crate::{Error, Result};

/// Line terminator
pub const NEWLINE: u8 = b'\n';

/// One protocol command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    symbol: char,
    value: i32,
}

impl Command {
    /// Command addressing an actuator
    ///
    /// `value` must already be clamped by the registry.
    pub fn for_actuator(id: ActuatorId, value: i32) -> Self {
        Self {
            symbol: id.symbol(),
            value,
        }
    }

    #[inline]
    pub fn symbol(&self) -> char {
        self.symbol
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Actuator addressed by this command
    pub fn actuator(&self) -> Option<ActuatorId> {
        ActuatorId::from_symbol(self.symbol)
    }

    /// Wire form, including the trailing newline
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(6);
        line.push(self.symbol as u8);
        line.extend_from_slice(self.value.to_string().as_bytes());
        line.push(NEWLINE);
        line
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.symbol, self.value)
    }
}

/// Encode a symbol/value pair into its wire form
///
/// Fails with [`Error::InvalidSymbol`] for a symbol outside the actuator
/// table.
pub fn encode(symbol: char, value: i32) -> Result<Vec<u8>> {
    let id = ActuatorId::from_symbol(symbol).ok_or(Error::InvalidSymbol(symbol))?;
    Ok(Command::for_actuator(id, value).to_bytes())
}

/// Decode a device echo line
///
/// Strips trailing whitespace and returns the rest verbatim. Empty or
/// non-UTF-8 lines fail with [`Error::Parse`].
pub fn decode_echo(line: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(line)
        .map_err(|e| Error::Parse(format!("echo is not valid UTF-8: {}", e)))?;
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return Err(Error::Parse("empty echo line".into()));
    }
    Ok(trimmed.to_string())
}

/// Decode a command line in wire form
///
/// Accepts an optional trailing `\n` or `\r\n`. The value must lie in the
/// addressed actuator's range.
pub fn decode_command(line: &[u8]) -> Result<Command> {
    let text = std::str::from_utf8(line)
        .map_err(|e| Error::Parse(format!("command is not valid UTF-8: {}", e)))?;
    let text = text.strip_suffix('\n').unwrap_or(text);
    let text = text.strip_suffix('\r').unwrap_or(text);

    let mut chars = text.chars();
    let symbol = chars
        .next()
        .ok_or_else(|| Error::Parse("empty command line".into()))?;
    let id = ActuatorId::from_symbol(symbol).ok_or(Error::InvalidSymbol(symbol))?;

    let digits = chars.as_str();
    let value: i32 = digits
        .parse()
        .map_err(|_| Error::Parse(format!("bad value {:?} for {}", digits, symbol)))?;
    if !id.range().contains(&value) {
        return Err(Error::Parse(format!(
            "value {} out of range {:?} for {}",
            value,
            id.range(),
            id
        )));
    }

    Ok(Command::for_actuator(id, value))
}
