//! Velocity vectors from a line-fed producer

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Normalized drive request, both components nominally in [-1.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityCommand {
    /// Forward positive
    pub linear: f64,
    /// Turn rate
    pub angular: f64,
}

impl VelocityCommand {
    /// Zero on both channels
    pub const STOP: Self = Self {
        linear: 0.0,
        angular: 0.0,
    };

    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }
}

impl FromStr for VelocityCommand {
    type Err = Error;

    /// Parse `"<linear> <angular>"`, separated by whitespace or a comma,
    /// or the word `stop`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("stop") {
            return Ok(Self::STOP);
        }
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        let [linear, angular] = parts.as_slice() else {
            return Err(Error::Parse(format!(
                "expected '<linear> <angular>', got {:?}",
                s.trim()
            )));
        };
        Ok(Self {
            linear: parse_component(linear)?,
            angular: parse_component(angular)?,
        })
    }
}

fn parse_component(text: &str) -> Result<f64, Error> {
    let value: f64 = text
        .parse()
        .map_err(|_| Error::Parse(format!("invalid velocity component {:?}", text)))?;
    if !value.is_finite() {
        return Err(Error::Parse(format!("velocity component {:?} is not finite", text)));
    }
    Ok(value)
}

impl fmt::Display for VelocityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "linear={:.2} angular={:.2}", self.linear, self.angular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whitespace_and_comma() {
        let cmd: VelocityCommand = "0.5 -0.25".parse().unwrap();
        assert_eq!(cmd, VelocityCommand::new(0.5, -0.25));
        let cmd: VelocityCommand = " 1, 0 ".parse().unwrap();
        assert_eq!(cmd, VelocityCommand::new(1.0, 0.0));
        let cmd: VelocityCommand = "-1.0,\t0.3".parse().unwrap();
        assert_eq!(cmd, VelocityCommand::new(-1.0, 0.3));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in ["", "0.5", "0.5 0.5 0.5", "fast left", "NaN 0", "inf 0"] {
            assert!(
                matches!(bad.parse::<VelocityCommand>(), Err(Error::Parse(_))),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_parse_stop_word() {
        assert_eq!("stop".parse::<VelocityCommand>().unwrap(), VelocityCommand::STOP);
        assert_eq!(" STOP ".parse::<VelocityCommand>().unwrap(), VelocityCommand::default());
    }
}
