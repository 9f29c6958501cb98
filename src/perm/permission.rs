//! Permission strings
//!
//! A permission is a three character string over `{r, w, x, -}` such as
//! `rwx` or `r--`. Capabilities are granted by the presence of the letter
//! anywhere in the string, so `wr-` grants read and write.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single capability checked by the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Read,
    Write,
    Execute,
}

impl Capability {
    /// The permission letter that grants this capability.
    pub fn letter(self) -> char {
        match self {
            Capability::Read => 'r',
            Capability::Write => 'w',
            Capability::Execute => 'x',
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Execute => "execute",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid permission '{input}': expected three characters from [rwx-]")]
pub struct PermissionParseError {
    pub input: String,
}

/// Parsed permission string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permission {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Permission {
    /// `---`
    pub const NONE: Permission = Permission { read: false, write: false, execute: false };
    /// `rwx`
    pub const ALL: Permission = Permission { read: true, write: true, execute: true };

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.read,
            Capability::Write => self.write,
            Capability::Execute => self.execute,
        }
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.chars().count() == 3 && s.chars().all(|c| matches!(c, 'r' | 'w' | 'x' | '-'));
        if !valid {
            return Err(PermissionParseError { input: s.to_string() });
        }
        Ok(Permission {
            read: s.contains(Capability::Read.letter()),
            write: s.contains(Capability::Write.letter()),
            execute: s.contains(Capability::Execute.letter()),
        })
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read, 'r'),
            flag(self.write, 'w'),
            flag(self.execute, 'x')
        )
    }
}
