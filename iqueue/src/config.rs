//! Construction options: capacity normalization and path selection.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::BuildError;

/// Smallest capacity handed out. A one-slot ring has `mask == 0` and is
/// rounded up to this instead.
pub const MIN_CAPACITY: usize = 2;

/// Largest capacity accepted, in slots.
pub const MAX_CAPACITY: usize = 1 << 30;

/// Environment variable read by [`QueueConfig::from_env`].
pub const PATH_ENV: &str = "IQUEUE_PATH";

/// Round `requested` up to a power of two of at least [`MIN_CAPACITY`].
pub fn normalize_capacity(requested: usize) -> Result<usize, BuildError> {
    if requested == 0 {
        return Err(BuildError::ZeroCapacity);
    }
    if requested > MAX_CAPACITY {
        return Err(BuildError::CapacityTooLarge {
            requested,
            max: MAX_CAPACITY,
        });
    }
    Ok(requested.next_power_of_two().max(MIN_CAPACITY))
}

/// Which implementation backs a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathSelection {
    /// Specialized adapter when one exists and its layout checks out,
    /// generic otherwise.
    #[default]
    Auto,
    Generic,
    /// Specialized adapter or a construction error.
    Specialized,
}

impl FromStr for PathSelection {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "generic" | "portable" => Ok(Self::Generic),
            "specialized" | "native" => Ok(Self::Specialized),
            _ => Err(BuildError::InvalidPath(s.to_string())),
        }
    }
}

impl fmt::Display for PathSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Generic => "generic",
            Self::Specialized => "specialized",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    pub capacity: usize,
    pub path: PathSelection,
}

impl QueueConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            path: PathSelection::Auto,
        }
    }

    pub fn path(mut self, path: PathSelection) -> Self {
        self.path = path;
        self
    }

    /// Like [`new`](Self::new), with the path taken from `IQUEUE_PATH` if set.
    pub fn from_env(capacity: usize) -> Result<Self, BuildError> {
        match env::var(PATH_ENV) {
            Ok(value) => Self::from_var(capacity, Some(&value)),
            Err(env::VarError::NotPresent) => Self::from_var(capacity, None),
            Err(env::VarError::NotUnicode(value)) => {
                Err(BuildError::InvalidPath(value.to_string_lossy().into_owned()))
            }
        }
    }

    /// Config for an already-read `IQUEUE_PATH` value; `None` means unset.
    pub fn from_var(capacity: usize, value: Option<&str>) -> Result<Self, BuildError> {
        let path = match value {
            Some(value) => value.parse()?,
            None => PathSelection::Auto,
        };
        Ok(Self::new(capacity).path(path))
    }

    pub fn effective_capacity(&self) -> Result<usize, BuildError> {
        normalize_capacity(self.capacity)
    }
}
