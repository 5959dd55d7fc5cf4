//! Profile selection.
//!
//! The device keeps two independently selected profiles: a PID tuning profile
//! and a rate profile. Both are switched with the single-byte
//! [`SELECT_SETTING`](crate::codes::SELECT_SETTING) message. A PID profile is
//! sent as its zero-based index. A rate profile is sent as its zero-based
//! index with [`RATE_PROFILE_MASK`] set.

use core::fmt;
use thiserror::Error;

use crate::field::Record;

/// Number of PID profiles a device holds.
pub const PID_PROFILE_COUNT: u8 = 3;

/// Number of rate profiles a device holds.
pub const RATE_PROFILE_COUNT: u8 = 6;

/// Set on a select-setting byte that refers to a rate profile.
pub const RATE_PROFILE_MASK: u8 = 0x80;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProfileKind {
    Pid,
    Rate,
}

impl ProfileKind {
    /// Number of profiles of this kind.
    pub const fn count(self) -> u8 {
        match self {
            ProfileKind::Pid => PID_PROFILE_COUNT,
            ProfileKind::Rate => RATE_PROFILE_COUNT,
        }
    }

    /// Checks that `index` is a valid one-based profile number.
    pub fn check(self, index: i32) -> Result<u8, ProfileRangeError> {
        match u8::try_from(index) {
            Ok(v) if (1..=self.count()).contains(&v) => Ok(v),
            _ => Err(ProfileRangeError { kind: self, index }),
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProfileKind::Pid => "PID",
            ProfileKind::Rate => "rate",
        })
    }
}

#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
#[error("{kind} profile {index} is out of range (1..={max}).", max = .kind.count())]
pub struct ProfileRangeError {
    pub kind: ProfileKind,
    pub index: i32,
}

/// The active PID and rate profile of a device, both one-based.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Profiles {
    pub pid: u8,
    pub rate: u8,
}

impl Profiles {
    pub fn new(pid: i32, rate: i32) -> Result<Self, ProfileRangeError> {
        Ok(Self {
            pid: ProfileKind::Pid.check(pid)?,
            rate: ProfileKind::Rate.check(rate)?,
        })
    }
}

impl fmt::Display for Profiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} / rate {}", self.pid, self.rate)
    }
}

/// A single profile switch, as carried by a select-setting message.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ProfileSelection {
    Pid(u8),
    Rate(u8),
}

impl ProfileSelection {
    pub fn pid(index: i32) -> Result<Self, ProfileRangeError> {
        ProfileKind::Pid.check(index).map(Self::Pid)
    }

    pub fn rate(index: i32) -> Result<Self, ProfileRangeError> {
        ProfileKind::Rate.check(index).map(Self::Rate)
    }

    pub const fn kind(&self) -> ProfileKind {
        match self {
            Self::Pid(_) => ProfileKind::Pid,
            Self::Rate(_) => ProfileKind::Rate,
        }
    }

    pub const fn index(&self) -> u8 {
        match self {
            Self::Pid(index) | Self::Rate(index) => *index,
        }
    }

    /// The select-setting payload byte.
    ///
    /// Fails if the index is out of range for its kind.
    pub fn to_byte(&self) -> Result<u8, ProfileRangeError> {
        let kind = self.kind();
        let index = kind.check(self.index().into())?;
        Ok(match kind {
            ProfileKind::Pid => index - 1,
            ProfileKind::Rate => (index - 1) ^ RATE_PROFILE_MASK,
        })
    }

    /// Parses a select-setting payload byte.
    pub fn from_byte(byte: u8) -> Result<Self, ProfileRangeError> {
        let index = (byte & !RATE_PROFILE_MASK) as i32 + 1;
        if byte & RATE_PROFILE_MASK != 0 {
            Self::rate(index)
        } else {
            Self::pid(index)
        }
    }

    /// The select-setting message body.
    pub fn to_record(&self) -> Result<Record, ProfileRangeError> {
        Ok(Record::new().with("selection", self.to_byte()?))
    }
}
