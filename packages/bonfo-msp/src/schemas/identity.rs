//! Identity queries answered once per connection.

use alloc::string::String;
use core::fmt;

use crate::{
    codes,
    field::{Field, Record, Scalar, WireType},
    registry::{RegistryError, Schema},
    version::ProtocolVersion,
};

/// Length of the build date and time string, e.g. `Nov 29 202216:09:21`.
pub const BUILD_DATE_TIME_LENGTH: usize = 11 + 8;

/// Length of the abbreviated git hash in a build info reply.
pub const GIT_HASH_LENGTH: usize = 7;

pub static API_VERSION: Schema = Schema::read_only(
    "api_version",
    codes::API_VERSION,
    &[
        Field::new("protocol", WireType::U8),
        Field::new("api_major", WireType::U8),
        Field::new("api_minor", WireType::U8),
    ],
);

pub static FC_VARIANT: Schema = Schema::read_only(
    "fc_variant",
    codes::FC_VARIANT,
    &[Field::new("variant", WireType::Str(4))],
);

pub static FC_VERSION: Schema = Schema::read_only(
    "fc_version",
    codes::FC_VERSION,
    &[
        Field::new("major", WireType::U8),
        Field::new("minor", WireType::U8),
        Field::new("patch", WireType::U8),
    ],
);

pub static BOARD_INFO: Schema = Schema::read_only(
    "board_info",
    codes::BOARD_INFO,
    &[
        Field::new("board_identifier", WireType::Str(4)),
        Field::new("hardware_revision", WireType::U16),
        Field::new("board_type", WireType::U8),
        Field::new("target_capabilities", WireType::U8),
        Field::new("target_name", WireType::PrefixedStr),
        Field::new("board_name", WireType::PrefixedStr),
        Field::new("manufacturer_id", WireType::PrefixedStr),
        Field::new("signature", WireType::Bytes(32)),
        Field::new("mcu_type", WireType::U8)
            .since(ProtocolVersion::V1_42)
            .with_default(0xFF),
        Field::new("configuration_state", WireType::U8).since(ProtocolVersion::V1_42),
        Field::new("gyro_sample_rate", WireType::U16).since(ProtocolVersion::V1_43),
        Field::new("configuration_problems", WireType::U32).since(ProtocolVersion::V1_43),
    ],
);

pub static BUILD_INFO: Schema = Schema::read_only(
    "build_info",
    codes::BUILD_INFO,
    &[
        Field::new("date_time", WireType::Str(BUILD_DATE_TIME_LENGTH)),
        Field::new("git_hash", WireType::Str(GIT_HASH_LENGTH)),
    ],
);

pub static UID: Schema = Schema::read_only(
    "uid",
    codes::UID,
    &[Field::new("uid", WireType::Array(3, Scalar::U32))],
);

pub static NAME: Schema = Schema::read_write(
    "name",
    codes::NAME,
    codes::SET_NAME,
    &[Field::new("name", WireType::RestStr)],
);

/// Reply to [`API_VERSION`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ApiVersion(pub ProtocolVersion);

impl TryFrom<&Record> for ApiVersion {
    type Error = RegistryError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self(ProtocolVersion::new(
            record.require("protocol")?,
            record.require("api_major")?,
            record.require("api_minor")?,
        )))
    }
}

impl From<ApiVersion> for ProtocolVersion {
    fn from(value: ApiVersion) -> Self {
        value.0
    }
}

/// Reply to [`FC_VARIANT`], e.g. `BTFL` for Betaflight.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FcVariant(pub String);

impl TryFrom<&Record> for FcVariant {
    type Error = RegistryError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        record.require("variant").map(Self)
    }
}

impl fmt::Display for FcVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reply to [`FC_VERSION`]: the firmware release.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct FcVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl TryFrom<&Record> for FcVersion {
    type Error = RegistryError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            major: record.require("major")?,
            minor: record.require("minor")?,
            patch: record.require("patch")?,
        })
    }
}

impl fmt::Display for FcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BoardInfo {
    /// Four letter board identifier, e.g. `S405`.
    pub identifier: String,
    pub hardware_revision: u16,
    pub target_name: String,
    pub board_name: String,
    pub manufacturer_id: String,
}

impl TryFrom<&Record> for BoardInfo {
    type Error = RegistryError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            identifier: record.require("board_identifier")?,
            hardware_revision: record.require("hardware_revision")?,
            target_name: record.require("target_name")?,
            board_name: record.require("board_name")?,
            manufacturer_id: record.require("manufacturer_id")?,
        })
    }
}

/// Reply to [`BUILD_INFO`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BuildInfo {
    /// Build date and time as reported by the firmware, e.g. `Nov 29 202216:09:21`.
    pub date_time: String,
    pub git_hash: String,
}

impl TryFrom<&Record> for BuildInfo {
    type Error = RegistryError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            date_time: record.require("date_time")?,
            git_hash: record.require("git_hash")?,
        })
    }
}

/// The MCU's unique ID.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Uid(pub [u32; 3]);

impl TryFrom<&Record> for Uid {
    type Error = RegistryError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        record.require("uid").map(Self)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a:08x}{b:08x}{c:08x}")
    }
}
