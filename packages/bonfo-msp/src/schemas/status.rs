//! Status and telemetry queries.

use alloc::vec::Vec;
use bitflags::bitflags;

use crate::{
    codes,
    field::{Field, Record, Scalar, WireType},
    registry::{RegistryError, Schema},
    select::Profiles,
};

pub static STATUS: Schema = Schema::read_only(
    "status",
    codes::STATUS,
    &[
        Field::new("cycle_time", WireType::U16),
        Field::new("i2c_errors", WireType::U16),
        Field::new("active_sensors", WireType::U16),
        Field::new("mode", WireType::U32),
        Field::new("pid_profile", WireType::ProfileIndex),
    ],
);

/// Extended status. The only source of the active rate profile.
pub static STATUS_EX: Schema = Schema::read_only(
    "status_ex",
    codes::STATUS_EX,
    &[
        Field::new("cycle_time", WireType::U16),
        Field::new("i2c_errors", WireType::U16),
        Field::new("active_sensors", WireType::U16),
        Field::new("mode", WireType::U32),
        Field::new("pid_profile", WireType::ProfileIndex),
        Field::new("cpu_load", WireType::U16),
        Field::new("profile_count", WireType::U8),
        Field::new("rate_profile", WireType::ProfileIndex),
        Field::new("additional_mode", WireType::PrefixedBytes),
        Field::new("arming_disable_flags_count", WireType::U8),
        Field::new("arming_disable_flags", WireType::U32),
        Field::new("config_state", WireType::U8),
    ],
);

pub static ATTITUDE: Schema = Schema::read_only(
    "attitude",
    codes::ATTITUDE,
    &[
        // tenths of a degree
        Field::new("roll", WireType::I16),
        Field::new("pitch", WireType::I16),
        // degrees
        Field::new("yaw", WireType::I16),
    ],
);

pub static RAW_IMU: Schema = Schema::read_only(
    "raw_imu",
    codes::RAW_IMU,
    &[
        Field::new("accelerometer", WireType::Array(3, Scalar::I16)),
        Field::new("gyroscope", WireType::Array(3, Scalar::I16)),
        Field::new("magnetometer", WireType::Array(3, Scalar::I16)),
    ],
);

bitflags! {
    /// Sensors detected by the flight controller.
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct SensorFlags: u16 {
        const ACC = 1 << 0;
        const BARO = 1 << 1;
        const MAG = 1 << 2;
        const GPS = 1 << 3;
        const RANGEFINDER = 1 << 4;
        const GYRO = 1 << 5;
    }
}

bitflags! {
    /// Reasons the flight controller currently refuses to arm.
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct ArmingDisableFlags: u32 {
        const NO_GYRO = 1 << 0;
        const FAILSAFE = 1 << 1;
        const RX_FAILSAFE = 1 << 2;
        const BAD_RX_RECOVERY = 1 << 3;
        const BOXFAILSAFE = 1 << 4;
        const RUNAWAY_TAKEOFF = 1 << 5;
        const CRASH_DETECTED = 1 << 6;
        const THROTTLE = 1 << 7;
        const ANGLE = 1 << 8;
        const BOOT_GRACE_TIME = 1 << 9;
        const NOPREARM = 1 << 10;
        const LOAD = 1 << 11;
        const CALIBRATING = 1 << 12;
        const CLI = 1 << 13;
        const CMS_MENU = 1 << 14;
        const BST = 1 << 15;
        const MSP = 1 << 16;
        const PARALYZE = 1 << 17;
        const GPS = 1 << 18;
        const RESC = 1 << 19;
        const RPMFILTER = 1 << 20;
        const REBOOT_REQUIRED = 1 << 21;
        const DSHOT_BITBANG = 1 << 22;
        const ACC_CALIBRATION = 1 << 23;
        const MOTOR_PROTOCOL = 1 << 24;
        const ARM_SWITCH = 1 << 25;

        // Flags added by newer firmware are kept as-is.
        const _ = !0;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct ConfigState: u8 {
        const REBOOT_REQUIRED = 1 << 0;
    }
}

/// Reply to [`STATUS_EX`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StatusEx {
    /// Main loop time in microseconds.
    pub cycle_time: u16,
    pub i2c_errors: u16,
    pub sensors: SensorFlags,
    /// First 32 flight mode flags. The rest are in `additional_mode`.
    pub mode: u32,
    pub additional_mode: Vec<u8>,
    /// Percent.
    pub cpu_load: u16,
    pub profile_count: u8,
    pub profiles: Profiles,
    pub arming_disable_flags: ArmingDisableFlags,
    pub config_state: ConfigState,
}

impl StatusEx {
    pub fn can_arm(&self) -> bool {
        self.arming_disable_flags.is_empty()
    }
}

impl TryFrom<&Record> for StatusEx {
    type Error = RegistryError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            cycle_time: record.require("cycle_time")?,
            i2c_errors: record.require("i2c_errors")?,
            sensors: SensorFlags::from_bits_truncate(record.require("active_sensors")?),
            mode: record.require("mode")?,
            additional_mode: record.require("additional_mode")?,
            cpu_load: record.require("cpu_load")?,
            profile_count: record.require("profile_count")?,
            profiles: Profiles::try_from(record)?,
            arming_disable_flags: ArmingDisableFlags::from_bits_retain(
                record.require("arming_disable_flags")?,
            ),
            config_state: ConfigState::from_bits_truncate(record.require("config_state")?),
        })
    }
}

/// Reads the active profiles out of a [`STATUS_EX`] reply.
impl TryFrom<&Record> for Profiles {
    type Error = RegistryError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            pid: record.require("pid_profile")?,
            rate: record.require("rate_profile")?,
        })
    }
}
