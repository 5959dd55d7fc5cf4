//! Configuration groups and the commands that act on them.

use bitflags::bitflags;

use crate::{
    codes,
    field::{Field, Record, Scalar, WireType},
    registry::{RegistryError, Schema},
    version::ProtocolVersion,
};

/// Number of PID axes in a [`PID`] payload: roll, pitch, yaw, level and mag.
pub const PID_AXIS_COUNT: usize = 5;

/// Rates and expo for each stick. Rates are hundredths, so 100 means 1.0.
pub static RC_TUNING: Schema = Schema::read_write(
    "rc_tuning",
    codes::RC_TUNING,
    codes::SET_RC_TUNING,
    &[
        Field::new("rc_rate", WireType::U8),
        Field::new("rc_expo", WireType::U8),
        Field::new("roll_rate", WireType::U8),
        Field::new("pitch_rate", WireType::U8),
        Field::new("yaw_rate", WireType::U8),
        Field::new("tpa_rate", WireType::U8),
        Field::new("throttle_mid", WireType::U8),
        Field::new("throttle_expo", WireType::U8),
        Field::new("tpa_breakpoint", WireType::U16),
        Field::new("rc_yaw_expo", WireType::U8),
        Field::new("rc_yaw_rate", WireType::U8),
        Field::new("rc_pitch_rate", WireType::U8),
        Field::new("rc_pitch_expo", WireType::U8),
        Field::new("throttle_limit_type", WireType::U8).since(ProtocolVersion::V1_41),
        Field::new("throttle_limit_percent", WireType::U8)
            .since(ProtocolVersion::V1_41)
            .with_default(100),
        Field::new("roll_rate_limit", WireType::U16)
            .since(ProtocolVersion::V1_42)
            .with_default(1998),
        Field::new("pitch_rate_limit", WireType::U16)
            .since(ProtocolVersion::V1_42)
            .with_default(1998),
        Field::new("yaw_rate_limit", WireType::U16)
            .since(ProtocolVersion::V1_42)
            .with_default(1998),
        Field::new("rates_type", WireType::U8).since(ProtocolVersion::V1_43),
    ],
);

/// P, I and D for each axis, one byte per term.
pub static PID: Schema = Schema::read_write(
    "pid",
    codes::PID,
    codes::SET_PID,
    &[
        Field::new("roll", WireType::Array(3, Scalar::U8)),
        Field::new("pitch", WireType::Array(3, Scalar::U8)),
        Field::new("yaw", WireType::Array(3, Scalar::U8)),
        Field::new("level", WireType::Array(3, Scalar::U8)),
        Field::new("mag", WireType::Array(3, Scalar::U8)),
    ],
);

pub static PID_ADVANCED: Schema = Schema::read_write(
    "pid_advanced",
    codes::PID_ADVANCED,
    codes::SET_PID_ADVANCED,
    &[
        Field::new("reserved_0", WireType::U16),
        Field::new("reserved_1", WireType::U16),
        Field::new("reserved_2", WireType::U16),
        Field::new("reserved_3", WireType::U8),
        Field::new("reserved_4", WireType::U8),
        Field::new("feedforward_transition", WireType::U8).since(ProtocolVersion::V1_44),
        Field::new("reserved_5", WireType::U8),
        Field::new("reserved_6", WireType::U8),
        Field::new("reserved_7", WireType::U8),
        Field::new("reserved_8", WireType::U8),
        Field::new("rate_accel_limit", WireType::U16),
        Field::new("yaw_rate_accel_limit", WireType::U16),
        Field::new("level_angle_limit", WireType::U8),
        Field::new("reserved_9", WireType::U8),
        Field::new("iterm_throttle_threshold", WireType::U16),
        Field::new("iterm_accelerator_gain", WireType::U16),
        Field::new("reserved_10", WireType::U16),
        Field::new("iterm_rotation", WireType::U8),
        Field::new("reserved_11", WireType::U8),
        Field::new("iterm_relax", WireType::U8),
        Field::new("iterm_relax_type", WireType::U8),
        Field::new("abs_control_gain", WireType::U8),
        Field::new("throttle_boost", WireType::U8),
        Field::new("acro_trainer_angle_limit", WireType::U8),
        Field::new("pid_roll_f", WireType::U16),
        Field::new("pid_pitch_f", WireType::U16),
        Field::new("pid_yaw_f", WireType::U16),
        Field::new("anti_gravity_mode", WireType::U8),
        Field::new("d_min_roll", WireType::U8),
        Field::new("d_min_pitch", WireType::U8),
        Field::new("d_min_yaw", WireType::U8),
        Field::new("d_min_gain", WireType::U8),
        Field::new("d_min_advance", WireType::U8),
        Field::new("use_integrated_yaw", WireType::U8),
        Field::new("integrated_yaw_relax", WireType::U8),
        Field::new("iterm_relax_cutoff", WireType::U8).since(ProtocolVersion::V1_42),
        Field::new("motor_output_limit", WireType::U8)
            .since(ProtocolVersion::V1_43)
            .with_default(100),
        Field::new("auto_profile_cell_count", WireType::U8).since(ProtocolVersion::V1_43),
        Field::new("dyn_idle_min_rpm", WireType::U8).since(ProtocolVersion::V1_43),
        Field::new("feedforward_averaging", WireType::U8).since(ProtocolVersion::V1_44),
        Field::new("feedforward_smooth_factor", WireType::U8).since(ProtocolVersion::V1_44),
        Field::new("feedforward_boost", WireType::U8).since(ProtocolVersion::V1_44),
        Field::new("feedforward_max_rate_limit", WireType::U8).since(ProtocolVersion::V1_44),
        Field::new("feedforward_jitter_factor", WireType::U8).since(ProtocolVersion::V1_44),
        Field::new("vbat_sag_compensation", WireType::U8).since(ProtocolVersion::V1_44),
        Field::new("thrust_linearization", WireType::U8).since(ProtocolVersion::V1_44),
    ],
);

pub static FEATURE_CONFIG: Schema = Schema::read_write(
    "feature_config",
    codes::FEATURE_CONFIG,
    codes::SET_FEATURE_CONFIG,
    &[Field::new("features", WireType::U32)],
);

pub static RX_CONFIG: Schema = Schema::read_write(
    "rx_config",
    codes::RX_CONFIG,
    codes::SET_RX_CONFIG,
    &[
        Field::new("serialrx_provider", WireType::U8),
        Field::new("stick_max", WireType::U16).with_default(1900),
        Field::new("stick_center", WireType::U16).with_default(1500),
        Field::new("stick_min", WireType::U16).with_default(1050),
        Field::new("spektrum_sat_bind", WireType::U8),
        Field::new("rx_min_usec", WireType::U16).with_default(885),
        Field::new("rx_max_usec", WireType::U16).with_default(2115),
        Field::new("rc_interpolation", WireType::U8),
        Field::new("rc_interpolation_interval", WireType::U8),
        Field::new("air_mode_activate_threshold", WireType::U16).with_default(1250),
        Field::new("rx_spi_protocol", WireType::U8),
        Field::new("rx_spi_id", WireType::U32),
        Field::new("rx_spi_rf_channel_count", WireType::U8),
        Field::new("fpv_cam_angle_degrees", WireType::U8),
        Field::new("rc_interpolation_channels", WireType::U8),
        Field::new("rc_smoothing_type", WireType::U8),
        Field::new("rc_smoothing_input_cutoff", WireType::U8),
        Field::new("rc_smoothing_derivative_cutoff", WireType::U8),
        Field::new("rc_smoothing_input_type", WireType::U8),
        Field::new("rc_smoothing_derivative_type", WireType::U8),
        Field::new("usb_cdc_hid_type", WireType::U8).since(ProtocolVersion::V1_42),
    ],
);

pub static SENSOR_ALIGNMENT: Schema = Schema::read_write(
    "sensor_alignment",
    codes::SENSOR_ALIGNMENT,
    codes::SET_SENSOR_ALIGNMENT,
    &[
        Field::new("align_gyro", WireType::U8),
        Field::new("align_acc", WireType::U8),
        Field::new("align_mag", WireType::U8),
        Field::new("gyro_detection_flags", WireType::U8),
        Field::new("gyro_to_use", WireType::U8),
        Field::new("gyro_1_align", WireType::U8),
        Field::new("gyro_2_align", WireType::U8),
    ],
);

/// Switches the active PID or rate profile. See [`ProfileSelection`](crate::select::ProfileSelection).
///
/// Rejected by the device while armed.
pub static SELECT_SETTING: Schema = Schema::write_only(
    "select_setting",
    codes::SELECT_SETTING,
    &[Field::new("selection", WireType::U8)],
);

/// Copies one PID or rate profile over another.
pub static COPY_PROFILE: Schema = Schema::write_only(
    "copy_profile",
    codes::COPY_PROFILE,
    &[
        // 0 = PID, 1 = rate
        Field::new("kind", WireType::U8),
        Field::new("destination", WireType::ProfileIndex),
        Field::new("source", WireType::ProfileIndex),
    ],
);

/// Persists all settings to the device's EEPROM.
pub static EEPROM_WRITE: Schema = Schema::write_only("eeprom_write", codes::EEPROM_WRITE, &[]);

bitflags! {
    /// Optional firmware features, as read and written through [`FEATURE_CONFIG`].
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct Features: u32 {
        const RX_PPM = 1 << 0;
        const INFLIGHT_ACC_CAL = 1 << 2;
        const RX_SERIAL = 1 << 3;
        const MOTOR_STOP = 1 << 4;
        const SERVO_TILT = 1 << 5;
        const SOFTSERIAL = 1 << 6;
        const GPS = 1 << 7;
        const RANGEFINDER = 1 << 9;
        const TELEMETRY = 1 << 10;
        const THREED = 1 << 12;
        const RX_PARALLEL_PWM = 1 << 13;
        const RX_MSP = 1 << 14;
        const RSSI_ADC = 1 << 15;
        const LED_STRIP = 1 << 16;
        const DASHBOARD = 1 << 17;
        const OSD = 1 << 18;
        const CHANNEL_FORWARDING = 1 << 20;
        const TRANSPONDER = 1 << 21;
        const AIRMODE = 1 << 22;
        const RX_SPI = 1 << 25;
        const ESC_SENSOR = 1 << 27;
        const ANTI_GRAVITY = 1 << 28;

        // Bits of removed or unknown features must be written back unchanged.
        const _ = !0;
    }
}

impl Features {
    pub fn to_record(self) -> Record {
        Record::new().with("features", self.bits())
    }
}

impl TryFrom<&Record> for Features {
    type Error = RegistryError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        record.require("features").map(Self::from_bits_retain)
    }
}
