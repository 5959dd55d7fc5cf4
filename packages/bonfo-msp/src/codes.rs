//! MSP v1 message codes.
//!
//! A "get" code asks the device for a payload; the matching "set" code writes
//! one back. This module is non-exhaustive.

// identity
pub const API_VERSION: u16 = 1;
pub const FC_VARIANT: u16 = 2;
pub const FC_VERSION: u16 = 3;
pub const BOARD_INFO: u16 = 4;
pub const BUILD_INFO: u16 = 5;

pub const NAME: u16 = 10;
pub const SET_NAME: u16 = 11;

// configuration
pub const BATTERY_CONFIG: u16 = 32;
pub const SET_BATTERY_CONFIG: u16 = 33;
pub const MODE_RANGES: u16 = 34;
pub const SET_MODE_RANGE: u16 = 35;
pub const FEATURE_CONFIG: u16 = 36;
pub const SET_FEATURE_CONFIG: u16 = 37;
pub const BOARD_ALIGNMENT_CONFIG: u16 = 38;
pub const SET_BOARD_ALIGNMENT_CONFIG: u16 = 39;
pub const CURRENT_METER_CONFIG: u16 = 40;
pub const SET_CURRENT_METER_CONFIG: u16 = 41;
pub const MIXER_CONFIG: u16 = 42;
pub const SET_MIXER_CONFIG: u16 = 43;
pub const RX_CONFIG: u16 = 44;
pub const SET_RX_CONFIG: u16 = 45;
pub const LED_COLORS: u16 = 46;
pub const SET_LED_COLORS: u16 = 47;
pub const LED_STRIP_CONFIG: u16 = 48;
pub const SET_LED_STRIP_CONFIG: u16 = 49;
pub const RSSI_CONFIG: u16 = 50;
pub const SET_RSSI_CONFIG: u16 = 51;
pub const ADJUSTMENT_RANGES: u16 = 52;
pub const SET_ADJUSTMENT_RANGE: u16 = 53;
pub const CF_SERIAL_CONFIG: u16 = 54;
pub const SET_CF_SERIAL_CONFIG: u16 = 55;
pub const VOLTAGE_METER_CONFIG: u16 = 56;
pub const SET_VOLTAGE_METER_CONFIG: u16 = 57;
pub const PID_CONTROLLER: u16 = 59;
pub const SET_PID_CONTROLLER: u16 = 60;
pub const ARMING_CONFIG: u16 = 61;
pub const SET_ARMING_CONFIG: u16 = 62;
pub const RX_MAP: u16 = 64;
pub const SET_RX_MAP: u16 = 65;
pub const SET_REBOOT: u16 = 68;
pub const DATAFLASH_SUMMARY: u16 = 70;
pub const DATAFLASH_READ: u16 = 71;
pub const DATAFLASH_ERASE: u16 = 72;
pub const FAILSAFE_CONFIG: u16 = 75;
pub const SET_FAILSAFE_CONFIG: u16 = 76;
pub const RXFAIL_CONFIG: u16 = 77;
pub const SET_RXFAIL_CONFIG: u16 = 78;
pub const SDCARD_SUMMARY: u16 = 79;
pub const BLACKBOX_CONFIG: u16 = 80;
pub const SET_BLACKBOX_CONFIG: u16 = 81;
pub const TRANSPONDER_CONFIG: u16 = 82;
pub const SET_TRANSPONDER_CONFIG: u16 = 83;
pub const OSD_CONFIG: u16 = 84;
pub const SET_OSD_CONFIG: u16 = 85;
pub const VTX_CONFIG: u16 = 88;
pub const SET_VTX_CONFIG: u16 = 89;
pub const ADVANCED_CONFIG: u16 = 90;
pub const SET_ADVANCED_CONFIG: u16 = 91;
pub const FILTER_CONFIG: u16 = 92;
pub const SET_FILTER_CONFIG: u16 = 93;
pub const PID_ADVANCED: u16 = 94;
pub const SET_PID_ADVANCED: u16 = 95;
pub const SENSOR_CONFIG: u16 = 96;
pub const SET_SENSOR_CONFIG: u16 = 97;
pub const ARMING_DISABLE: u16 = 99;

// telemetry
pub const STATUS: u16 = 101;
pub const RAW_IMU: u16 = 102;
pub const SERVO: u16 = 103;
pub const MOTOR: u16 = 104;
pub const RC: u16 = 105;
pub const RAW_GPS: u16 = 106;
pub const COMP_GPS: u16 = 107;
pub const ATTITUDE: u16 = 108;
pub const ALTITUDE: u16 = 109;
pub const ANALOG: u16 = 110;
pub const RC_TUNING: u16 = 111;
pub const PID: u16 = 112;
pub const BOXNAMES: u16 = 116;
pub const PIDNAMES: u16 = 117;
pub const BOXIDS: u16 = 119;
pub const SERVO_CONFIGURATIONS: u16 = 120;
pub const MOTOR_3D_CONFIG: u16 = 124;
pub const RC_DEADBAND: u16 = 125;
pub const SENSOR_ALIGNMENT: u16 = 126;
pub const LED_STRIP_MODECOLOR: u16 = 127;
pub const VOLTAGE_METERS: u16 = 128;
pub const CURRENT_METERS: u16 = 129;
pub const BATTERY_STATE: u16 = 130;
pub const MOTOR_CONFIG: u16 = 131;
pub const GPS_CONFIG: u16 = 132;
pub const COMPASS_CONFIG: u16 = 133;
pub const GPS_RESCUE: u16 = 135;
pub const STATUS_EX: u16 = 150;
pub const UID: u16 = 160;
pub const GPS_SV_INFO: u16 = 164;
pub const GPSSTATISTICS: u16 = 166;
pub const DISPLAYPORT: u16 = 182;
pub const COPY_PROFILE: u16 = 183;
pub const BEEPER_CONFIG: u16 = 184;
pub const SET_BEEPER_CONFIG: u16 = 185;

// commands
pub const SET_RAW_RC: u16 = 200;
pub const SET_PID: u16 = 202;
pub const SET_RC_TUNING: u16 = 204;
pub const ACC_CALIBRATION: u16 = 205;
pub const MAG_CALIBRATION: u16 = 206;
pub const RESET_CONF: u16 = 208;
pub const SELECT_SETTING: u16 = 210;
pub const SET_SERVO_CONFIGURATION: u16 = 212;
pub const SET_MOTOR: u16 = 214;
pub const SET_MOTOR_3D_CONFIG: u16 = 217;
pub const SET_RC_DEADBAND: u16 = 218;
pub const SET_RESET_CURR_PID: u16 = 219;
pub const SET_SENSOR_ALIGNMENT: u16 = 220;
pub const SET_LED_STRIP_MODECOLOR: u16 = 221;
pub const SET_MOTOR_CONFIG: u16 = 222;
pub const SET_GPS_CONFIG: u16 = 223;
pub const SET_COMPASS_CONFIG: u16 = 224;
pub const SET_GPS_RESCUE: u16 = 225;
pub const MODE_RANGES_EXTRA: u16 = 238;
pub const SET_ACC_TRIM: u16 = 239;
pub const ACC_TRIM: u16 = 240;
pub const SERVO_MIX_RULES: u16 = 241;
pub const SET_RTC: u16 = 246;
pub const EEPROM_WRITE: u16 = 250;
pub const DEBUG: u16 = 254;
