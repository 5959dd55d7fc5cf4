use core::fmt;

/// An MSP API version, as reported by the `API_VERSION` query.
///
/// Versions are compared field by field, so `1.44` sorts after `1.43`
/// regardless of the protocol byte's meaning. Versioned payload fields are
/// gated on this type.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolVersion {
    /// The MSP protocol generation byte (0 for MSP v1).
    pub protocol: u8,
    /// The major API version
    pub major: u8,
    /// The minor API version
    pub minor: u8,
}

impl ProtocolVersion {
    pub const V1_40: Self = Self::new(0, 1, 40);
    pub const V1_41: Self = Self::new(0, 1, 41);
    pub const V1_42: Self = Self::new(0, 1, 42);
    pub const V1_43: Self = Self::new(0, 1, 43);
    pub const V1_44: Self = Self::new(0, 1, 44);

    /// The newest API version whose payload layouts are known.
    ///
    /// Used to decode replies that arrive before a version has been negotiated.
    pub const MAX_SUPPORTED: Self = Self::V1_44;

    pub const fn new(protocol: u8, major: u8, minor: u8) -> Self {
        Self {
            protocol,
            major,
            minor,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.protocol, self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::ProtocolVersion;

    #[test]
    fn ordering() {
        assert!(ProtocolVersion::V1_41 > ProtocolVersion::V1_40);
        assert!(ProtocolVersion::new(0, 2, 0) > ProtocolVersion::V1_44);
        assert!(ProtocolVersion::new(1, 0, 0) > ProtocolVersion::new(0, 9, 99));
    }
}
