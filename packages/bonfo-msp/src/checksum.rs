/// XOR-folds `bytes` onto an initial checksum value.
///
/// MSP v1 frames carry a single checksum byte computed over the length byte,
/// the code byte and every payload byte, in that order.
pub fn xor_fold(init: u8, bytes: &[u8]) -> u8 {
    bytes.iter().fold(init, |acc, byte| acc ^ byte)
}

/// Computes the checksum of an MSP v1 frame.
pub fn frame_checksum(length: u8, code: u8, payload: &[u8]) -> u8 {
    xor_fold(length ^ code, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload() {
        // A bare FC_VARIANT request.
        assert_eq!(frame_checksum(0, 2, &[]), 0x02);
    }

    #[test]
    fn variant_reply() {
        assert_eq!(frame_checksum(4, 2, b"BTFL"), 0x1A);
    }
}
