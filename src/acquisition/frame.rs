// Frame geometry fixed by the instrument firmware
pub const FRAME_WORDS: usize = 17;
pub const FRAME_BYTES: usize = FRAME_WORDS * 4;

/// One fixed-layout sample streamed by the instrument: 17 little-endian
/// unsigned 32-bit words, immutable once decoded.
///
/// Word layout:
/// - 0: elapsed test time in milliseconds
/// - 1..=8: discrete channel event counters
/// - 9, 11, 13, 15: analog channel event counters
/// - 10, 12, 14, 16: analog channel levels, raw ADC counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    words: [u32; FRAME_WORDS],
}

impl Frame {
    /// Decode a wire frame. The buffer length is fixed by the type, so
    /// a short read can never reach this point.
    pub fn decode(bytes: &[u8; FRAME_BYTES]) -> Self {
        let mut words = [0u32; FRAME_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self { words }
    }

    pub fn from_words(words: [u32; FRAME_WORDS]) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[u32; FRAME_WORDS] {
        &self.words
    }

    /// Milliseconds since test start, word 0. Non-decreasing across a
    /// healthy stream.
    pub fn elapsed_ms(&self) -> u32 {
        self.words[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bytes_decode_to_zero_words() {
        let frame = Frame::decode(&[0u8; FRAME_BYTES]);
        assert_eq!(frame.words(), &[0u32; FRAME_WORDS]);
        assert_eq!(frame.elapsed_ms(), 0);
    }

    #[test]
    fn sequential_words_decode_little_endian() {
        let mut bytes = [0u8; FRAME_BYTES];
        for i in 0..FRAME_WORDS {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&(i as u32).to_le_bytes());
        }

        let frame = Frame::decode(&bytes);
        for (i, word) in frame.words().iter().enumerate() {
            assert_eq!(*word, i as u32);
        }
    }

    #[test]
    fn byte_order_is_little_endian() {
        let mut bytes = [0u8; FRAME_BYTES];
        bytes[0] = 0x01;
        bytes[1] = 0x02;

        let frame = Frame::decode(&bytes);
        assert_eq!(frame.elapsed_ms(), 0x0201);
    }
}
