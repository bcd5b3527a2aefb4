//! Thin wrappers around the `adler2` and `crc32fast` crates providing the two
//! rolling checksums used by the container layer: Adler-32 for the zlib
//! trailer (RFC 1950 §2.2) and CRC-32 for the gzip trailer (RFC 1952 §2.3).

pub use adler2::Adler32 as Adler32State;
pub use crc32fast::Hasher as Crc32State;

/// One-shot Adler-32 over `data`, starting from the standard initial value 1.
///
/// # Parity vectors
/// * `adler32_oneshot(b"")` == `0x0000_0001`
/// * `adler32_oneshot(b"Wikipedia")` == `0x11E6_0398`
#[inline]
pub fn adler32_oneshot(data: &[u8]) -> u32 {
    let mut state = Adler32State::new();
    state.write_slice(data);
    state.checksum()
}

/// One-shot CRC-32 (IEEE, reflected) over `data`.
///
/// # Parity vectors
/// * `crc32_oneshot(b"")` == `0x0000_0000`
/// * `crc32_oneshot(b"123456789")` == `0xCBF4_3926`
#[inline]
pub fn crc32_oneshot(data: &[u8]) -> u32 {
    let mut state = Crc32State::new();
    state.update(data);
    state.finalize()
}

/// Rolling checksum selected by the active container wrapper.
///
/// `None` keeps the update path branch-free for raw streams while letting the
/// engines treat all three wrappers uniformly.
#[derive(Debug, Clone)]
pub enum RollingChecksum {
    /// Raw streams carry no trailer checksum.
    None,
    /// Adler-32 for the zlib wrapper.
    Adler32(Adler32State),
    /// CRC-32 for the gzip wrapper.
    Crc32(Crc32State),
}

impl RollingChecksum {
    /// Feed `data` into the running checksum.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        match self {
            RollingChecksum::None => {}
            RollingChecksum::Adler32(state) => state.write_slice(data),
            RollingChecksum::Crc32(state) => state.update(data),
        }
    }

    /// Current checksum value. Raw streams report 0.
    #[inline]
    pub fn value(&self) -> u32 {
        match self {
            RollingChecksum::None => 0,
            RollingChecksum::Adler32(state) => state.checksum(),
            RollingChecksum::Crc32(state) => state.clone().finalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adler32_parity() {
        assert_eq!(adler32_oneshot(b""), 0x0000_0001);
        assert_eq!(adler32_oneshot(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn crc32_parity() {
        assert_eq!(crc32_oneshot(b""), 0);
        assert_eq!(crc32_oneshot(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn rolling_matches_oneshot_across_split_updates() {
        let data = b"the checksum of split input must match the whole";
        let (a, b) = data.split_at(13);

        let mut adler = RollingChecksum::Adler32(Adler32State::new());
        adler.update(a);
        adler.update(b);
        assert_eq!(adler.value(), adler32_oneshot(data));

        let mut crc = RollingChecksum::Crc32(Crc32State::new());
        crc.update(a);
        crc.update(b);
        assert_eq!(crc.value(), crc32_oneshot(data));
    }
}
