//! Fixed-size byte buffers used for hashes, public keys and signatures.

use crate::macros::impl_buf;

/// 32-byte buf, used for hashes and x-only schnorr pubkeys.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Buf32([u8; 32]);
impl_buf!(Buf32, 32);

/// 64-byte buf, used for schnorr signatures.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Buf64([u8; 64]);
impl_buf!(Buf64, 64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buf32_hex_roundtrip() {
        let buf = Buf32::from([0xab; 32]);
        let s = format!("{buf:?}");
        assert_eq!(s.len(), 64);
        let parsed: Buf32 = s.parse().unwrap();
        assert_eq!(parsed, buf);
    }

    #[test]
    fn test_buf_display_is_short() {
        let buf = Buf64::from([0x01; 64]);
        assert_eq!(format!("{buf}"), "01010101");
    }

    #[test]
    fn test_buf_rejects_wrong_len() {
        assert!(Buf32::try_from(&[0u8; 31][..]).is_err());
        assert!("abcd".parse::<Buf32>().is_err());
    }

    #[test]
    fn test_buf_serde_json() {
        let buf = Buf32::from([7; 32]);
        let js = serde_json::to_string(&buf).unwrap();
        let back: Buf32 = serde_json::from_str(&js).unwrap();
        assert_eq!(back, buf);
    }
}
