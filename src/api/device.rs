//! Block device names
//!
//! Devices are named `<prefix><suffix>`: a two letter prefix such as `sd` or
//! `vd` followed by a one or two letter positional suffix. Single letter
//! suffixes cover indices 0..=25 (`a`..`z`), two letter suffixes continue
//! at 26 (`aa`) up to [`MAX_INDEX`] (`zz`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

const LETTERS: usize = 26;

/// Maximum index produced by [`parse_name`] and accepted by [`name`].
pub const MAX_INDEX: usize = LETTERS * LETTERS + LETTERS - 1;

/// Device prefix used by virtio devices.
pub const VIRTIO_PREFIX: &str = "vd";

const NAME_PATTERN: &str = "^(?P<prefix>[a-z]{2})(?P<index>[a-z][a-z]?)$";

static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(NAME_PATTERN).expect("device name pattern is a valid regex"));

/// Split a device name into its prefix and positional index.
///
/// ```
/// use ironcore_mcm_provider::api::device::parse_name;
///
/// assert_eq!(parse_name("sdaa").unwrap(), ("sd".to_string(), 26));
/// ```
pub fn parse_name(name: &str) -> Result<(String, usize)> {
    let captures = NAME_REGEX
        .captures(name)
        .ok_or_else(|| Error::MalformedDeviceName {
            name: name.to_string(),
            pattern: NAME_PATTERN.to_string(),
        })?;

    let prefix = captures["prefix"].to_string();
    let index = match *captures["index"].as_bytes() {
        [c1, c2] => (letter(c1) + 1) * LETTERS + letter(c2),
        [c, ..] => letter(c),
        [] => 0,
    };

    Ok((prefix, index))
}

/// Build the device name for `prefix` at `index`. Inverse of [`parse_name`].
pub fn name(prefix: &str, index: usize) -> Result<String> {
    if prefix.len() != 2 || !prefix.bytes().all(|b| b.is_ascii_lowercase()) {
        return Err(Error::InvalidDevicePrefix {
            prefix: prefix.to_string(),
        });
    }
    if index > MAX_INDEX {
        return Err(Error::DeviceIndexOutOfRange {
            index,
            max: MAX_INDEX,
        });
    }

    let mut name = String::with_capacity(4);
    name.push_str(prefix);
    if index < LETTERS {
        name.push(char_at(index));
    } else {
        name.push(char_at(index / LETTERS - 1));
        name.push(char_at(index % LETTERS));
    }
    Ok(name)
}

fn letter(c: u8) -> usize {
    (c - b'a') as usize
}

fn char_at(i: usize) -> char {
    (b'a' + i as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn test_parse_single_letter_suffix() {
        assert_eq!(parse_name("sda").unwrap(), ("sd".to_string(), 0));
        assert_eq!(parse_name("sdz").unwrap(), ("sd".to_string(), 25));
        assert_eq!(parse_name("vdb").unwrap(), ("vd".to_string(), 1));
    }

    #[test]
    fn test_parse_two_letter_suffix() {
        assert_eq!(parse_name("sdaa").unwrap(), ("sd".to_string(), 26));
        assert_eq!(parse_name("sdab").unwrap(), ("sd".to_string(), 27));
        assert_eq!(parse_name("sdba").unwrap(), ("sd".to_string(), 52));
        assert_eq!(parse_name("sdzz").unwrap(), ("sd".to_string(), MAX_INDEX));
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        for bad in ["", "sd", "sdaaa", "f_aa", "SDA", "s1a", "sda1", "foobar", " sda"] {
            assert_matches!(
                parse_name(bad),
                Err(Error::MalformedDeviceName { name, .. }) if name == bad
            );
        }
    }

    #[test]
    fn test_parse_error_names_pattern() {
        let err = parse_name("sdaaa").unwrap_err();
        assert!(err.to_string().contains("sdaaa"));
        assert!(err.to_string().contains(NAME_PATTERN));
    }

    #[test]
    fn test_name() {
        assert_eq!(name("sd", 0).unwrap(), "sda");
        assert_eq!(name("sd", 25).unwrap(), "sdz");
        assert_eq!(name("sd", 26).unwrap(), "sdaa");
        assert_eq!(name(VIRTIO_PREFIX, MAX_INDEX).unwrap(), "vdzz");
    }

    #[test]
    fn test_name_rejects_bad_input() {
        assert_matches!(name("sd", MAX_INDEX + 1), Err(Error::DeviceIndexOutOfRange { .. }));
        assert_matches!(name("s", 0), Err(Error::InvalidDevicePrefix { .. }));
        assert_matches!(name("SD", 0), Err(Error::InvalidDevicePrefix { .. }));
    }

    #[test]
    fn test_max_index() {
        assert_eq!(MAX_INDEX, 701);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_name_roundtrip(prefix in "[a-z]{2}", index in 0usize..=MAX_INDEX) {
            let encoded = name(&prefix, index).unwrap();
            prop_assert_eq!(parse_name(&encoded).unwrap(), (prefix, index));
        }

        #[test]
        fn prop_parse_never_exceeds_max(name in "[a-z]{3,4}") {
            let (_, index) = parse_name(&name).unwrap();
            prop_assert!(index <= MAX_INDEX);
        }
    }
}
