// ============================================
// File: crates/wormhole-core/src/address/render.rs
// ============================================
//! # Address Renderings
//!
//! ## Main Functionality
//! - Compact: `WH:<tierCode>:<geoId>:<svcId>:<privacy>:<check>` (canonical,
//!   parses back via `FromStr`)
//! - 128-bit shaped: eight 4-digit hex groups, for systems that expect an
//!   IPv6-like literal (lossy, advisory only)
//! - Short token: base-36 of `geoId XOR mask(svcId)`, for name-like display
//!
//! ## ⚠️ Important Note for Next Developer
//! - The 128-bit form keeps only the low 32 bits of the service id
//! - The short token is reversible only when the service id is known
//!
//! ## Last Modified
//! v0.1.0 - Initial renderings

use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

use super::{NetworkAddress, Tier};
use crate::error::{CoreError, Result};

/// Protocol prefix of the compact form.
pub const COMPACT_PREFIX: &str = "WH";

const TOKEN_SALT: u64 = 0x5748_4F4C_544F_4B4E;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

impl NetworkAddress {
    /// Canonical compact form.
    #[must_use]
    pub fn to_compact(&self) -> String {
        format!(
            "{COMPACT_PREFIX}:{}:{}:{}:{}:{}",
            self.tier().code(),
            self.geographic_id(),
            self.service_id(),
            self.privacy_level(),
            self.check_digit()
        )
    }

    /// Eight 16-bit groups of a 128-bit shaped literal.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn ipv6_groups(&self) -> [u16; 8] {
        let geo = self.geographic_id();
        let svc = self.service_id();
        [
            (geo >> 48) as u16,
            (geo >> 32) as u16,
            (geo >> 16) as u16,
            geo as u16,
            self.tier().code() as u16,
            (svc >> 16) as u16,
            svc as u16,
            (u16::from(self.privacy_level()) << 8) | self.check_digit() as u16,
        ]
    }

    /// 128-bit shaped literal as an [`Ipv6Addr`].
    #[must_use]
    pub fn to_ipv6(&self) -> Ipv6Addr {
        let g = self.ipv6_groups();
        Ipv6Addr::new(g[0], g[1], g[2], g[3], g[4], g[5], g[6], g[7])
    }

    /// 128-bit shaped literal, fully expanded (`xxxx:xxxx:...`).
    #[must_use]
    pub fn to_ipv6_shaped(&self) -> String {
        self.ipv6_groups()
            .iter()
            .map(|g| format!("{g:04x}"))
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Base-36 short token.
    #[must_use]
    pub fn short_token(&self) -> String {
        to_base36(self.geographic_id() ^ token_mask(self.service_id()))
    }
}

/// Recovers the geographic id from a short token given its service id.
///
/// # Errors
/// `InvalidAddress` if the token is not valid base-36 or exceeds 64 bits.
pub fn geo_from_short_token(token: &str, service_id: u64) -> Result<u64> {
    let masked = u64::from_str_radix(token, 36)
        .map_err(|e| CoreError::invalid_address(token, e.to_string()))?;
    Ok(masked ^ token_mask(service_id))
}

fn token_mask(service_id: u64) -> u64 {
    service_id.rotate_left(17) ^ TOKEN_SALT
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(13);
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

// ============================================
// Display / FromStr
// ============================================

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_compact())
    }
}

impl FromStr for NetworkAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.trim().split(':').collect();
        let [prefix, code, geo, svc, privacy, check] = *fields.as_slice() else {
            return Err(CoreError::invalid_address(s, "expected 6 ':'-separated fields"));
        };

        if !prefix.eq_ignore_ascii_case(COMPACT_PREFIX) {
            return Err(CoreError::invalid_address(s, "unknown protocol prefix"));
        }

        let field = |value: &str, name: &str| {
            value
                .parse::<u64>()
                .map_err(|_| CoreError::invalid_address(s, format!("bad {name}")))
        };

        let tier = Tier::from_code(
            u32::try_from(field(code, "tier code")?)
                .map_err(|_| CoreError::invalid_address(s, "bad tier code"))?,
        )?;
        let privacy_level = u8::try_from(field(privacy, "privacy level")?)
            .map_err(|_| CoreError::invalid_address(s, "bad privacy level"))?;

        let addr = Self::from_parts(
            tier,
            field(geo, "geographic id")?,
            field(svc, "service id")?,
            privacy_level,
        )?;

        let mut check_chars = check.chars();
        match (check_chars.next(), check_chars.next()) {
            (Some(c), None) if c.to_ascii_uppercase() == addr.check_digit() => Ok(addr),
            _ => Err(CoreError::invalid_address(s, "check digit mismatch")),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NetworkAddress {
        NetworkAddress::new(Tier::Session, -33.8688, 151.2093, 2, 53, 5).unwrap()
    }

    #[test]
    fn test_compact_shape() {
        let addr = sample();
        let compact = addr.to_compact();
        assert!(compact.starts_with("WH:500:"));
        assert!(compact.ends_with(&format!(":5:{}", addr.check_digit())));
        assert_eq!(addr.to_string(), compact);
    }

    #[test]
    fn test_compact_parse() {
        let addr = sample();
        let parsed: NetworkAddress = addr.to_compact().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_compact_parse_rejects_bad_check_digit() {
        let addr = sample();
        let mut compact = addr.to_compact();
        compact.pop();
        let wrong = if addr.check_digit() == '0' { '1' } else { '0' };
        compact.push(wrong);

        let err = compact.parse::<NetworkAddress>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidAddress { .. }));
    }

    #[test]
    fn test_compact_parse_rejects_garbage() {
        assert!("".parse::<NetworkAddress>().is_err());
        assert!("XX:100:0:0:0:0".parse::<NetworkAddress>().is_err());
        assert!("WH:150:0:0:0:0".parse::<NetworkAddress>().is_err());
        assert!("WH:100:abc:0:0:0".parse::<NetworkAddress>().is_err());
        assert!("WH:100:0:0:0".parse::<NetworkAddress>().is_err());
    }

    #[test]
    fn test_ipv6_shape() {
        let shaped = sample().to_ipv6_shaped();
        let groups: Vec<&str> = shaped.split(':').collect();
        assert_eq!(groups.len(), 8);
        assert!(groups.iter().all(|g| g.len() == 4));
        assert!(shaped.parse::<Ipv6Addr>().is_ok());
        assert_eq!(shaped.parse::<Ipv6Addr>().unwrap(), sample().to_ipv6());
    }

    #[test]
    fn test_renderings_are_deterministic() {
        let a = sample();
        let b = sample();
        assert_eq!(a.to_compact(), b.to_compact());
        assert_eq!(a.to_ipv6_shaped(), b.to_ipv6_shaped());
        assert_eq!(a.short_token(), b.short_token());
    }

    #[test]
    fn test_short_token_reverses_with_service_id() {
        let addr = sample();
        let token = addr.short_token();
        assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(geo_from_short_token(&token, addr.service_id()).unwrap(), addr.geographic_id());
        assert_ne!(geo_from_short_token(&token, addr.service_id() + 1).unwrap(), addr.geographic_id());
        assert!(geo_from_short_token("not a token!", 0).is_err());
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(u64::from_str_radix(&to_base36(u64::MAX), 36).unwrap(), u64::MAX);
    }
}
