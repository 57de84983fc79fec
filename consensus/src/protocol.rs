//! IP protocol filter applied to every voter during a resolution.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Address family a resolution is restricted to.
///
/// The numeric values are the ones accepted on the configuration surface:
/// `0` for any family, `4` for IPv4 and `6` for IPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IpProtocol {
    #[default]
    Any,
    V4,
    V6,
}

impl IpProtocol {
    pub fn as_u8(self) -> u8 {
        match self {
            IpProtocol::Any => 0,
            IpProtocol::V4 => 4,
            IpProtocol::V6 => 6,
        }
    }

    /// Whether `ip` belongs to the family this filter selects.
    pub fn matches(self, ip: &IpAddr) -> bool {
        match self {
            IpProtocol::Any => true,
            IpProtocol::V4 => ip.is_ipv4(),
            IpProtocol::V6 => ip.is_ipv6(),
        }
    }
}

impl TryFrom<u8> for IpProtocol {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IpProtocol::Any),
            4 => Ok(IpProtocol::V4),
            6 => Ok(IpProtocol::V6),
            other => Err(ConfigError::InvalidProtocol(other)),
        }
    }
}

impl From<IpProtocol> for u8 {
    fn from(protocol: IpProtocol) -> Self {
        protocol.as_u8()
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::Any => f.write_str("any"),
            IpProtocol::V4 => f.write_str("ipv4"),
            IpProtocol::V6 => f.write_str("ipv6"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn accepts_only_known_values() {
        assert_eq!(IpProtocol::try_from(0).unwrap(), IpProtocol::Any);
        assert_eq!(IpProtocol::try_from(4).unwrap(), IpProtocol::V4);
        assert_eq!(IpProtocol::try_from(6).unwrap(), IpProtocol::V6);

        for bad in [1u8, 2, 3, 5, 7, 46, 255] {
            assert_eq!(
                IpProtocol::try_from(bad),
                Err(ConfigError::InvalidProtocol(bad))
            );
        }
    }

    #[test]
    fn numeric_value_survives_conversion() {
        for protocol in [IpProtocol::Any, IpProtocol::V4, IpProtocol::V6] {
            assert_eq!(IpProtocol::try_from(u8::from(protocol)).unwrap(), protocol);
        }
    }

    #[test]
    fn family_matching() {
        let v4 = IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1));
        let v6 = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));

        assert!(IpProtocol::Any.matches(&v4));
        assert!(IpProtocol::Any.matches(&v6));
        assert!(IpProtocol::V4.matches(&v4));
        assert!(!IpProtocol::V4.matches(&v6));
        assert!(IpProtocol::V6.matches(&v6));
        assert!(!IpProtocol::V6.matches(&v4));
    }

    #[test]
    fn default_is_any() {
        assert_eq!(IpProtocol::default(), IpProtocol::Any);
        assert_eq!(IpProtocol::default().to_string(), "any");
    }
}
