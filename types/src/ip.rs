//! Validated client identifier.
//!
//! The gate keys all state by IPv4 address. `ClientIp` guarantees the inner
//! string is a strict dotted-quad literal; anything else (hostnames, IPv6,
//! octets above 255) is rejected at the boundary so the rest of the
//! workspace never re-validates.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("not a well-formed IPv4 literal: {0:?}")]
pub struct InvalidIpError(pub String);

/// A validated IPv4 client identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientIp(Ipv4Addr);

impl ClientIp {
    pub fn new(addr: Ipv4Addr) -> Self {
        Self(addr)
    }

    /// Parse a dotted-quad IPv4 literal.
    ///
    /// Stricter than the original checkpoint's regex: octets above 255 are
    /// rejected, as are leading/trailing whitespace and embedded ports.
    pub fn parse(s: &str) -> Result<Self, InvalidIpError> {
        s.parse::<Ipv4Addr>()
            .map(Self)
            .map_err(|_| InvalidIpError(s.to_string()))
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.0
    }
}

impl FromStr for ClientIp {
    type Err = InvalidIpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Ipv4Addr> for ClientIp {
    fn from(addr: Ipv4Addr) -> Self {
        Self(addr)
    }
}

impl Serialize for ClientIp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ClientIp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
