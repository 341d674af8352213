//! Secondary server trust: who may transfer a zone, and who is notified
//! when it changes.
//!
//! Trust is by source address only. Nothing is trusted until it is added.

use std::net::{IpAddr, SocketAddr};

use ipnet::IpNet;
use parking_lot::RwLock;
use tracing::debug;

use crate::{Result, ZoneError};

/// Per-zone secondary settings.
#[derive(Debug, Default)]
pub struct SecondaryRegistry {
    /// Servers that receive NOTIFY.
    notify_targets: RwLock<Vec<SocketAddr>>,
    /// Networks allowed to initiate AXFR.
    allowed_transfer: RwLock<Vec<IpNet>>,
}

impl SecondaryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a NOTIFY target. Returns false if it was already present.
    pub fn add_notify_target(&self, target: SocketAddr) -> bool {
        let mut targets = self.notify_targets.write();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);
        true
    }

    /// Removes a NOTIFY target. Returns true if it was present.
    pub fn remove_notify_target(&self, target: SocketAddr) -> bool {
        let mut targets = self.notify_targets.write();
        let before = targets.len();
        targets.retain(|t| *t != target);
        targets.len() != before
    }

    /// Returns the NOTIFY targets.
    pub fn notify_targets(&self) -> Vec<SocketAddr> {
        self.notify_targets.read().clone()
    }

    /// Allows transfers from `ip`.
    ///
    /// `ip` is `addr`, `addr/len` or `addr, len`; `prefix` may give the
    /// length instead. Without either, the entry is host-only.
    pub fn add_allowed_transfer_ip(&self, ip: &str, prefix: Option<u8>) -> Result<()> {
        let net = parse_transfer_prefix(ip, prefix)?;
        let mut allowed = self.allowed_transfer.write();
        if !allowed.contains(&net) {
            debug!(%net, "transfer prefix allowed");
            allowed.push(net);
        }
        Ok(())
    }

    /// Revokes a transfer entry. Returns true if it was present.
    pub fn remove_allowed_transfer_ip(&self, ip: &str, prefix: Option<u8>) -> Result<bool> {
        let net = parse_transfer_prefix(ip, prefix)?;
        let mut allowed = self.allowed_transfer.write();
        let before = allowed.len();
        allowed.retain(|n| *n != net);
        Ok(allowed.len() != before)
    }

    /// Returns the allowed transfer networks.
    pub fn allowed_transfer(&self) -> Vec<IpNet> {
        self.allowed_transfer.read().clone()
    }

    /// Returns true if `peer` parses as an address inside an allowed
    /// network. Unparseable input is never allowed.
    pub fn is_transfer_allowed(&self, peer: &str) -> bool {
        peer.trim()
            .parse::<IpAddr>()
            .is_ok_and(|addr| self.is_transfer_allowed_addr(addr))
    }

    /// Returns true if `peer` lies inside an allowed network of the same
    /// address family.
    pub fn is_transfer_allowed_addr(&self, peer: IpAddr) -> bool {
        self.allowed_transfer
            .read()
            .iter()
            .any(|net| net.contains(&peer))
    }
}

/// Parses an allow-list entry into a network with its host bits cleared.
pub fn parse_transfer_prefix(input: &str, prefix: Option<u8>) -> Result<IpNet> {
    let trimmed = input.trim();
    let (addr, embedded) = match trimmed.split_once(|c: char| c == '/' || c == ',') {
        Some((addr, len)) => {
            let len = len.trim().parse::<u8>().map_err(|_| {
                ZoneError::transfer_prefix(input, format!("bad prefix length {:?}", len.trim()))
            })?;
            (addr.trim(), Some(len))
        }
        None => (trimmed, None),
    };

    let addr: IpAddr = addr
        .parse()
        .map_err(|_| ZoneError::transfer_prefix(input, "not an IP address"))?;

    let len = match (embedded, prefix) {
        (Some(a), Some(b)) if a != b => {
            return Err(ZoneError::transfer_prefix(
                input,
                format!("prefix /{a} conflicts with /{b}"),
            ));
        }
        (Some(len), _) | (None, Some(len)) => len,
        (None, None) => match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        },
    };

    IpNet::new(addr, len)
        .map(|net| net.trunc())
        .map_err(|_| ZoneError::transfer_prefix(input, format!("prefix /{len} is too long")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(entries: &[&str]) -> SecondaryRegistry {
        let registry = SecondaryRegistry::new();
        for entry in entries {
            registry.add_allowed_transfer_ip(entry, None).unwrap();
        }
        registry
    }

    #[test]
    fn test_cidr_matching() {
        let reg = registry(&["1.1.1.0/24", "2001:db8::/32"]);
        assert!(reg.is_transfer_allowed("1.1.1.5"));
        assert!(!reg.is_transfer_allowed("2.2.2.2"));
        assert!(reg.is_transfer_allowed("2001:db8::1"));
        assert!(!reg.is_transfer_allowed("2001:db9::1"));
    }

    #[test]
    fn test_garbage_never_matches() {
        let reg = registry(&["0.0.0.0/0", "::/0"]);
        for peer in ["invalid_ip", "1234", "1.1.1.256", "", "::g"] {
            assert!(!reg.is_transfer_allowed(peer), "{peer}");
        }
    }

    #[test]
    fn test_catch_all_per_family() {
        let v4 = registry(&["0.0.0.0/0"]);
        assert!(v4.is_transfer_allowed("203.0.113.9"));
        assert!(!v4.is_transfer_allowed("2001:db8::1"));
        // No IPv4-mapped coercion.
        assert!(!v4.is_transfer_allowed("::ffff:1.2.3.4"));

        let v6 = registry(&["::/0"]);
        assert!(v6.is_transfer_allowed("fe80::1"));
        assert!(!v6.is_transfer_allowed("10.0.0.1"));
    }

    #[test]
    fn test_host_only_default() {
        let reg = registry(&["192.0.2.7"]);
        assert!(reg.is_transfer_allowed("192.0.2.7"));
        assert!(!reg.is_transfer_allowed("192.0.2.8"));
    }

    #[test]
    fn test_prefix_forms() {
        assert_eq!(
            parse_transfer_prefix("10.1.2.3/8", None).unwrap(),
            "10.0.0.0/8".parse::<IpNet>().unwrap()
        );
        assert_eq!(
            parse_transfer_prefix(" 10.1.2.3 , 16 ", None).unwrap(),
            "10.1.0.0/16".parse::<IpNet>().unwrap()
        );
        assert_eq!(
            parse_transfer_prefix("2001:db8::5", Some(64)).unwrap(),
            "2001:db8::/64".parse::<IpNet>().unwrap()
        );
        assert!(parse_transfer_prefix("10.0.0.0/8", Some(8)).is_ok());
    }

    #[test]
    fn test_prefix_errors() {
        for (input, prefix) in [
            ("10.0.0.0/33", None),
            ("2001:db8::/129", None),
            ("10.0.0.0/8", Some(16)),
            ("10.0.0.0/x", None),
            ("host.example", None),
        ] {
            assert!(
                matches!(
                    parse_transfer_prefix(input, prefix),
                    Err(ZoneError::InvalidTransferPrefix { .. })
                ),
                "{input}"
            );
        }
    }

    #[test]
    fn test_remove_allowed() {
        let reg = registry(&["10.0.0.0/8"]);
        assert!(reg.remove_allowed_transfer_ip("10.0.0.0", Some(8)).unwrap());
        assert!(!reg.remove_allowed_transfer_ip("10.0.0.0/8", None).unwrap());
        assert!(!reg.is_transfer_allowed("10.0.0.1"));
    }

    #[test]
    fn test_notify_targets() {
        let reg = SecondaryRegistry::new();
        let target: SocketAddr = "192.0.2.53:53".parse().unwrap();
        assert!(reg.add_notify_target(target));
        assert!(!reg.add_notify_target(target));
        assert_eq!(reg.notify_targets(), vec![target]);
        assert!(reg.remove_notify_target(target));
        assert!(reg.notify_targets().is_empty());
    }
}
