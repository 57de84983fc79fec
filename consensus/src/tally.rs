//! Per-resolution vote tally.
//!
//! Votes are keyed by the canonical form of the address, so an IPv4-mapped
//! IPv6 answer (`::ffff:1.2.3.4`) counts towards the same candidate as the
//! plain IPv4 answer. The map is ordered, which makes the winner a pure
//! function of the accumulated weights: ties go to the lowest address.

use std::collections::BTreeMap;
use std::net::IpAddr;

#[derive(Debug, Default, Clone)]
pub struct VoteTally {
    /// canonical address → accumulated weight.
    votes: BTreeMap<IpAddr, u64>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to the candidate `ip`.
    pub fn add(&mut self, ip: IpAddr, weight: u32) {
        let entry = self.votes.entry(ip.to_canonical()).or_insert(0);
        *entry = entry.saturating_add(u64::from(weight));
    }

    /// Accumulated weight for `ip`. Returns 0 if it received no votes.
    pub fn weight(&self, ip: &IpAddr) -> u64 {
        self.votes.get(&ip.to_canonical()).copied().unwrap_or(0)
    }

    /// Number of distinct candidates.
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// The candidate with the greatest weight, with that weight.
    pub fn winner(&self) -> Option<(IpAddr, u64)> {
        let mut best: Option<(IpAddr, u64)> = None;
        for (&ip, &weight) in &self.votes {
            match best {
                Some((_, max)) if weight <= max => {}
                _ => best = Some((ip, weight)),
            }
        }
        best
    }
}
