//! Sticky backend selection.
//!
//! Maps a client identity onto one member of a live set snapshot with
//! `fnv1a_32(identity) % live.len()`.
//!
//! # Known limitation
//! Stickiness holds only while the live set keeps the same members in the
//! same order. When a backend joins or leaves, `N` changes and most clients
//! are remapped. This is inherent to hash-mod-N routing; fixing it needs a
//! consistent-hashing ring, not a patch here.

use std::sync::Arc;

use crate::load_balancer::backend::Backend;
use crate::load_balancer::live_set::LiveSet;
use crate::routing::identity::ClientIdentity;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over raw bytes.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Outcome of selecting a backend for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    Backend(Arc<Backend>),
    /// The live set was empty.
    Unavailable,
}

impl RoutingDecision {
    pub fn backend(&self) -> Option<&Arc<Backend>> {
        match self {
            RoutingDecision::Backend(backend) => Some(backend),
            RoutingDecision::Unavailable => None,
        }
    }
}

/// Pick the backend for `identity` from one live set snapshot.
pub fn select(identity: &ClientIdentity, live: &LiveSet) -> RoutingDecision {
    let members = live.members();
    if members.is_empty() {
        return RoutingDecision::Unavailable;
    }

    let index = fnv1a_32(identity.as_bytes()) as usize % members.len();
    RoutingDecision::Backend(members[index].clone())
}
