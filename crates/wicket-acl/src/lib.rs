// SPDX-License-Identifier: Apache-2.0
//! ACL access model and definition digests for Wicket.
//!
//! `wicket-acl` owns the declarative access model — an HTTP method + path
//! pattern, optional shadow relations, positional wildcard type maps, and
//! named input properties — together with the two derived values gateway
//! generation runs on: the stable [`AccessId`] and the [`AccessHash`]
//! definition digest. [`AccessTable`] is the in-memory arena that assigns
//! both at insert time and serves lookups.
//!
//! # Digest Policy
//!
//! [`access_hash`] fingerprints the *entire* definition: id, shadow
//! references, wildcard type maps, and properties. Map contributions are fed
//! in sorted key order (integer ascending for positions, lexicographic for
//! property names), so the digest is independent of the order a caller
//! assembled the maps in, while any single differing field changes it. Two
//! equal digests mean "nothing to redeploy"; downstream consumers never do a
//! deep structural comparison.
//!
//! # Immutability Invariant
//!
//! An access is never mutated in place. A changed definition is a new access
//! with a new id/hash; [`AccessTable::insert`] treats a same-id re-insert
//! with an identical hash as idempotent and a same-id different-hash insert
//! as a [`AclError::DefinitionConflict`].
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::trivially_copy_pass_by_ref
)]

mod access;
mod digest;
mod table;

pub use access::{Access, AccessCreate, Entry, Property};
pub use digest::access_hash;
pub use table::{AccessQuery, AccessTable};
pub use wicket_ident::{access_id, wildcard_count, AccessHash, AccessId};

/// Errors surfaced by access validation and table operations.
///
/// All variants are caller errors, fatal to the single call and never
/// retried. Hashing itself is total over well-formed input — empty maps and
/// absent shadow references are valid definitions, not errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AclError {
    /// A positional type map carried the key 0; positions are 1-based.
    #[error("[ACL_POSITION_INVALID] position 0 in a type map for path {path:?}; positions are 1-based")]
    InvalidPosition {
        /// Path of the offending access definition.
        path: String,
    },

    /// A plain access's `types` keys do not cover the path's wildcards
    /// exactly.
    #[error("[ACL_TYPE_MAP_MISMATCH] path {path:?} has {wildcards} wildcard(s) but `types` does not cover positions 1..={wildcards} exactly")]
    TypeMapMismatch {
        /// Path of the offending access definition.
        path: String,
        /// Number of `*` segments in the normalized path.
        wildcards: usize,
    },

    /// A shadow type map was supplied without the matching shadow reference.
    #[error("[ACL_SHADOW_MAP_UNEXPECTED] path {path:?} carries shadow type maps without a matching shadow reference")]
    UnexpectedShadowMap {
        /// Path of the offending access definition.
        path: String,
    },

    /// A shadow access carried its own `types` entries.
    #[error("[ACL_TYPE_MAP_UNEXPECTED] shadow access path {path:?} must take its types from the shadowed access, not `types`")]
    UnexpectedTypeMap {
        /// Path of the offending access definition.
        path: String,
    },

    /// A shadow access's position maps do not split the path's wildcards
    /// exactly between `types_shadowing` and `types_shadowed`.
    #[error("[ACL_SHADOW_MAP_MISMATCH] shadow access path {path:?} must assign each of positions 1..={wildcards} to exactly one of `types_shadowing`/`types_shadowed`")]
    ShadowMapMismatch {
        /// Path of the offending access definition.
        path: String,
        /// Number of `*` segments in the normalized path.
        wildcards: usize,
    },

    /// A shadow reference points at an id absent from the table.
    #[error("[ACL_UNKNOWN_SHADOW] access {access} references shadow {shadow} which is not in the table")]
    UnknownShadow {
        /// Id computed for the access being inserted.
        access: AccessId,
        /// The dangling shadow reference.
        shadow: AccessId,
    },

    /// A shadow access maps a position onto an entry the referenced access
    /// does not have.
    #[error("[ACL_SHADOW_POSITION_UNKNOWN] access {access}: shadow {shadow} has no entry at position {position}")]
    UnknownShadowPosition {
        /// Id computed for the access being inserted.
        access: AccessId,
        /// The referenced shadow access.
        shadow: AccessId,
        /// The missing position in the referenced access.
        position: u32,
    },

    /// Same id, different definition hash: a CRC-32 id collision or a caller
    /// attempting an in-place redefinition.
    #[error("[ACL_DEFINITION_CONFLICT] id {id} already bound to hash {existing}, refusing {incoming}")]
    DefinitionConflict {
        /// The contested access id.
        id: AccessId,
        /// Hash of the definition already stored.
        existing: AccessHash,
        /// Hash of the definition being inserted.
        incoming: AccessHash,
    },
}
