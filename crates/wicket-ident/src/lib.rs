// SPDX-License-Identifier: Apache-2.0
//! Deterministic ACL access identifiers for Wicket.
//!
//! `wicket-ident` provides the two identity primitives every other Wicket
//! layer builds on: [`AccessId`], a 32-bit identifier derived from an access
//! path + HTTP method pair, and [`AccessHash`], the 128-bit definition digest
//! used for change detection by gateway-table generation.
//!
//! # Identity Policy
//!
//! An access is semantically identified by its `(path, method)` pair after
//! normalization; [`access_id`] maps that pair to a stable `u32` via two
//! chained CRC-32 passes (path first, method second, the second pass seeded
//! with the first checksum). The id is a lookup key, not a security token —
//! CRC-32 collisions are possible and acceptable. Callers that need to detect
//! a *changed definition* compare [`AccessHash`] values instead.
//!
//! # Determinism Invariant
//!
//! Normalization is total and deterministic: methods are trimmed and ASCII
//! upper-cased, paths are trimmed and stripped of leading/trailing `/`.
//! `access_id(" /a/b/ ", " get ")` and `access_id("a/b", "GET")` are the same
//! identifier. The digest byte sequences fed downstream use the decimal
//! rendering of the id, so [`AccessId`]'s `Display` is part of the wire
//! contract and must never change.
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

use crc32fast::Hasher;

/// Stable 32-bit identifier for an ACL access.
///
/// Derived from the normalized `(path, method)` pair by [`access_id`]; using
/// a dedicated wrapper prevents accidental mixing with priorities, positions,
/// and other bare integers in the model. The `Display` impl renders the
/// decimal form — the exact byte sequence the definition digest consumes.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessId(pub u32);

impl AccessId {
    /// Returns the raw 32-bit value of this id.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for AccessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 128-bit access definition digest.
///
/// Thin newtype over `[u8; 16]` following the `AccessId` pattern. The inner
/// bytes are public for zero-cost access; the `Display` impl renders 32
/// uppercase hex characters — the storage/comparison format used by gateway
/// generators. A digest fingerprints a definition for change detection; it
/// carries no security claim.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessHash(pub [u8; 16]);

impl AccessHash {
    /// View the digest as a byte slice.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl std::fmt::Display for AccessHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Normalize an HTTP method name: trim surrounding whitespace, ASCII
/// uppercase.
pub fn normalize_method(method: &str) -> String {
    method.trim().to_ascii_uppercase()
}

/// Normalize an access path: trim surrounding whitespace, then strip all
/// leading and trailing `/` characters. Interior slashes are preserved.
pub fn normalize_path(path: &str) -> &str {
    path.trim().trim_matches('/')
}

/// Compute the stable identifier for a `(path, method)` pair.
///
/// Two chained CRC-32 passes: the normalized path bytes first (seed 0), then
/// the normalized method bytes seeded with the running checksum. Streaming
/// both through one [`Hasher`] is exactly that chaining.
///
/// Identical pairs modulo normalization always yield the same id;
/// cross-implementation fixtures are frozen in the test suite.
pub fn access_id(path: &str, method: &str) -> AccessId {
    let mut hasher = Hasher::new();
    hasher.update(normalize_path(path).as_bytes());
    hasher.update(normalize_method(method).as_bytes());
    AccessId(hasher.finalize())
}

/// Number of dynamic (`*`) segments in an access path.
///
/// Counts `*` occurrences in the normalized path; positions reported
/// elsewhere in the model are 1-based in order of occurrence.
pub fn wildcard_count(path: &str) -> usize {
    normalize_path(path).bytes().filter(|&b| b == b'*').count()
}
