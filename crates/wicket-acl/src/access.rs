// SPDX-License-Identifier: Apache-2.0
//! The declarative access model.
//!
//! An access maps an HTTP method + path pattern (with `*` markers for dynamic
//! segments) to a gateway permission entry. Shadow relations let one access
//! reroute (`shadowing`) or override (`shadowed`) another; they are stored as
//! nullable [`AccessId`] lookup keys rather than object links so two accesses
//! shadowing each other never form an ownership cycle.

use std::collections::BTreeMap;

use wicket_ident::{wildcard_count, AccessHash, AccessId};

use crate::AclError;

/// A stored ACL access.
///
/// `path` and `method` are kept in normalized form (trimmed, edge slashes
/// stripped, method upper-cased) — the same form the id was computed from.
/// `id` and `hash` are assigned once at insert time and never change; a
/// changed definition is a different access.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Access {
    /// Stable identifier derived from `(path, method)`.
    pub id: AccessId,
    /// Normalized path pattern; `*` marks a dynamic segment.
    pub path: String,
    /// Normalized (upper-case) HTTP method name.
    pub method: String,
    /// Gateway construction priority.
    pub priority: i32,
    /// Digest of the full definition, used for change detection.
    pub hash: AccessHash,
    /// Access this one reroutes to, if any.
    pub shadowing: Option<AccessId>,
    /// Access this one overrides, if any.
    pub shadowed: Option<AccessId>,
}

/// A full access definition, as submitted for insertion.
///
/// The positional maps are keyed by the 1-based ordinal of a `*` segment in
/// `path`. `BTreeMap` keeps every map in its canonical digest order (integer
/// ascending for positions, lexicographic for property names) by
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessCreate {
    /// Path pattern; `*` marks a dynamic segment.
    pub path: String,
    /// HTTP method name.
    pub method: String,
    /// Gateway construction priority.
    pub priority: i32,
    /// Access this definition reroutes to, if any.
    pub shadowing: Option<AccessId>,
    /// Access this definition overrides, if any.
    pub shadowed: Option<AccessId>,
    /// Wildcard position → type name. Plain accesses only.
    pub types: BTreeMap<u32, String>,
    /// Local wildcard position → position in the shadowing access.
    pub types_shadowing: BTreeMap<u32, u32>,
    /// Local wildcard position → position in the shadowed access.
    pub types_shadowed: BTreeMap<u32, u32>,
    /// Property name → type name.
    pub properties: BTreeMap<String, String>,
}

impl AccessCreate {
    /// Start an empty definition for `path` and `method`.
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    /// Check the definition's type maps against the path's wildcards.
    ///
    /// A plain access must type every wildcard itself: `types` keys exactly
    /// `1..=n`, shadow maps empty. A shadow access (one with `shadowing`
    /// set) takes its types from the accesses it relates to: `types` empty,
    /// and each of `1..=n` assigned to exactly one of `types_shadowing` /
    /// `types_shadowed`.
    ///
    /// # Errors
    ///
    /// Returns the first [`AclError`] violation found; see the variant docs.
    pub fn validate(&self) -> Result<(), AclError> {
        let wildcards = wildcard_count(&self.path);
        let position_keys = self
            .types
            .keys()
            .chain(self.types_shadowing.keys())
            .chain(self.types_shadowed.keys());
        for &position in position_keys {
            if position == 0 {
                return Err(AclError::InvalidPosition {
                    path: self.path.clone(),
                });
            }
        }

        if self.shadowing.is_none() {
            if !self.types_shadowing.is_empty() || !self.types_shadowed.is_empty() {
                return Err(AclError::UnexpectedShadowMap {
                    path: self.path.clone(),
                });
            }
            if !covers_exactly(self.types.keys().copied(), wildcards) {
                return Err(AclError::TypeMapMismatch {
                    path: self.path.clone(),
                    wildcards,
                });
            }
            return Ok(());
        }

        if !self.types.is_empty() {
            return Err(AclError::UnexpectedTypeMap {
                path: self.path.clone(),
            });
        }
        if !self.types_shadowed.is_empty() && self.shadowed.is_none() {
            return Err(AclError::UnexpectedShadowMap {
                path: self.path.clone(),
            });
        }
        let disjoint = self
            .types_shadowing
            .keys()
            .all(|position| !self.types_shadowed.contains_key(position));
        let combined = self
            .types_shadowing
            .keys()
            .chain(self.types_shadowed.keys())
            .copied();
        if !disjoint || !covers_exactly(combined, wildcards) {
            return Err(AclError::ShadowMapMismatch {
                path: self.path.clone(),
                wildcards,
            });
        }
        Ok(())
    }
}

/// True when `keys` is exactly the set `{1..=n}`.
///
/// Keys are assumed distinct (they come from map key iterators) but not
/// assumed sorted, since the shadow check chains two maps.
fn covers_exactly(keys: impl Iterator<Item = u32>, n: usize) -> bool {
    let mut seen = vec![false; n];
    let mut count = 0usize;
    for key in keys {
        let Some(slot) = usize::try_from(key)
            .ok()
            .and_then(|key| key.checked_sub(1))
            .and_then(|index| seen.get_mut(index))
        else {
            return false;
        };
        if *slot {
            return false;
        }
        *slot = true;
        count += 1;
    }
    count == n
}

/// One dynamic (`*`) path element of a stored access.
///
/// For a shadow access the entry also records which position of the related
/// access it maps onto; values arriving at a `shadowed` position are not
/// consumed by this access's own request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    /// 1-based ordinal of the `*` segment in the access path.
    pub position: u32,
    /// Type name bound to the segment.
    pub type_name: String,
    /// Position in the shadowing access this entry maps onto.
    pub shadowing: Option<u32>,
    /// Position in the shadowed access this entry maps onto.
    pub shadowed: Option<u32>,
}

/// A named input property of a stored access.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Type name bound to the property.
    pub type_name: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn plain(path: &str, types: &[(u32, &str)]) -> AccessCreate {
        let mut create = AccessCreate::new(path, "GET");
        create.types = types
            .iter()
            .map(|&(position, name)| (position, name.to_owned()))
            .collect();
        create
    }

    // ── 1. plain access with matching types validates ───────────────────

    #[test]
    fn plain_access_matching_types() {
        assert!(plain("resources/*", &[(1, "Id")]).validate().is_ok());
        assert!(plain("Security/Login", &[]).validate().is_ok());
    }

    // ── 2. missing / extra / misnumbered types rejected ─────────────────

    #[test]
    fn plain_access_type_mismatch() {
        let missing = plain("a/*/b/*", &[(1, "Id")]);
        let extra = plain("a/*", &[(1, "Id"), (2, "Name")]);
        let skipped = plain("a/*/b/*", &[(1, "Id"), (3, "Name")]);
        for bad in [missing, extra, skipped] {
            assert!(matches!(
                bad.validate(),
                Err(AclError::TypeMapMismatch { wildcards: 2, .. })
                    | Err(AclError::TypeMapMismatch { wildcards: 1, .. })
            ));
        }
    }

    // ── 3. position 0 always rejected ───────────────────────────────────

    #[test]
    fn position_zero_rejected() {
        let bad = plain("a/*", &[(0, "Id")]);
        assert!(matches!(
            bad.validate(),
            Err(AclError::InvalidPosition { .. })
        ));
    }

    // ── 4. shadow maps on a plain access rejected ───────────────────────

    #[test]
    fn shadow_maps_need_shadowing_reference() {
        let mut bad = plain("a/*", &[]);
        bad.types_shadowing.insert(1, 1);
        assert!(matches!(
            bad.validate(),
            Err(AclError::UnexpectedShadowMap { .. })
        ));
    }

    // ── 5. shadow access splits positions between the two maps ──────────

    #[test]
    fn shadow_access_split_positions() {
        let mut create = AccessCreate::new("HR/User/*/Avatar/*", "GET");
        create.shadowing = Some(crate::AccessId(7));
        create.shadowed = Some(crate::AccessId(8));
        create.types_shadowing.insert(1, 1);
        create.types_shadowed.insert(2, 1);
        assert!(create.validate().is_ok());

        // Same position claimed by both maps.
        create.types_shadowed.insert(1, 2);
        assert!(matches!(
            create.validate(),
            Err(AclError::ShadowMapMismatch { wildcards: 2, .. })
        ));
    }

    // ── 6. shadow access with its own types rejected ────────────────────

    #[test]
    fn shadow_access_rejects_own_types() {
        let mut create = plain("a/*", &[(1, "Id")]);
        create.shadowing = Some(crate::AccessId(7));
        assert!(matches!(
            create.validate(),
            Err(AclError::UnexpectedTypeMap { .. })
        ));
    }

    // ── 7. wildcards counted on the normalized path ─────────────────────

    #[test]
    fn validation_uses_normalized_path() {
        // Edge slashes don't hide the wildcard.
        assert!(plain("/resources/*/", &[(1, "Id")]).validate().is_ok());
    }
}
