// SPDX-License-Identifier: Apache-2.0
//! In-memory access table.
//!
//! [`AccessTable`] is the arena that assigns ids/hashes at insert time and
//! serves the lookup surface gateway generation reads from. Accesses are
//! keyed by [`AccessId`] in a `BTreeMap`, so every iteration order exposed
//! here is id-ascending and deterministic.
//!
//! # Absence Semantics
//!
//! `get`/`entry`/`property` return `None` for missing rows — absence is not
//! an error. Error variants are reserved for definitions the table refuses
//! to store.

use std::collections::BTreeMap;

use tracing::debug;

use wicket_ident::{access_id, normalize_method, normalize_path};

use crate::{access_hash, Access, AccessCreate, AccessId, AclError, Entry, Property};

/// An access plus the rows derived from its definition at insert time.
#[derive(Debug, Clone)]
struct StoredAccess {
    access: Access,
    entries: Vec<Entry>,
    properties: Vec<Property>,
}

/// Query over the stored accesses.
///
/// `path_like` uses `%` as a multi-character wildcard; `method` matches
/// exactly after normalization. Empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessQuery {
    /// Pattern the normalized path must match; `%` matches any run of
    /// characters.
    pub path_like: Option<String>,
    /// Method the access must have, compared after normalization.
    pub method: Option<String>,
}

/// In-memory arena of ACL accesses keyed by id.
///
/// The table owns id and hash assignment: [`insert`](Self::insert) validates
/// the definition, derives both values, resolves shadow references against
/// accesses already stored, and materializes the [`Entry`]/[`Property`] rows.
/// Stored accesses are immutable; re-inserting an identical definition is
/// idempotent and a same-id different-hash insert is refused.
#[derive(Debug, Clone, Default)]
pub struct AccessTable {
    accesses: BTreeMap<AccessId, StoredAccess>,
}

impl AccessTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accesses stored.
    pub fn len(&self) -> usize {
        self.accesses.len()
    }

    /// Returns `true` if no accesses are stored.
    pub fn is_empty(&self) -> bool {
        self.accesses.is_empty()
    }

    /// Insert an access definition, returning its assigned id.
    ///
    /// Shadow references must already be present in the table. Re-insert of
    /// a byte-identical definition returns the existing id.
    ///
    /// # Errors
    ///
    /// Any [`AclError`] from [`AccessCreate::validate`], plus
    /// [`AclError::UnknownShadow`] / [`AclError::UnknownShadowPosition`] for
    /// dangling shadow references and [`AclError::DefinitionConflict`] when
    /// the id is already bound to a different definition hash.
    pub fn insert(&mut self, create: AccessCreate) -> Result<AccessId, AclError> {
        create.validate()?;
        let id = access_id(&create.path, &create.method);
        let hash = access_hash(&create);

        if let Some(stored) = self.accesses.get(&id) {
            if stored.access.hash == hash {
                debug!(%id, "identical definition re-inserted; idempotent");
                return Ok(id);
            }
            return Err(AclError::DefinitionConflict {
                id,
                existing: stored.access.hash,
                incoming: hash,
            });
        }

        for shadow in [create.shadowing, create.shadowed].into_iter().flatten() {
            if !self.accesses.contains_key(&shadow) {
                return Err(AclError::UnknownShadow { access: id, shadow });
            }
        }

        let entries = self.build_entries(id, &create)?;
        let properties = create
            .properties
            .iter()
            .map(|(name, type_name)| Property {
                name: name.clone(),
                type_name: type_name.clone(),
            })
            .collect();

        let access = Access {
            id,
            path: normalize_path(&create.path).to_owned(),
            method: normalize_method(&create.method),
            priority: create.priority,
            hash,
            shadowing: create.shadowing,
            shadowed: create.shadowed,
        };
        debug!(%id, hash = %access.hash, path = %access.path, "access inserted");
        self.accesses.insert(
            id,
            StoredAccess {
                access,
                entries,
                properties,
            },
        );
        Ok(id)
    }

    /// Materialize the [`Entry`] rows for a validated definition.
    ///
    /// Plain accesses type their own wildcards; shadow accesses borrow the
    /// type of the referenced access's entry at the mapped position.
    fn build_entries(
        &self,
        id: AccessId,
        create: &AccessCreate,
    ) -> Result<Vec<Entry>, AclError> {
        if create.shadowing.is_none() {
            return Ok(create
                .types
                .iter()
                .map(|(&position, type_name)| Entry {
                    position,
                    type_name: type_name.clone(),
                    shadowing: None,
                    shadowed: None,
                })
                .collect());
        }

        let mut entries =
            Vec::with_capacity(create.types_shadowing.len() + create.types_shadowed.len());
        if let Some(shadow) = create.shadowing {
            for (&position, &target) in &create.types_shadowing {
                entries.push(Entry {
                    position,
                    type_name: self.entry_type(id, shadow, target)?,
                    shadowing: Some(target),
                    shadowed: None,
                });
            }
        }
        if let Some(shadow) = create.shadowed {
            for (&position, &target) in &create.types_shadowed {
                entries.push(Entry {
                    position,
                    type_name: self.entry_type(id, shadow, target)?,
                    shadowing: None,
                    shadowed: Some(target),
                });
            }
        }
        entries.sort_by_key(|entry| entry.position);
        Ok(entries)
    }

    /// Type name of `shadow`'s entry at `position`.
    fn entry_type(
        &self,
        access: AccessId,
        shadow: AccessId,
        position: u32,
    ) -> Result<String, AclError> {
        self.accesses
            .get(&shadow)
            .and_then(|stored| stored.entries.iter().find(|entry| entry.position == position))
            .map(|entry| entry.type_name.clone())
            .ok_or(AclError::UnknownShadowPosition {
                access,
                shadow,
                position,
            })
    }

    /// Look up an access by id. Absence is not an error.
    pub fn get(&self, id: AccessId) -> Option<&Access> {
        self.accesses.get(&id).map(|stored| &stored.access)
    }

    /// Delete the access with the given id.
    ///
    /// Returns `true` if an access was removed. Callers tear shadows down
    /// before the accesses they reference.
    pub fn delete(&mut self, id: AccessId) -> bool {
        let removed = self.accesses.remove(&id).is_some();
        if removed {
            debug!(%id, "access deleted");
        }
        removed
    }

    /// The dynamic path entries of an access, position-ascending.
    pub fn entries(&self, id: AccessId) -> Option<&[Entry]> {
        self.accesses.get(&id).map(|stored| stored.entries.as_slice())
    }

    /// The dynamic path entry of an access at `position`.
    pub fn entry(&self, id: AccessId, position: u32) -> Option<&Entry> {
        self.entries(id)?
            .iter()
            .find(|entry| entry.position == position)
    }

    /// The input properties of an access, name-ascending.
    pub fn properties(&self, id: AccessId) -> Option<&[Property]> {
        self.accesses
            .get(&id)
            .map(|stored| stored.properties.as_slice())
    }

    /// The input property of an access named `name`.
    pub fn property(&self, id: AccessId, name: &str) -> Option<&Property> {
        self.properties(id)?
            .iter()
            .find(|property| property.name == name)
    }

    /// All stored accesses, id-ascending.
    pub fn iter(&self) -> impl Iterator<Item = &Access> {
        self.accesses.values().map(|stored| &stored.access)
    }

    /// Accesses matching `query`, id-ascending.
    pub fn query<'a>(&'a self, query: &'a AccessQuery) -> impl Iterator<Item = &'a Access> + 'a {
        let method = query.method.as_deref().map(normalize_method);
        self.iter().filter(move |access| {
            if let Some(pattern) = query.path_like.as_deref() {
                if !like_match(pattern, &access.path) {
                    return false;
                }
            }
            method
                .as_deref()
                .is_none_or(|method| access.method == method)
        })
    }
}

/// SQL-style `LIKE` match with `%` as the only wildcard.
///
/// Greedy left-to-right: the first segment anchors the prefix, the last the
/// suffix, middle segments match in order between them.
fn like_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('%') {
        return pattern == text;
    }
    let segments: Vec<&str> = pattern.split('%').collect();
    let (first, last) = (segments[0], segments[segments.len() - 1]);
    if !text.starts_with(first) || !text.ends_with(last) {
        return false;
    }
    let mut cursor = first.len();
    for segment in &segments[1..segments.len() - 1] {
        if segment.is_empty() {
            continue;
        }
        match text[cursor..].find(segment) {
            Some(offset) => cursor += offset + segment.len(),
            None => return false,
        }
    }
    text.len() >= cursor + last.len()
}
