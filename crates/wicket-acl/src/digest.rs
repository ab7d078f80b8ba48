// SPDX-License-Identifier: Apache-2.0
//! The access definition digest.
//!
//! MD5 is mandated here for byte-compatibility with the digests already
//! stored by deployed gateway tables — this is a change-detection
//! fingerprint, not a security boundary. The feed order below is the wire
//! contract; reordering any contribution changes every stored hash.

use md5::{Digest, Md5};

use wicket_ident::{access_id, AccessHash};

use crate::AccessCreate;

/// Compute the definition digest of an access.
///
/// Feeds the accumulator, in this exact order:
/// 1. the decimal rendering of [`access_id`]`(path, method)`;
/// 2. the decimal shadowing id, if set;
/// 3. the decimal shadowed id, if set;
/// 4. `"{position}:{type}"` for each `types` entry, position ascending;
/// 5. `"{position}:{target}"` for each `types_shadowing` entry, likewise;
/// 6. `"{position}:{target}"` for each `types_shadowed` entry, likewise;
/// 7. `"{name}:{type}"` for each `properties` entry, name ascending.
///
/// Empty maps contribute nothing, so a definition with all maps empty hashes
/// identically to one where the fields were never supplied. The `BTreeMap`
/// fields iterate in sorted key order, which makes the digest independent of
/// the order the caller assembled the maps in.
pub fn access_hash(access: &AccessCreate) -> AccessHash {
    let mut digest = Md5::new();
    digest.update(access_id(&access.path, &access.method).to_string().as_bytes());
    if let Some(shadowing) = access.shadowing {
        digest.update(shadowing.to_string().as_bytes());
    }
    if let Some(shadowed) = access.shadowed {
        digest.update(shadowed.to_string().as_bytes());
    }
    for (position, type_name) in &access.types {
        digest.update(format!("{position}:{type_name}").as_bytes());
    }
    for (position, target) in &access.types_shadowing {
        digest.update(format!("{position}:{target}").as_bytes());
    }
    for (position, target) in &access.types_shadowed {
        digest.update(format!("{position}:{target}").as_bytes());
    }
    for (name, type_name) in &access.properties {
        digest.update(format!("{name}:{type_name}").as_bytes());
    }
    AccessHash(digest.finalize().into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::AccessId;

    // ── 1. frozen fixture: single typed wildcard ────────────────────────

    #[test]
    fn frozen_fixture_typed_wildcard() {
        // Reference values computed once from the original implementation.
        let mut create = AccessCreate::new("/resources/*", "GET");
        create.types.insert(1, "Id".to_owned());
        assert_eq!(access_id(&create.path, &create.method), AccessId(2234780165));
        assert_eq!(
            access_hash(&create).to_string(),
            "8DDA946EE7807159C0F712F87F96772B"
        );
    }

    // ── 2. frozen fixture: shadow access ────────────────────────────────

    #[test]
    fn frozen_fixture_shadow_access() {
        let mut create = AccessCreate::new("HR/User/*/Avatar", "GET");
        create.shadowing = Some(AccessId(12345));
        create.types.insert(1, "Name".to_owned());
        create.types_shadowing.insert(1, 1);
        assert_eq!(access_id(&create.path, &create.method), AccessId(3478142058));
        assert_eq!(
            access_hash(&create).to_string(),
            "24CD2861C6EFB3CE4F59D0442B4D6D85"
        );
    }

    // ── 3. frozen fixture: bare definition ──────────────────────────────

    #[test]
    fn frozen_fixture_bare_definition() {
        let create = AccessCreate::new("Security/Login", "POST");
        assert_eq!(access_id(&create.path, &create.method), AccessId(510003341));
        assert_eq!(
            access_hash(&create).to_string(),
            "3F68D40C274152524E4949696F2A0FB0"
        );
    }

    // ── 4. frozen fixture: properties sorted by name ────────────────────

    #[test]
    fn frozen_fixture_properties() {
        let mut create = AccessCreate::new("Resources", "OPTIONS");
        create.properties.insert("b".to_owned(), "Int".to_owned());
        create.properties.insert("a".to_owned(), "Str".to_owned());
        assert_eq!(access_id(&create.path, &create.method), AccessId(188149521));
        assert_eq!(
            access_hash(&create).to_string(),
            "C13FE89E1F6AE97A2DC5659C6D71B40F"
        );
    }

    // ── 5. frozen fixture: two typed wildcards ──────────────────────────

    #[test]
    fn frozen_fixture_two_wildcards() {
        let mut create = AccessCreate::new("resources/*", "GET");
        create.types.insert(2, "Name".to_owned());
        create.types.insert(1, "Id".to_owned());
        assert_eq!(
            access_hash(&create).to_string(),
            "99E709EE8FF3A3EB305DE89D08E40E01"
        );
    }

    // ── 6. insertion order does not matter ──────────────────────────────

    #[test]
    fn map_insertion_order_irrelevant() {
        let mut forward = AccessCreate::new("a/*/b/*", "GET");
        forward.types.insert(1, "Id".to_owned());
        forward.types.insert(2, "Name".to_owned());
        let mut reverse = AccessCreate::new("a/*/b/*", "GET");
        reverse.types.insert(2, "Name".to_owned());
        reverse.types.insert(1, "Id".to_owned());
        assert_eq!(access_hash(&forward), access_hash(&reverse));
    }

    // ── 7. empty maps contribute nothing ────────────────────────────────

    #[test]
    fn empty_maps_match_absent_fields() {
        let bare = AccessCreate::new("x/y", "GET");
        let mut explicit = AccessCreate::new("x/y", "GET");
        explicit.types.clear();
        explicit.properties.clear();
        assert_eq!(access_hash(&bare), access_hash(&explicit));
    }

    // ── 8. every field is hash-sensitive ────────────────────────────────

    #[test]
    fn single_field_changes_hash() {
        let mut base = AccessCreate::new("resources/*", "GET");
        base.types.insert(1, "Id".to_owned());
        let reference = access_hash(&base);

        let mut other_path = base.clone();
        other_path.path = "resources/*/sub".to_owned();
        let mut other_method = base.clone();
        other_method.method = "DELETE".to_owned();
        let mut other_shadowing = base.clone();
        other_shadowing.shadowing = Some(AccessId(1));
        let mut other_shadowed = base.clone();
        other_shadowed.shadowed = Some(AccessId(1));
        let mut other_type = base.clone();
        other_type.types.insert(1, "Name".to_owned());
        let mut other_property = base.clone();
        other_property
            .properties
            .insert("q".to_owned(), "Str".to_owned());

        for changed in [
            other_path,
            other_method,
            other_shadowing,
            other_shadowed,
            other_type,
            other_property,
        ] {
            assert_ne!(access_hash(&changed), reference);
        }
    }

    // ── 9. priority is not part of the digest ───────────────────────────

    #[test]
    fn priority_not_hashed() {
        let mut low = AccessCreate::new("resources", "GET");
        low.priority = 0;
        let mut high = AccessCreate::new("resources", "GET");
        high.priority = 100;
        assert_eq!(access_hash(&low), access_hash(&high));
    }
}
