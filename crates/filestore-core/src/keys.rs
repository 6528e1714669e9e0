//! Storage key-namespace policy.
//!
//! Every object key is scoped to its owning identity:
//! `attachments/files/{identity}/{uuid}.{ext}`. The prefix is the sole
//! access-control boundary at the storage layer, so both generation and
//! validation live here and nowhere else.

use uuid::Uuid;

const KEY_PREFIX: &str = "attachments/files";

/// Generate a fresh storage key under the identity's namespace.
pub fn generate_file_key(identity: &str, extension: &str) -> String {
    format!("{}/{}/{}.{}", KEY_PREFIX, identity, Uuid::new_v4(), extension)
}

/// The namespace prefix all of an identity's keys must carry.
pub fn owner_prefix(identity: &str) -> String {
    format!("{}/{}/", KEY_PREFIX, identity)
}

/// Whether `file_key` lies inside the identity's namespace.
pub fn is_owned_by(file_key: &str, identity: &str) -> bool {
    file_key.starts_with(&owner_prefix(identity))
}

/// Extension of a filename, if it has one. `"a.tar.gz"` yields `"gz"`,
/// matching the upload allow-list convention.
pub fn extension_of(filename: &str) -> Option<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_is_namespaced_and_unique() {
        let key = generate_file_key("u1", "jpg");
        assert!(key.starts_with("attachments/files/u1/"));
        assert!(key.ends_with(".jpg"));
        assert_ne!(key, generate_file_key("u1", "jpg"));

        let uuid_part = key
            .strip_prefix("attachments/files/u1/")
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .unwrap();
        assert!(Uuid::parse_str(uuid_part).is_ok());
    }

    #[test]
    fn ownership_check_rejects_other_namespaces() {
        let key = generate_file_key("u1", "png");
        assert!(is_owned_by(&key, "u1"));
        assert!(!is_owned_by(&key, "u2"));
        assert!(!is_owned_by("attachments/files/u12/x.png", "u1"));
        assert!(!is_owned_by("other/prefix/u1/x.png", "u1"));
    }

    #[test]
    fn extension_extraction() {
        assert_eq!(extension_of("photo.jpg"), Some("jpg"));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
        assert_eq!(extension_of("no_extension"), None);
        assert_eq!(extension_of("trailing."), None);
    }
}
