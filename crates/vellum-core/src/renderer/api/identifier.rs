// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Name-based identifiers used as registry keys for every GPU object.

use std::fmt;
use uuid::Uuid;

/// The namespace all object names are hashed under.
const OBJECT_NAMESPACE: Uuid = Uuid::from_u128(0x5f2c_9a1e_7d43_4b8a_9e61_3c0d_a8f2_71b4);

/// A stable identifier for a named GPU object.
///
/// The hash is derived deterministically from the name (the first 8 bytes of a
/// name-based UUID), so the same name always produces the same key across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier {
    name: String,
    hash: u64,
}

impl ObjectIdentifier {
    /// Creates the identifier for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let hash = hash_name(&name);
        Self { name, hash }
    }

    /// Builds an identifier with a chosen hash, to force collisions.
    #[cfg(test)]
    pub(crate) fn with_hash(name: impl Into<String>, hash: u64) -> Self {
        Self {
            name: name.into(),
            hash,
        }
    }

    /// The object's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 64-bit registry key derived from the name.
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl From<&str> for ObjectIdentifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ObjectIdentifier {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Hashes an object name into its 64-bit registry key: the first 8 bytes of its
/// version 5 UUID, read big-endian.
pub fn hash_name(name: &str) -> u64 {
    let uuid = Uuid::new_v5(&OBJECT_NAMESPACE, name.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&uuid.as_bytes()[..8]);
    u64::from_be_bytes(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = ObjectIdentifier::new("vertices");
        let b = ObjectIdentifier::from("vertices");
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a, b);
        assert_eq!(hash_name("vertices"), a.hash());
    }

    #[test]
    fn test_distinct_names_have_distinct_hashes() {
        let names = ["vertices", "indices", "uniforms", "vs", "shader", "Vertices", ""];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(hash_name(a), hash_name(b), "'{a}' and '{b}' collided");
            }
        }
    }

    #[test]
    fn test_hash_is_uuid_prefix() {
        let uuid = Uuid::new_v5(&OBJECT_NAMESPACE, b"vertices");
        let (high, _) = uuid.as_u64_pair();
        assert_eq!(hash_name("vertices"), high);
        assert_eq!(&hash_name("vertices").to_be_bytes()[..], &uuid.as_bytes()[..8]);
    }

    #[test]
    fn test_display_is_name() {
        assert_eq!(ObjectIdentifier::new("draw").to_string(), "draw");
    }
}
