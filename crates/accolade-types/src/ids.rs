//! Identifier types.
//!
//! Subjects (the players or clients whose progress is tracked) use UUID v7
//! wrappers so they index well in the progress table. Achievements use a
//! two-part namespaced key, `namespace:path`, which is also the address a
//! client uses to refer to an achievement in sync messages.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DefinitionError;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a subject whose progress is tracked.
    SubjectId
}

/// Namespaced achievement key, written `namespace:path`.
///
/// The namespace may contain `[a-z0-9_.-]`; the path may additionally
/// contain `/`. Both parts must be non-empty. Ordering is by namespace, then
/// path, which keeps progress maps grouped per namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AchievementId {
    namespace: String,
    path: String,
}

impl AchievementId {
    /// Build an id from its two parts.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidId`] if either part is empty or
    /// contains a character outside the allowed set.
    pub fn new(namespace: &str, path: &str) -> Result<Self, DefinitionError> {
        if namespace.is_empty() || !namespace.chars().all(is_namespace_char) {
            return Err(DefinitionError::InvalidId {
                id: format!("{namespace}:{path}"),
                reason: "namespace must be non-empty and match [a-z0-9_.-]",
            });
        }
        if path.is_empty() || !path.chars().all(is_path_char) {
            return Err(DefinitionError::InvalidId {
                id: format!("{namespace}:{path}"),
                reason: "path must be non-empty and match [a-z0-9_.-/]",
            });
        }
        Ok(Self {
            namespace: namespace.to_owned(),
            path: path.to_owned(),
        })
    }

    /// The namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The path part.
    pub fn path(&self) -> &str {
        &self.path
    }
}

const fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

const fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl FromStr for AchievementId {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = s.split_once(':').ok_or_else(|| DefinitionError::InvalidId {
            id: s.to_owned(),
            reason: "expected `namespace:path`",
        })?;
        Self::new(namespace, path)
    }
}

impl TryFrom<String> for AchievementId {
    type Error = DefinitionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AchievementId> for String {
    fn from(id: AchievementId) -> Self {
        id.to_string()
    }
}

impl core::fmt::Display for AchievementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}
