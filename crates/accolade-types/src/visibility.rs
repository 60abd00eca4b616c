//! Visibility predicates.
//!
//! A [`Visibility`] decides whether a subject is shown an achievement. The
//! set of predicates is closed: evaluation lives in
//! `accolade_engine::visibility` and matches exhaustively, so adding a
//! variant is a compile-time-checked change everywhere.
//!
//! | Variant | Visible when |
//! |---------|--------------|
//! | `Always` | unconditionally |
//! | `HaveProgress` | stored progress > 0 |
//! | `Granted` | own progress >= requirement |
//! | `ParentGranted` | no parent, or the parent is granted |
//! | `All` | every child predicate holds (true when empty) |
//! | `Any` | some child predicate holds (false when empty) |

use serde::{Deserialize, Serialize};

/// A composable visibility rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum Visibility {
    /// Always visible.
    #[default]
    Always,
    /// Visible once the subject has any progress.
    HaveProgress,
    /// Visible once the achievement itself is granted.
    Granted,
    /// Visible once the parent is granted; roots are always visible.
    ParentGranted,
    /// Visible when every inner rule is visible.
    All(Vec<Visibility>),
    /// Visible when at least one inner rule is visible.
    Any(Vec<Visibility>),
}

impl Visibility {
    /// Conjunction of the given rules.
    pub fn all(rules: impl IntoIterator<Item = Self>) -> Self {
        Self::All(rules.into_iter().collect())
    }

    /// Disjunction of the given rules.
    pub fn any(rules: impl IntoIterator<Item = Self>) -> Self {
        Self::Any(rules.into_iter().collect())
    }

    /// Whether evaluating this rule reads the parent's progress.
    ///
    /// A progress change on an achievement can only alter the visibility of
    /// itself and of children whose rule reads the parent.
    pub fn reads_parent(&self) -> bool {
        match self {
            Self::ParentGranted => true,
            Self::Always | Self::HaveProgress | Self::Granted => false,
            Self::All(rules) | Self::Any(rules) => rules.iter().any(Self::reads_parent),
        }
    }
}
