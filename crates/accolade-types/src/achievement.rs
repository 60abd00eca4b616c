//! The immutable achievement definition.
//!
//! Definitions are built through [`AchievementBuilder`], which rejects a
//! zero requirement and a self-referencing parent up front. Cross-definition
//! checks (unknown parents, longer cycles, duplicate ids) need the whole set
//! and are done by the engine's registry.

use serde::Serialize;

use crate::display::Display;
use crate::error::DefinitionError;
use crate::ids::AchievementId;
use crate::progress::clamp_progress;
use crate::visibility::Visibility;

/// Label of the synthetic criterion at `index`: its base-36 rendering.
///
/// Clients track completion per criterion rather than as a raw count, so an
/// achievement with requirement `n` is sent as the `n` criteria
/// `criterion_label(0) .. criterion_label(n - 1)`.
pub fn criterion_label(index: u32) -> String {
    let mut digits = Vec::new();
    let mut rest = index;
    loop {
        if let Some(c) = char::from_digit(rest % 36, 36) {
            digits.push(c);
        }
        rest /= 36;
        if rest == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

/// A milestone definition.
///
/// An achievement with no parent is the root of a category tree. Children
/// are not stored on the parent; the registry derives them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Achievement {
    id: AchievementId,
    parent: Option<AchievementId>,
    display: Display,
    requirement: u32,
    visibility: Visibility,
    default_granted: bool,
}

impl Achievement {
    /// Start building a definition with requirement 1 and `Always` visibility.
    pub const fn builder(id: AchievementId, display: Display) -> AchievementBuilder {
        AchievementBuilder {
            id,
            display,
            parent: None,
            requirement: 1,
            visibility: Visibility::Always,
            default_granted: false,
        }
    }

    /// The unique id.
    pub const fn id(&self) -> &AchievementId {
        &self.id
    }

    /// The parent id, if this is not a root.
    pub const fn parent(&self) -> Option<&AchievementId> {
        self.parent.as_ref()
    }

    /// Presentation metadata.
    pub const fn display(&self) -> &Display {
        &self.display
    }

    /// Number of steps needed to complete; always at least one.
    pub const fn requirement(&self) -> u32 {
        self.requirement
    }

    /// The visibility rule.
    pub const fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Whether the achievement is granted the first time a subject is
    /// fully synchronized.
    pub const fn default_granted(&self) -> bool {
        self.default_granted
    }

    /// Whether `progress` completes this achievement.
    pub const fn is_granted(&self, progress: u32) -> bool {
        progress >= self.requirement
    }

    /// Clamp a raw value into `[0, requirement]`.
    pub fn clamp(&self, value: i64) -> u32 {
        clamp_progress(value, self.requirement)
    }

    /// All synthetic criterion labels, in order.
    pub fn criteria(&self) -> Vec<String> {
        (0..self.requirement).map(criterion_label).collect()
    }

    /// The labels of the first `progress` criteria, which a client shows as
    /// completed.
    pub fn completed_criteria(&self, progress: u32) -> Vec<String> {
        (0..progress.min(self.requirement))
            .map(criterion_label)
            .collect()
    }
}

/// Validating builder for [`Achievement`].
#[derive(Debug)]
pub struct AchievementBuilder {
    id: AchievementId,
    display: Display,
    parent: Option<AchievementId>,
    requirement: u32,
    visibility: Visibility,
    default_granted: bool,
}

impl AchievementBuilder {
    /// Attach the achievement under `parent`.
    #[must_use]
    pub fn parent(mut self, parent: AchievementId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the number of steps needed to complete.
    #[must_use]
    pub const fn requirement(mut self, requirement: u32) -> Self {
        self.requirement = requirement;
        self
    }

    /// Set the visibility rule.
    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Grant automatically on a subject's first full resync.
    #[must_use]
    pub const fn default_granted(mut self, default_granted: bool) -> Self {
        self.default_granted = default_granted;
        self
    }

    /// Validate and produce the definition.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::ZeroRequirement`] if the requirement is
    /// zero, or [`DefinitionError::ParentCycle`] if the achievement is its
    /// own parent.
    pub fn build(self) -> Result<Achievement, DefinitionError> {
        if self.requirement == 0 {
            return Err(DefinitionError::ZeroRequirement { id: self.id });
        }
        if self.parent.as_ref() == Some(&self.id) {
            return Err(DefinitionError::ParentCycle { id: self.id });
        }
        Ok(Achievement {
            id: self.id,
            parent: self.parent,
            display: self.display,
            requirement: self.requirement,
            visibility: self.visibility,
            default_granted: self.default_granted,
        })
    }
}
