//! The example achievement tree.
//!
//! A two-node category: `hello_world` is granted on join and heads the tree
//! with the background texture; `mine_stone` sits to its right and needs
//! ten stones.

use accolade_engine::Registry;
use accolade_types::{Achievement, AchievementId, DefinitionError, Display, Visibility};

/// Namespace of every example achievement.
pub const NAMESPACE: &str = "example";

const BACKGROUND: &str = "minecraft:textures/gui/advancements/backgrounds/adventure.png";

/// Id of the join achievement.
pub fn hello_world() -> Result<AchievementId, DefinitionError> {
    AchievementId::new(NAMESPACE, "hello_world")
}

/// Id of the stone-mining achievement.
pub fn mine_stone() -> Result<AchievementId, DefinitionError> {
    AchievementId::new(NAMESPACE, "mine_stone")
}

/// Build the validated example registry.
pub fn registry() -> Result<Registry, DefinitionError> {
    let root_display = Display::new(
        0.0,
        3.0,
        "minecraft:grass_block",
        "Hello world",
        "Join the server",
    )
    .with_background(BACKGROUND);

    let hello = Achievement::builder(hello_world()?, root_display.clone())
        .default_granted(true)
        .build()?;

    let stone = Achievement::builder(
        mine_stone()?,
        Display::new(
            root_display.x + 1.5,
            root_display.y,
            "minecraft:stone",
            "Mine stone",
            "Mine 10 stones",
        ),
    )
    .parent(hello_world()?)
    .requirement(10)
    .visibility(Visibility::ParentGranted)
    .build()?;

    Registry::from_definitions([hello, stone])
}
