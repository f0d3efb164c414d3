//! Identity and world-facing value types for creatures.

use std::fmt;

/// Creature categories known to the stacker.
///
/// The set mirrors the entity types the settings catalog ships with. Anything
/// the host simulation knows about but the stacker does not is simply never
/// registered.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityKind {
    // ========================================================================
    // Passive animals
    // ========================================================================
    Chicken,
    Cow,
    Pig,
    Sheep,
    Rabbit,
    Squid,

    // ========================================================================
    // Hostile ground mobs
    // ========================================================================
    Zombie,
    Skeleton,
    Creeper,
    Spider,
    IronGolem,

    // ========================================================================
    // Splitting mobs
    // ========================================================================
    Slime,
    MagmaCube,

    // ========================================================================
    // Flying mobs
    // ========================================================================
    Bat,
    Bee,
    Blaze,
    Ghast,
    Parrot,
    Phantom,

    // ========================================================================
    // Bosses and projectiles that only appear as damagers
    // ========================================================================
    Wither,
    WitherSkull,
    EnderDragon,
    Player,
}

/// Stable identifier of a live creature in the host simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreatureId(pub u64);

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the center of the block column this location sits in, keeping `y`.
    pub fn block_centered(&self) -> Self {
        Self {
            x: self.x.floor() + 0.5,
            y: self.y,
            z: self.z.floor() + 0.5,
        }
    }
}

/// A velocity or displacement.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Random vector with every component in `[0, scale)`.
    pub fn random(rng: &mut impl rand::Rng, scale: f64) -> Self {
        Self {
            x: rng.r#gen::<f64>() * scale,
            y: rng.r#gen::<f64>() * scale,
            z: rng.r#gen::<f64>() * scale,
        }
    }

    pub fn add(self, other: Vector) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// Why a creature last took damage.
///
/// Names follow the host engine's constants so configured cause lists
/// (`"FALL"`, `"lava"`, ...) can be matched case-insensitively.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DamageCause {
    EntityAttack,
    EntitySweepAttack,
    Projectile,
    Fall,
    Fire,
    FireTick,
    Lava,
    Drowning,
    Suffocation,
    BlockExplosion,
    EntityExplosion,
    Void,
    Magic,
    Poison,
    Wither,
    Starvation,
    Thorns,
    Lightning,
    Cramming,
    Freeze,
    Custom,
}

/// The last damage a creature took.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageSource {
    pub cause: DamageCause,
    /// The entity that dealt the damage, if it was dealt by one.
    pub damager: Option<EntityKind>,
}

impl DamageSource {
    pub const fn new(cause: DamageCause) -> Self {
        Self {
            cause,
            damager: None,
        }
    }

    pub const fn by(cause: DamageCause, damager: EntityKind) -> Self {
        Self {
            cause,
            damager: Some(damager),
        }
    }
}

/// The player credited with a kill.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Killer {
    pub id: u64,
    pub name: String,
    /// Holder may force whole-stack deaths.
    pub kill_entire_stack: bool,
}

impl Killer {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kill_entire_stack: false,
        }
    }

    pub fn with_kill_entire_stack(mut self, enabled: bool) -> Self {
        self.kill_entire_stack = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_cause_parses_case_insensitively() {
        assert_eq!("fall".parse::<DamageCause>().unwrap(), DamageCause::Fall);
        assert_eq!(
            "entity_explosion".parse::<DamageCause>().unwrap(),
            DamageCause::EntityExplosion
        );
        assert_eq!(DamageCause::FireTick.as_ref(), "FIRE_TICK");
    }

    #[test]
    fn block_centered_snaps_horizontal_axes() {
        let centered = Location::new(3.9, 64.2, -1.2).block_centered();
        assert_eq!(centered, Location::new(3.5, 64.2, -1.5));
    }
}
