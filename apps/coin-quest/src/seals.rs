//! Built-in seal pool and pool resolution.

use crate::models::{Rarity, Seal, Settings};

fn seal(id: &str, name: &str, rarity: Rarity, image: &str, description: &str) -> Seal {
    Seal {
        id: id.to_string(),
        name: name.to_string(),
        image: image.to_string(),
        rarity,
        description: Some(description.to_string()),
    }
}

/// The default seal pool, used whenever no custom seals are configured.
pub fn default_seals() -> Vec<Seal> {
    vec![
        seal("s1", "Slime Ball", Rarity::N, "seals/slime.png", "Wobbles when poked"),
        seal("s2", "Chickadee", Rarity::N, "seals/chick.png", "Toddles everywhere"),
        seal("s3", "Cave Bat", Rarity::N, "seals/bat.png", "Flies at night"),
        seal("s4", "Fire Wolf", Rarity::R, "seals/wolf.png", "Wrapped in flames"),
        seal("s5", "Aqua Turtle", Rarity::R, "seals/turtle.png", "Hard shell, soft heart"),
        seal("s6", "Thunderbird", Rarity::SR, "seals/thunder.png", "A bird of lightning"),
        seal("s7", "Ice Dragon", Rarity::SR, "seals/dragon.png", "Breath of frost"),
        seal("s8", "Golden King", Rarity::UR, "seals/king.png", "The king himself"),
    ]
}

/// Resolve the active pool: a non-empty custom pool replaces the default
/// pool entirely, there is no merge.
pub fn active_pool<'a>(settings: &'a Settings, default_pool: &'a [Seal]) -> &'a [Seal] {
    if settings.custom_seals.is_empty() {
        default_pool
    } else {
        &settings.custom_seals
    }
}

/// Look a seal up by id in the active pool. Unlocked ids left over from a
/// removed custom pool come back as `None`; display degrades, not an error.
pub fn find_seal<'a>(pool: &'a [Seal], id: &str) -> Option<&'a Seal> {
    pool.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_covers_every_tier() {
        let pool = default_seals();
        for rarity in [Rarity::N, Rarity::R, Rarity::SR, Rarity::UR] {
            assert!(pool.iter().any(|s| s.rarity == rarity), "{rarity:?} missing");
        }
    }

    #[test]
    fn test_custom_pool_replaces_defaults() {
        let defaults = default_seals();
        let mut settings = Settings::default();
        assert_eq!(active_pool(&settings, &defaults).len(), defaults.len());

        settings.custom_seals = vec![seal("c1", "House Cat", Rarity::N, "cat.png", "Naps a lot")];
        let pool = active_pool(&settings, &defaults);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, "c1");
    }

    #[test]
    fn test_stale_id_lookup_degrades() {
        let defaults = default_seals();
        assert!(find_seal(&defaults, "s8").is_some());
        assert!(find_seal(&defaults, "removed-custom-id").is_none());
    }
}
