//! Weighted-random reward resolution for hunt collection.

use economy_core::types::{Item, Rarity};
use economy_core::{CatalogStore, EconomyError, Result};
use rand::Rng;

/// Relative base weights, heavily skewed toward Common.
pub const RARITY_BASE_WEIGHTS: [(Rarity, f64); 6] = [
    (Rarity::Common, 1000.0),
    (Rarity::Uncommon, 320.0),
    (Rarity::Rare, 90.0),
    (Rarity::Epic, 18.0),
    (Rarity::Legendary, 2.5),
    (Rarity::Mythic, 0.01),
];

/// Apply the satellite bonus: up to 20% of Common's weight (at the 2000 bp
/// cap) moves into the rarer tiers, split proportionally to their base
/// weights. Total weight is preserved.
pub fn shifted_weights(bonus_bp: i64) -> [(Rarity, f64); 6] {
    let fraction = bonus_bp.clamp(0, 2000) as f64 / 10_000.0;
    let mut weights = RARITY_BASE_WEIGHTS;
    if fraction == 0.0 {
        return weights;
    }

    let common_weight = weights[0].1;
    let moved = common_weight * fraction;
    let rare_total: f64 = weights[1..].iter().map(|(_, w)| w).sum();

    weights[0].1 = common_weight - moved;
    for entry in weights[1..].iter_mut() {
        entry.1 += moved * (entry.1 / rare_total);
    }
    weights
}

/// Resolve `count` independent draws: rarity by shifted weight, then a
/// uniform pick among catalog items of that rarity. Rarities with no
/// catalog items carry no weight.
pub fn draw_items(
    catalog: &CatalogStore,
    count: i64,
    bonus_bp: i64,
    rng: &mut impl Rng,
) -> Result<Vec<Item>> {
    if catalog.is_empty() {
        return Err(EconomyError::NoCatalogItems);
    }

    let populated = catalog.populated_rarities();
    let weights: Vec<(Rarity, f64)> = shifted_weights(bonus_bp)
        .into_iter()
        .filter(|(rarity, _)| populated.contains(rarity))
        .collect();
    let total: f64 = weights.iter().map(|(_, w)| w).sum();

    let mut drawn = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut roll = rng.gen_range(0.0..total);
        let mut chosen = weights[weights.len() - 1].0;
        for (rarity, weight) in &weights {
            if roll < *weight {
                chosen = *rarity;
                break;
            }
            roll -= weight;
        }

        let pool = catalog.items_of_rarity(chosen);
        let pick = rng.gen_range(0..pool.len());
        drawn.push(pool[pick].clone());
    }
    Ok(drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(id: &str, rarity: Rarity, value: i64) -> Item {
        Item {
            id: id.to_string(),
            name: id.to_string(),
            rarity,
            score_value: value,
            image_url: None,
        }
    }

    #[test]
    fn zero_bonus_keeps_base_weights() {
        assert_eq!(shifted_weights(0), RARITY_BASE_WEIGHTS);
    }

    #[test]
    fn shift_preserves_total_weight() {
        for bonus in [100, 700, 2000, 9999] {
            let base_total: f64 = RARITY_BASE_WEIGHTS.iter().map(|(_, w)| w).sum();
            let shifted_total: f64 = shifted_weights(bonus).iter().map(|(_, w)| w).sum();
            assert!((base_total - shifted_total).abs() < 1e-9);
        }
    }

    #[test]
    fn max_bonus_moves_a_fifth_of_common() {
        let shifted = shifted_weights(2000);
        assert!((shifted[0].1 - 800.0).abs() < 1e-9);
        // Rarer tiers all gained, proportionally to their base weight.
        for (i, (_, base)) in RARITY_BASE_WEIGHTS.iter().enumerate().skip(1) {
            assert!(shifted[i].1 > *base);
        }
    }

    #[test]
    fn draws_come_from_the_catalog() {
        let catalog = CatalogStore::new();
        catalog.load(vec![
            item("a", Rarity::Common, 1),
            item("b", Rarity::Common, 2),
            item("c", Rarity::Rare, 50),
        ]);

        let mut rng = StdRng::seed_from_u64(42);
        let drawn = draw_items(&catalog, 200, 0, &mut rng).expect("draws");
        assert_eq!(drawn.len(), 200);
        assert!(drawn.iter().all(|i| ["a", "b", "c"].contains(&i.id.as_str())));
        // With Common at 1000 vs Rare at 90, commons dominate.
        let commons = drawn.iter().filter(|i| i.rarity == Rarity::Common).count();
        assert!(commons > 150);
    }

    #[test]
    fn unpopulated_rarities_never_drawn() {
        let catalog = CatalogStore::new();
        catalog.load(vec![item("only", Rarity::Legendary, 10)]);

        let mut rng = StdRng::seed_from_u64(7);
        let drawn = draw_items(&catalog, 50, 2000, &mut rng).expect("draws");
        assert!(drawn.iter().all(|i| i.id == "only"));
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let catalog = CatalogStore::new();
        let mut rng = StdRng::seed_from_u64(1);
        let err = draw_items(&catalog, 1, 0, &mut rng).expect_err("empty");
        assert!(matches!(err, EconomyError::NoCatalogItems));
    }
}
