use serde::{Deserialize, Serialize};

/// Item scarcity tiers, ordered from most to least common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Mythic => "mythic",
        }
    }

    pub fn parse(s: &str) -> Option<Rarity> {
        match s {
            "common" => Some(Rarity::Common),
            "uncommon" => Some(Rarity::Uncommon),
            "rare" => Some(Rarity::Rare),
            "epic" => Some(Rarity::Epic),
            "legendary" => Some(Rarity::Legendary),
            "mythic" => Some(Rarity::Mythic),
            _ => None,
        }
    }
}

/// Immutable catalog entry. `score_value` doubles as power and sell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub score_value: i64,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rarity_round_trips_through_strings() {
        for rarity in Rarity::ALL {
            assert_eq!(Rarity::parse(rarity.as_str()), Some(rarity));
        }
        assert_eq!(Rarity::parse("shiny"), None);
    }

    #[test]
    fn rarity_orders_by_scarcity() {
        assert!(Rarity::Common < Rarity::Mythic);
        assert!(Rarity::Rare < Rarity::Epic);
    }
}
