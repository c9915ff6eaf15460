//! Pure pricing and progress formulas. All money math is exact-integer,
//! flooring toward zero unless stated otherwise; no hidden state.

/// Per-track upgrade cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct UpgradeCurve {
    pub base_cost: i64,
    pub growth_rate: f64,
    pub max_level: i32,
}

pub const BOT_SPEED_CURVE: UpgradeCurve = UpgradeCurve {
    base_cost: 100,
    growth_rate: 1.35,
    max_level: 35,
};

pub const RUNTIME_CURVE: UpgradeCurve = UpgradeCurve {
    base_cost: 150,
    growth_rate: 1.30,
    max_level: 20,
};

pub const SATELLITE_CURVE: UpgradeCurve = UpgradeCurve {
    base_cost: 250,
    growth_rate: 1.40,
    max_level: 20,
};

pub const COST_PER_HOUR_CURVE: UpgradeCurve = UpgradeCurve {
    base_cost: 200,
    growth_rate: 1.25,
    max_level: 25,
};

pub const BASE_ITEMS_PER_HOUR: i64 = 10;
pub const MAX_ITEMS_PER_HOUR: i64 = 45;

pub const BASE_RUNTIME_MINUTES: i64 = 120;
pub const RUNTIME_GROWTH_RATE: f64 = 1.15;
pub const MAX_RUNTIME_MINUTES: i64 = 1440;
pub const MIN_SESSION_MINUTES: i64 = 15;
pub const FREE_SESSION_MINUTES: i64 = 15;

pub const BASE_COST_PER_HOUR: i64 = 120;
pub const MIN_COST_PER_HOUR: i64 = 30;

pub const SATELLITE_INCREMENT_BP: i64 = 100;
pub const SATELLITE_MAX_LEVEL: i32 = 20;

/// Marketplace burn applied to the seller's proceeds on settlement, in
/// basis points of the trade price.
pub const BURN_RATE_BP: i64 = 500;

/// Accumulator precision: fractional progress is rounded to 4 decimals on
/// every write to bound floating drift across many short sessions.
const ACCUMULATOR_SCALE: f64 = 10_000.0;

/// `floor(base_cost * growth_rate^level)` for the next level purchase.
pub fn upgrade_cost(level: i32, curve: &UpgradeCurve) -> i64 {
    (curve.base_cost as f64 * curve.growth_rate.powi(level)).floor() as i64
}

pub fn items_per_hour(level: i32) -> i64 {
    (BASE_ITEMS_PER_HOUR + level as i64).min(MAX_ITEMS_PER_HOUR)
}

pub fn max_runtime_minutes(level: i32) -> i64 {
    let grown = (BASE_RUNTIME_MINUTES as f64 * RUNTIME_GROWTH_RATE.powi(level)).floor() as i64;
    grown.min(MAX_RUNTIME_MINUTES)
}

/// Linear descent from BASE to MIN over the track's max level.
pub fn cost_per_hour(level: i32) -> i64 {
    let descent =
        level as i64 * (BASE_COST_PER_HOUR - MIN_COST_PER_HOUR) / COST_PER_HOUR_CURVE.max_level as i64;
    (BASE_COST_PER_HOUR - descent).max(MIN_COST_PER_HOUR)
}

/// Satellite rarity bonus in basis points (100 bp = 1%).
pub fn satellite_bonus_bp(level: i32) -> i64 {
    (level as i64 * SATELLITE_INCREMENT_BP)
        .min(SATELLITE_MAX_LEVEL as i64 * SATELLITE_INCREMENT_BP)
}

/// Cost of a paid hunt session, rounded up to whole tokens.
pub fn paid_session_cost(minutes: i64, cost_per_hour: i64) -> i64 {
    // ceil(minutes * cph / 60) without going through floats
    (minutes * cost_per_hour + 59) / 60
}

/// Tokens removed from the economy when a priced trade settles.
pub fn marketplace_burn(price: i64) -> i64 {
    price * BURN_RATE_BP / 10_000
}

/// Result of accruing fractional item progress over a finished session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accrual {
    /// Whole items earned by this session.
    pub granted: i64,
    /// Carried-over fractional progress, always in [0, 1).
    pub new_accumulated: f64,
}

/// Accrue `items_per_hour / 60 * minutes_run` on top of the stored
/// accumulator and split the total into whole items plus remainder.
pub fn fractional_accrual(items_per_hour: i64, minutes_run: i64, accumulated: f64) -> Accrual {
    let raw = items_per_hour as f64 / 60.0 * minutes_run as f64;
    let total = accumulated + raw;
    let mut granted = total.floor() as i64;
    let mut new_accumulated = round_accumulator(total - granted as f64);
    // Rounding can push the remainder up to exactly 1.0; fold it into the grant.
    if new_accumulated >= 1.0 {
        granted += 1;
        new_accumulated = 0.0;
    }
    Accrual {
        granted: granted.max(0),
        new_accumulated,
    }
}

fn round_accumulator(value: f64) -> f64 {
    (value * ACCUMULATOR_SCALE).round() / ACCUMULATOR_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_cost_is_monotone_up_to_cap() {
        for curve in [
            BOT_SPEED_CURVE,
            RUNTIME_CURVE,
            SATELLITE_CURVE,
            COST_PER_HOUR_CURVE,
        ] {
            for level in 0..curve.max_level {
                assert!(
                    upgrade_cost(level + 1, &curve) >= upgrade_cost(level, &curve),
                    "cost must not decrease at level {level}"
                );
            }
            assert_eq!(upgrade_cost(0, &curve), curve.base_cost);
        }
    }

    #[test]
    fn items_per_hour_caps() {
        assert_eq!(items_per_hour(0), 10);
        assert_eq!(items_per_hour(5), 15);
        assert_eq!(items_per_hour(35), MAX_ITEMS_PER_HOUR);
        assert_eq!(items_per_hour(100), MAX_ITEMS_PER_HOUR);
    }

    #[test]
    fn runtime_caps_at_one_day() {
        assert_eq!(max_runtime_minutes(0), BASE_RUNTIME_MINUTES);
        assert!(max_runtime_minutes(5) > BASE_RUNTIME_MINUTES);
        assert_eq!(max_runtime_minutes(50), MAX_RUNTIME_MINUTES);
    }

    #[test]
    fn cost_per_hour_descends_to_floor() {
        assert_eq!(cost_per_hour(0), 120);
        assert!(cost_per_hour(10) < cost_per_hour(0));
        assert_eq!(cost_per_hour(25), MIN_COST_PER_HOUR);
        assert_eq!(cost_per_hour(1000), MIN_COST_PER_HOUR);
    }

    #[test]
    fn satellite_bonus_caps_at_2000_bp() {
        assert_eq!(satellite_bonus_bp(0), 0);
        assert_eq!(satellite_bonus_bp(7), 700);
        assert_eq!(satellite_bonus_bp(20), 2000);
        assert_eq!(satellite_bonus_bp(99), 2000);
    }

    #[test]
    fn paid_session_cost_rounds_up() {
        // Scenario A: 30 minutes at 120/hour = ceil(0.5 * 120) = 60
        assert_eq!(paid_session_cost(30, cost_per_hour(0)), 60);
        assert_eq!(paid_session_cost(15, 120), 30);
        assert_eq!(paid_session_cost(1, 120), 2);
        assert_eq!(paid_session_cost(1, 59), 1);
    }

    #[test]
    fn accrual_matches_scenario_b() {
        // 15 items/hour for 15 minutes from an empty accumulator: 3.75
        let accrual = fractional_accrual(15, 15, 0.0);
        assert_eq!(accrual.granted, 3);
        assert_eq!(accrual.new_accumulated, 0.75);
    }

    #[test]
    fn accrual_remainder_stays_in_unit_interval() {
        let mut acc = 0.0;
        for minutes in [1, 7, 13, 15, 29, 60, 181] {
            let accrual = fractional_accrual(13, minutes, acc);
            assert!(accrual.granted >= 0);
            assert!(
                accrual.new_accumulated >= 0.0 && accrual.new_accumulated < 1.0,
                "accumulator {} out of range",
                accrual.new_accumulated
            );
            acc = accrual.new_accumulated;
        }
    }

    #[test]
    fn split_sessions_grant_the_same_total() {
        // Three 20-minute sessions must equal one 60-minute session when no
        // rounding boundary is crossed mid-way.
        let rate = 12;
        let one = fractional_accrual(rate, 60, 0.0);

        let mut acc = 0.0;
        let mut granted = 0;
        for _ in 0..3 {
            let accrual = fractional_accrual(rate, 20, acc);
            granted += accrual.granted;
            acc = accrual.new_accumulated;
        }
        assert_eq!(granted + acc.floor() as i64, one.granted);
        assert_eq!(granted, one.granted);
    }

    #[test]
    fn burn_floors_toward_zero() {
        assert_eq!(marketplace_burn(0), 0);
        assert_eq!(marketplace_burn(19), 0);
        assert_eq!(marketplace_burn(100), 5);
        assert_eq!(marketplace_burn(1999), 99);
    }
}
