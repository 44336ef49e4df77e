use rand::Rng;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Pluggable fare calculation. Implementations are pure: no storage access,
/// no side effects. Flight existence is the caller's concern.
pub trait FareStrategy: Send + Sync {
    /// Price in euro cents for one ticket on the given route and class.
    fn quote(&self, origin: &str, destination: &str, first_class: bool) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePrices {
    pub first_cents: i64,
    pub regular_cents: i64,
}

/// Static route-pair lookup with a default fallback. Deterministic; this is
/// the default strategy.
pub struct TableFares {
    routes: HashMap<(String, String), RoutePrices>,
    fallback: RoutePrices,
}

impl TableFares {
    pub fn new(fallback: RoutePrices) -> Self {
        Self {
            routes: HashMap::new(),
            fallback,
        }
    }

    /// Register a route price in both directions.
    pub fn insert(&mut self, a: &str, b: &str, prices: RoutePrices) {
        self.routes.insert((a.to_string(), b.to_string()), prices);
        self.routes.insert((b.to_string(), a.to_string()), prices);
    }

    /// Fallback table seeded with the short-haul routes the network flies
    /// most; everything else prices at the fallback pair.
    pub fn standard_routes(fallback: RoutePrices) -> Self {
        let mut fares = Self::new(fallback);
        fares.insert("LIS", "OPO", RoutePrices { first_cents: 18000, regular_cents: 7500 });
        fares.insert("LIS", "FAO", RoutePrices { first_cents: 16000, regular_cents: 6500 });
        fares.insert("LIS", "MAD", RoutePrices { first_cents: 22000, regular_cents: 9000 });
        fares.insert("LIS", "BCN", RoutePrices { first_cents: 26000, regular_cents: 11000 });
        fares.insert("LIS", "CDG", RoutePrices { first_cents: 32000, regular_cents: 14000 });
        fares.insert("LIS", "LHR", RoutePrices { first_cents: 34000, regular_cents: 15000 });
        fares.insert("LIS", "AMS", RoutePrices { first_cents: 33000, regular_cents: 14500 });
        fares.insert("OPO", "MAD", RoutePrices { first_cents: 21000, regular_cents: 8500 });
        fares.insert("OPO", "CDG", RoutePrices { first_cents: 31000, regular_cents: 13500 });
        fares
    }
}

impl FareStrategy for TableFares {
    fn quote(&self, origin: &str, destination: &str, first_class: bool) -> i64 {
        let prices = self
            .routes
            .get(&(origin.to_string(), destination.to_string()))
            .copied()
            .unwrap_or(self.fallback);
        if first_class {
            prices.first_cents
        } else {
            prices.regular_cents
        }
    }
}

/// Uniform random price per class within a configured range. Kept behind
/// configuration for load and demo environments where price realism matters
/// more than reproducibility.
pub struct RandomFares {
    first: RangeInclusive<i64>,
    regular: RangeInclusive<i64>,
}

impl RandomFares {
    pub fn new(first: RangeInclusive<i64>, regular: RangeInclusive<i64>) -> Self {
        Self { first, regular }
    }
}

impl Default for RandomFares {
    /// Historical seed-data ranges: first 100.00-1200.00, regular 80.00-350.00.
    fn default() -> Self {
        Self::new(10_000..=120_000, 8_000..=35_000)
    }
}

impl FareStrategy for RandomFares {
    fn quote(&self, _origin: &str, _destination: &str, first_class: bool) -> i64 {
        let mut rng = rand::thread_rng();
        if first_class {
            rng.gen_range(self.first.clone())
        } else {
            rng.gen_range(self.regular.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: RoutePrices = RoutePrices { first_cents: 25000, regular_cents: 10000 };

    #[test]
    fn test_table_known_route() {
        let fares = TableFares::standard_routes(FALLBACK);
        assert_eq!(fares.quote("LIS", "OPO", false), 7500);
        assert_eq!(fares.quote("LIS", "OPO", true), 18000);
        // both directions are priced
        assert_eq!(fares.quote("OPO", "LIS", false), 7500);
    }

    #[test]
    fn test_table_fallback_for_unknown_route() {
        let fares = TableFares::standard_routes(FALLBACK);
        assert_eq!(fares.quote("XXX", "YYY", false), 10000);
        assert_eq!(fares.quote("XXX", "YYY", true), 25000);
    }

    #[test]
    fn test_random_stays_in_range() {
        let fares = RandomFares::default();
        for _ in 0..100 {
            let first = fares.quote("LIS", "LHR", true);
            let regular = fares.quote("LIS", "LHR", false);
            assert!((10_000..=120_000).contains(&first));
            assert!((8_000..=35_000).contains(&regular));
        }
    }
}
