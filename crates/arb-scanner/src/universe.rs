//! Coin universe collection (spec.md §4.6.1).

use arb_core::{Coin, VenueId};
use arb_venues::VenueRegistry;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Fan out `getAllFuturesCoins()` over every registered venue in parallel,
/// dropping digit-leading coins and anything in `exclude_coins`. A venue
/// whose fetch errors contributes an empty set rather than failing the
/// whole cycle (spec.md §7 "scanners never fail the outer loop").
pub async fn collect_universe(registry: &VenueRegistry, exclude_coins: &HashSet<Coin>) -> HashMap<VenueId, HashSet<Coin>> {
    let fetches = registry.iter().map(|adapter| {
        let adapter = adapter.clone();
        async move {
            let venue = adapter.venue();
            (venue, adapter.get_all_futures_coins().await)
        }
    });

    let results = futures::future::join_all(fetches).await;
    let mut per_venue = HashMap::with_capacity(results.len());
    for (venue, coins) in results {
        let coins = match coins {
            Ok(coins) => coins,
            Err(e) => {
                warn!(%venue, error = %e, "failed to collect coin universe, treating as empty this cycle");
                HashSet::new()
            }
        };
        let filtered: HashSet<Coin> = coins
            .into_iter()
            .filter(|coin| !coin.starts_with_digit() && !exclude_coins.contains(coin))
            .collect();
        per_venue.insert(venue, filtered);
    }
    per_venue
}

/// Union of every venue's coin set, the scanner's outer iteration order.
pub fn union_coins(per_venue: &HashMap<VenueId, HashSet<Coin>>) -> Vec<Coin> {
    let union: HashSet<Coin> = per_venue.values().flat_map(|set| set.iter().cloned()).collect();
    let mut coins: Vec<Coin> = union.into_iter().collect();
    coins.sort();
    coins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_coins_dedupes_and_sorts_across_venues() {
        let mut per_venue = HashMap::new();
        per_venue.insert(VenueId::Bybit, HashSet::from([Coin::new("BTC"), Coin::new("ETH")]));
        per_venue.insert(VenueId::Gate, HashSet::from([Coin::new("ETH"), Coin::new("SOL")]));
        let union = union_coins(&per_venue);
        assert_eq!(union, vec![Coin::new("BTC"), Coin::new("ETH"), Coin::new("SOL")]);
    }
}
