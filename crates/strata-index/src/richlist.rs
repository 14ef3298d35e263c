//! Rich-list and wealth-distribution calculation.
//!
//! Recomputation re-sorts every ledger entry and replaces the stored
//! snapshot wholesale, so running it twice with no ledger change yields
//! identical snapshots. The distribution partitions the top-100-by-balance
//! into fixed rank bands; the 101+ band is always the exact residual, so
//! bands sum to precisely 100% and total supply regardless of rounding.

use strata_core::amount::{round2, round8, to_coins};
use strata_core::constants::RICH_LIST_SIZE;
use strata_core::error::StoreError;
use strata_core::types::{AddressDoc, RankedAddress, RichlistDoc, StatsDoc};
use strata_store::CacheStore;

/// Re-rank all addresses and replace the stored rich-list snapshot.
pub fn update_richlist(store: &CacheStore, coin: &str) -> Result<RichlistDoc, StoreError> {
    let mut addresses = store.all_addresses()?;

    let doc = RichlistDoc {
        coin: coin.to_owned(),
        received: top_by(&mut addresses, |a| a.received),
        balance: top_by(&mut addresses, |a| a.balance),
    };
    store.put_richlist(&doc)?;
    Ok(doc)
}

fn top_by(addresses: &mut [AddressDoc], key: impl Fn(&AddressDoc) -> u64) -> Vec<RankedAddress> {
    // Secondary sort on address id keeps equal-value orderings stable
    // across runs.
    addresses.sort_by(|a, b| key(b).cmp(&key(a)).then_with(|| a.a_id.cmp(&b.a_id)));
    addresses.iter().take(RICH_LIST_SIZE).map(RankedAddress::from).collect()
}

/// Share of supply held by one rank band.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Band {
    /// Percentage of total supply.
    pub percent: f64,
    /// Absolute amount held, in decimal coin units.
    pub total: f64,
}

/// Wealth distribution across fixed rank bands of the balance rich-list.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Distribution {
    /// Total supply in decimal coin units.
    pub supply: f64,
    pub t_1_25: Band,
    pub t_26_50: Band,
    pub t_51_75: Band,
    pub t_76_100: Band,
    pub t_101plus: Band,
}

impl Distribution {
    /// Presentation copy: percentages to 2 decimals, totals to 8.
    pub fn rounded(&self) -> Self {
        let r = |b: Band| Band { percent: round2(b.percent), total: round8(b.total) };
        Self {
            supply: self.supply,
            t_1_25: r(self.t_1_25),
            t_26_50: r(self.t_26_50),
            t_51_75: r(self.t_51_75),
            t_76_100: r(self.t_76_100),
            t_101plus: r(self.t_101plus),
        }
    }
}

/// Compute the wealth distribution from a rich-list snapshot and the
/// current stats supply.
pub fn distribution(richlist: &RichlistDoc, stats: &StatsDoc) -> Distribution {
    let mut dist = Distribution { supply: stats.supply, ..Distribution::default() };

    for (i, entry) in richlist.balance.iter().enumerate() {
        let rank = i + 1;
        let coins = to_coins(entry.balance);
        let percent = if stats.supply > 0.0 { coins / stats.supply * 100.0 } else { 0.0 };
        let band = match rank {
            1..=25 => &mut dist.t_1_25,
            26..=50 => &mut dist.t_26_50,
            51..=75 => &mut dist.t_51_75,
            _ => &mut dist.t_76_100,
        };
        band.percent += percent;
        band.total += coins;
    }

    // Residual band: whatever the top 100 don't hold, computed by exact
    // subtraction rather than summation.
    dist.t_101plus.percent =
        100.0 - dist.t_1_25.percent - dist.t_26_50.percent - dist.t_51_75.percent - dist.t_76_100.percent;
    dist.t_101plus.total =
        dist.supply - dist.t_1_25.total - dist.t_26_50.total - dist.t_51_75.total - dist.t_76_100.total;

    dist
}
