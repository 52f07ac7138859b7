use crate::{Pair, Sample};
use alloy::primitives::{FixedBytes, I256};
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Decimals of every pushed feed value.
pub const FEED_DECIMALS: u32 = 18;

/// Minimum number of samples, exclusive, for a pair to become a feed.
pub const MIN_SAMPLES: usize = 2;

/// Feed values keyed by feed name.
pub type FeedValues = BTreeMap<FixedBytes<32>, I256>;

/// Median of sorted prices. Returns `None` for an empty slice.
pub fn median(sorted: &[Decimal]) -> Option<Decimal> {
    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => None,
        n if n % 2 == 0 => Some((sorted[mid - 1] + sorted[mid]) / Decimal::TWO),
        _ => Some(sorted[mid]),
    }
}

/// Population standard deviation. Returns `None` for an empty slice.
pub fn std_dev(prices: &[Decimal]) -> Option<Decimal> {
    if prices.is_empty() {
        return None;
    }
    let count = Decimal::from(prices.len());
    let mean = prices.iter().sum::<Decimal>() / count;
    let variance = prices.iter().map(|p| (p - mean) * (p - mean)).sum::<Decimal>() / count;
    variance.sqrt()
}

/// Median of `prices` after dropping outliers.
///
/// With more than three samples, only prices strictly within one standard
/// deviation of the median are kept and the median is taken again. If that
/// removes every price, as it does when all prices are equal, the unfiltered
/// median is used.
pub fn robust_median(prices: &mut [Decimal]) -> Option<Decimal> {
    prices.sort_unstable();
    let first = median(prices)?;
    if prices.len() <= 3 {
        return Some(first);
    }

    let deviation = std_dev(prices)?;
    let (lower, upper) = (first - deviation, first + deviation);
    let kept: Vec<_> = prices.iter().copied().filter(|p| *p > lower && *p < upper).collect();
    trace!(%first, %deviation, kept = kept.len(), total = prices.len(), "filtered outliers");

    Some(median(&kept).unwrap_or(first))
}

/// Convert a price to an 18-decimal fixed point `int256`. Digits beyond 18
/// decimals are rounded.
pub fn to_fixed(price: Decimal) -> Option<I256> {
    let price = price.round_dp(FEED_DECIMALS);
    let mantissa = I256::try_from(price.mantissa()).ok()?;
    let factor = I256::try_from(10u128.pow(FEED_DECIMALS - price.scale())).ok()?;
    mantissa.checked_mul(factor)
}

/// Convert an 18-decimal fixed point value back to a decimal.
pub fn from_fixed(value: I256) -> Option<Decimal> {
    let mantissa = i128::try_from(value).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, FEED_DECIMALS).ok()
}

/// Group samples by pair and compute one medianized value per dollar-quoted
/// pair with enough samples.
pub fn aggregate<I>(samples: I) -> FeedValues
where
    I: IntoIterator<Item = Sample>,
{
    let mut grouped = BTreeMap::<Pair, Vec<Decimal>>::new();
    for sample in samples {
        grouped.entry(sample.pair).or_default().push(sample.price);
    }
    grouped.retain(|pair, prices| prices.len() > MIN_SAMPLES && pair.is_usd_quoted());

    let feeds: FeedValues = grouped
        .into_iter()
        .filter_map(|(pair, mut prices)| {
            let value = robust_median(&mut prices).and_then(to_fixed)?;
            trace!(%pair, %value, "aggregated feed");
            Some((pair.feed_name(), value))
        })
        .collect();

    debug!(feeds = feeds.len(), "aggregated samples");
    feeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use oracle_bindings::string_to_bytes32;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn prices(values: &[&str]) -> Vec<Decimal> {
        values.iter().map(|v| d(v)).collect()
    }

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median(&prices(&["1", "2", "3"])), Some(d("2")));
        assert_eq!(median(&prices(&["1", "2", "3", "4"])), Some(d("2.5")));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn small_groups_are_not_filtered() {
        let mut p = prices(&["100", "1", "1000"]);
        assert_eq!(robust_median(&mut p), Some(d("100")));
    }

    #[test]
    fn outliers_are_dropped() {
        // Median 101, population std dev ~ 359.8; 1000 is outside the band.
        let mut p = prices(&["100", "101", "102", "1000", "99"]);
        assert_eq!(robust_median(&mut p), Some(d("100.5")));
    }

    #[test]
    fn identical_prices_keep_their_median() {
        let mut p = prices(&["5", "5", "5", "5"]);
        assert_eq!(robust_median(&mut p), Some(d("5")));
    }

    #[test]
    fn fixed_point_conversion() {
        let one = I256::try_from(10u128.pow(18)).unwrap();
        assert_eq!(to_fixed(d("1")), Some(one));
        assert_eq!(to_fixed(d("0.000000000000000001")), Some(I256::ONE));
        assert_eq!(to_fixed(d("-2.5")), Some(I256::try_from(-25i128 * 10i128.pow(17)).unwrap()));
        assert_eq!(from_fixed(one), Some(d("1")));
    }

    #[test]
    fn aggregates_usd_pairs_with_enough_samples() {
        let btc = Pair::new("BTC", "USD");
        let eth = Pair::new("ETH", "USDT");
        let sol = Pair::new("SOL", "EUR");
        let samples = [
            Sample::new(btc.clone(), d("100")),
            Sample::new(btc.clone(), d("102")),
            Sample::new(btc.clone(), d("101")),
            Sample::new(eth.clone(), d("10")),
            Sample::new(eth.clone(), d("11")),
            Sample::new(sol.clone(), d("1")),
            Sample::new(sol.clone(), d("1")),
            Sample::new(sol, d("1")),
        ];

        let feeds = aggregate(samples);
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds.get(&string_to_bytes32("BTC/USD")), to_fixed(d("101")).as_ref());
    }
}
