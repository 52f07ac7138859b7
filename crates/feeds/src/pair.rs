use alloy::primitives::FixedBytes;
use core::{fmt, str::FromStr};
use oracle_bindings::string_to_bytes32;
use serde::Deserialize;

/// Quote currencies recognised in symbols without a separator, longest first
/// so that `USDT` wins over `USD`.
const KNOWN_QUOTES: &[&str] =
    &["USDT", "USDC", "BUSD", "TUSD", "FDUSD", "DAI", "USD", "EUR", "GBP", "BTC", "ETH", "BNB"];

/// A symbol that could not be split into base and quote.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised market symbol {0:?}")]
pub struct PairError(pub String);

/// A market pair, e.g. `BTC/USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct Pair {
    /// The asset being priced.
    pub base: String,
    /// The currency the price is quoted in.
    pub quote: String,
}

impl Pair {
    /// Create a pair, uppercasing both sides.
    pub fn new(base: &str, quote: &str) -> Self {
        Self { base: base.to_ascii_uppercase(), quote: quote.to_ascii_uppercase() }
    }

    /// True if the quote is a US dollar or a dollar stablecoin.
    pub fn is_usd_quoted(&self) -> bool {
        self.quote.contains("USD")
    }

    /// The feed name, `BASE/QUOTE`, right-padded into a `bytes32`.
    pub fn feed_name(&self) -> FixedBytes<32> {
        string_to_bytes32(&self.to_string())
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = PairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PairError(s.to_string());
        let symbol = s.trim();

        if let Some((base, quote)) = symbol.split_once(['-', '_', '/']) {
            if base.is_empty() || quote.is_empty() {
                return Err(err());
            }
            return Ok(Self::new(base, quote));
        }

        let upper = symbol.to_ascii_uppercase();
        KNOWN_QUOTES
            .iter()
            .find_map(|quote| {
                upper.strip_suffix(quote).filter(|base| !base.is_empty()).map(|base| (base, quote))
            })
            .map(|(base, quote)| Self::new(base, quote))
            .ok_or_else(err)
    }
}

impl TryFrom<String> for Pair {
    type Error = PairError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
