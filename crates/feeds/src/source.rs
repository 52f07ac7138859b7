use crate::Pair;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// A price observed on one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// The market.
    pub pair: Pair,
    /// The last traded price.
    pub price: Decimal,
}

impl Sample {
    /// Create a sample.
    pub const fn new(pair: Pair, price: Decimal) -> Self {
        Self { pair, price }
    }
}

/// Errors returned by a [`TickerSource`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The request failed or the body did not decode.
    #[error("{source_name} request failed: {error}")]
    Http {
        /// The source that failed.
        source_name: &'static str,
        /// The underlying error.
        #[source]
        error: reqwest::Error,
    },
    /// The exchange reported an error.
    #[error("{source_name} returned an error: {message}")]
    Exchange {
        /// The source that failed.
        source_name: &'static str,
        /// The exchange's message.
        message: String,
    },
}

/// An exchange that reports spot prices for many markets at once.
#[async_trait]
pub trait TickerSource: Send + Sync + core::fmt::Debug {
    /// A short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the current price of every market the exchange lists.
    async fn fetch(&self) -> Result<Vec<Sample>, SourceError>;
}

async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    source_name: &'static str,
    url: String,
) -> Result<T, SourceError> {
    let http = |error| SourceError::Http { source_name, error };
    client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(http)?
        .json()
        .await
        .map_err(http)
}

/// Symbols that cannot be split into a pair are skipped.
fn samples<I>(rows: I) -> Vec<Sample>
where
    I: IntoIterator<Item = (String, Decimal)>,
{
    rows.into_iter()
        .filter_map(|(symbol, price)| symbol.parse().ok().map(|pair| Sample::new(pair, price)))
        .collect()
}

macro_rules! source {
    ($name:ident, $label:literal, $default_url:literal) => {
        #[doc = concat!("Spot prices from ", $label, ".")]
        #[derive(Debug, Clone)]
        pub struct $name {
            client: reqwest::Client,
            base_url: String,
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new($default_url)
            }
        }

        impl $name {
            #[doc = concat!("The production ", $label, " API.")]
            pub const DEFAULT_URL: &'static str = $default_url;

            /// Create a source against `base_url`.
            pub fn new(base_url: impl Into<String>) -> Self {
                Self::with_client(reqwest::Client::new(), base_url)
            }

            /// Create a source using the given client.
            pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
                let base_url = base_url.into().trim_end_matches('/').to_string();
                Self { client, base_url }
            }
        }
    };
}

source!(BinanceSource, "Binance", "https://api.binance.us");
source!(CoinbaseSource, "Coinbase", "https://api.coinbase.com");
source!(OkxSource, "OKX", "https://www.okx.com");
source!(GateIoSource, "Gate.io", "https://api.gateio.ws");
source!(KrakenSource, "Kraken", "https://api.kraken.com");
source!(BitstampSource, "Bitstamp", "https://www.bitstamp.net");
source!(KucoinSource, "KuCoin", "https://api.kucoin.com");
source!(HuobiSource, "Huobi", "https://api.huobi.pro");

#[derive(Deserialize)]
struct BinanceTicker {
    symbol: String,
    price: Decimal,
}

#[async_trait]
impl TickerSource for BinanceSource {
    fn name(&self) -> &'static str {
        "binance"
    }

    #[instrument(skip_all)]
    async fn fetch(&self) -> Result<Vec<Sample>, SourceError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let rows: Vec<BinanceTicker> = get_json(&self.client, self.name(), url).await?;
        debug!(markets = rows.len(), "fetched tickers");
        Ok(samples(rows.into_iter().map(|row| (row.symbol, row.price))))
    }
}

#[derive(Deserialize)]
struct CoinbaseRates {
    data: CoinbaseRatesData,
}

#[derive(Deserialize)]
struct CoinbaseRatesData {
    rates: BTreeMap<String, Decimal>,
}

#[async_trait]
impl TickerSource for CoinbaseSource {
    fn name(&self) -> &'static str {
        "coinbase"
    }

    /// Coinbase reports how much of each currency one dollar buys, so the
    /// price is the inverse of the rate.
    #[instrument(skip_all)]
    async fn fetch(&self) -> Result<Vec<Sample>, SourceError> {
        let url = format!("{}/v2/exchange-rates?currency=USD", self.base_url);
        let rates: CoinbaseRates = get_json(&self.client, self.name(), url).await?;
        debug!(markets = rates.data.rates.len(), "fetched rates");

        Ok(rates
            .data
            .rates
            .into_iter()
            .filter_map(|(currency, rate)| {
                let price = Decimal::ONE.checked_div(rate)?;
                Some(Sample::new(Pair::new(&currency, "USD"), price))
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct OkxResponse {
    code: String,
    msg: String,
    data: Vec<OkxTicker>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxTicker {
    inst_id: String,
    last: Decimal,
}

#[async_trait]
impl TickerSource for OkxSource {
    fn name(&self) -> &'static str {
        "okx"
    }

    #[instrument(skip_all)]
    async fn fetch(&self) -> Result<Vec<Sample>, SourceError> {
        let url = format!("{}/api/v5/market/tickers?instType=SPOT", self.base_url);
        let response: OkxResponse = get_json(&self.client, self.name(), url).await?;
        if response.code != "0" {
            return Err(SourceError::Exchange { source_name: self.name(), message: response.msg });
        }
        debug!(markets = response.data.len(), "fetched tickers");
        Ok(samples(response.data.into_iter().map(|row| (row.inst_id, row.last))))
    }
}

#[derive(Deserialize)]
struct GateIoTicker {
    currency_pair: String,
    last: Decimal,
}

#[async_trait]
impl TickerSource for GateIoSource {
    fn name(&self) -> &'static str {
        "gateio"
    }

    #[instrument(skip_all)]
    async fn fetch(&self) -> Result<Vec<Sample>, SourceError> {
        let url = format!("{}/api/v4/spot/tickers", self.base_url);
        let rows: Vec<GateIoTicker> = get_json(&self.client, self.name(), url).await?;
        debug!(markets = rows.len(), "fetched tickers");
        Ok(samples(rows.into_iter().map(|row| (row.currency_pair, row.last))))
    }
}

#[derive(Deserialize)]
struct KrakenResponse {
    error: Vec<String>,
    #[serde(default)]
    result: BTreeMap<String, KrakenTicker>,
}

#[derive(Deserialize)]
struct KrakenTicker {
    /// Last trade, as `[price, volume]`.
    c: (Decimal, Decimal),
}

fn kraken_asset(code: &str) -> &str {
    match code {
        "XBT" => "BTC",
        "XDG" => "DOGE",
        other => other,
    }
}

/// Kraken's legacy pair names prefix each asset with `X` (crypto) or `Z`
/// (fiat), e.g. `XXBTZUSD`. Newer pairs use plain symbols.
fn kraken_pair(name: &str) -> Option<Pair> {
    let legacy = name.len() == 8
        && name.starts_with('X')
        && matches!(name.as_bytes().get(4), Some(b'X' | b'Z'));
    let pair = if legacy {
        Pair::new(name.get(1..4)?, name.get(5..)?)
    } else {
        name.parse().ok()?
    };
    Some(Pair::new(kraken_asset(&pair.base), kraken_asset(&pair.quote)))
}

#[async_trait]
impl TickerSource for KrakenSource {
    fn name(&self) -> &'static str {
        "kraken"
    }

    #[instrument(skip_all)]
    async fn fetch(&self) -> Result<Vec<Sample>, SourceError> {
        let url = format!("{}/0/public/Ticker", self.base_url);
        let response: KrakenResponse = get_json(&self.client, self.name(), url).await?;
        if !response.error.is_empty() {
            return Err(SourceError::Exchange {
                source_name: self.name(),
                message: response.error.join(", "),
            });
        }
        debug!(markets = response.result.len(), "fetched tickers");
        Ok(response
            .result
            .into_iter()
            .filter_map(|(name, ticker)| Some(Sample::new(kraken_pair(&name)?, ticker.c.0)))
            .collect())
    }
}

#[derive(Deserialize)]
struct BitstampTicker {
    pair: String,
    last: Decimal,
}

#[async_trait]
impl TickerSource for BitstampSource {
    fn name(&self) -> &'static str {
        "bitstamp"
    }

    #[instrument(skip_all)]
    async fn fetch(&self) -> Result<Vec<Sample>, SourceError> {
        let url = format!("{}/api/v2/ticker/", self.base_url);
        let rows: Vec<BitstampTicker> = get_json(&self.client, self.name(), url).await?;
        debug!(markets = rows.len(), "fetched tickers");
        Ok(samples(rows.into_iter().map(|row| (row.pair, row.last))))
    }
}

#[derive(Deserialize)]
struct KucoinResponse {
    code: String,
    #[serde(default)]
    msg: String,
    data: Option<KucoinData>,
}

#[derive(Deserialize)]
struct KucoinData {
    ticker: Vec<KucoinTicker>,
}

#[derive(Deserialize)]
struct KucoinTicker {
    symbol: String,
    last: Option<Decimal>,
}

#[async_trait]
impl TickerSource for KucoinSource {
    fn name(&self) -> &'static str {
        "kucoin"
    }

    /// Markets without a trade report no `last` price and are skipped.
    #[instrument(skip_all)]
    async fn fetch(&self) -> Result<Vec<Sample>, SourceError> {
        let url = format!("{}/api/v1/market/allTickers", self.base_url);
        let response: KucoinResponse = get_json(&self.client, self.name(), url).await?;
        let data = match response.data {
            Some(data) if response.code == "200000" => data,
            _ => {
                return Err(SourceError::Exchange {
                    source_name: self.name(),
                    message: format!("code {}: {}", response.code, response.msg),
                })
            }
        };
        debug!(markets = data.ticker.len(), "fetched tickers");
        Ok(samples(
            data.ticker.into_iter().filter_map(|row| row.last.map(|last| (row.symbol, last))),
        ))
    }
}

#[derive(Deserialize)]
struct HuobiResponse {
    status: String,
    #[serde(default, rename = "err-msg")]
    err_msg: String,
    #[serde(default)]
    data: Vec<HuobiTicker>,
}

#[derive(Deserialize)]
struct HuobiTicker {
    symbol: String,
    close: Decimal,
}

#[async_trait]
impl TickerSource for HuobiSource {
    fn name(&self) -> &'static str {
        "huobi"
    }

    #[instrument(skip_all)]
    async fn fetch(&self) -> Result<Vec<Sample>, SourceError> {
        let url = format!("{}/market/tickers", self.base_url);
        let response: HuobiResponse = get_json(&self.client, self.name(), url).await?;
        if response.status != "ok" {
            return Err(SourceError::Exchange {
                source_name: self.name(),
                message: response.err_msg,
            });
        }
        debug!(markets = response.data.len(), "fetched tickers");
        Ok(samples(response.data.into_iter().map(|row| (row.symbol, row.close))))
    }
}

/// The default set of exchanges.
pub fn default_sources() -> Vec<Box<dyn TickerSource>> {
    vec![
        Box::new(BinanceSource::default()),
        Box::new(CoinbaseSource::default()),
        Box::new(OkxSource::default()),
        Box::new(GateIoSource::default()),
        Box::new(KrakenSource::default()),
        Box::new(BitstampSource::default()),
        Box::new(KucoinSource::default()),
        Box::new(HuobiSource::default()),
    ]
}
