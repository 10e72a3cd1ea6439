use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{debug, warn};
use rust_decimal::Decimal;

use super::fx_model::{pair_key, pair_symbol, CachedRate};
use crate::constants::FX_CACHE_TTL_SECS;
use crate::market_data::MarketDataProviderTrait;

/// Spot-rate converter over the market-data port.
///
/// Rates are memoized per `"{from}{to}"` key with a fixed TTL; concurrent
/// callers may race to refill the same key, which is harmless because the
/// fetch is idempotent. Lookup never fails: a pair the provider cannot quote
/// directly is retried inverted (`1/rate`), and as a last resort the
/// converter degrades to `1.0` and logs the degradation. Fallback rates are
/// not cached, so a recovering provider is picked up on the next call.
pub struct CurrencyConverter {
    provider: Arc<dyn MarketDataProviderTrait>,
    cache: RwLock<HashMap<String, CachedRate>>,
    ttl: Duration,
}

impl CurrencyConverter {
    pub fn new(provider: Arc<dyn MarketDataProviderTrait>) -> Self {
        Self::with_ttl(provider, Duration::from_secs(FX_CACHE_TTL_SECS))
    }

    pub fn with_ttl(provider: Arc<dyn MarketDataProviderTrait>, ttl: Duration) -> Self {
        Self {
            provider,
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Spot rate from `from` to `to`. Infallible by design; see the type
    /// docs for the fallback ladder.
    pub async fn rate(&self, from: &str, to: &str) -> Decimal {
        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();

        if from == to {
            return Decimal::ONE;
        }
        if !is_currency_code(&from) || !is_currency_code(&to) {
            warn!(
                "FX degradation: invalid currency pair '{}'/'{}', using rate 1.0",
                from, to
            );
            return Decimal::ONE;
        }

        let key = pair_key(&from, &to);
        if let Some(rate) = self.cached(&key) {
            return rate;
        }

        if let Some(rate) = self.fetch_pair(&from, &to).await {
            self.store(&key, rate);
            return rate;
        }

        // Inverse quote covers pairs the provider only lists one way around.
        if let Some(inverse) = self.fetch_pair(&to, &from).await {
            if !inverse.is_zero() {
                let rate = Decimal::ONE / inverse;
                self.store(&key, rate);
                return rate;
            }
        }

        warn!(
            "FX degradation: no rate available for {}->{}, using rate 1.0",
            from, to
        );
        Decimal::ONE
    }

    /// Converts `amount` from one currency to another at the current rate.
    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        amount * self.rate(from, to).await
    }

    async fn fetch_pair(&self, from: &str, to: &str) -> Option<Decimal> {
        let symbol = pair_symbol(from, to);
        match self.provider.quote(&symbol).await {
            Ok(quote) if quote.price > Decimal::ZERO => {
                debug!("Fetched FX rate {} = {}", symbol, quote.price);
                Some(quote.price)
            }
            Ok(quote) => {
                warn!("Provider returned non-positive rate {} for {}", quote.price, symbol);
                None
            }
            Err(e) => {
                debug!("FX quote {} failed: {}", symbol, e);
                None
            }
        }
    }

    fn cached(&self, key: &str) -> Option<Decimal> {
        let cache = self.cache.read().ok()?;
        let entry = cache.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.rate)
        } else {
            None
        }
    }

    fn store(&self, key: &str, rate: Decimal) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(
                key.to_string(),
                CachedRate {
                    rate,
                    fetched_at: std::time::Instant::now(),
                },
            );
        }
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
