//! Single-flight market cache (spec §4.4): the first caller of `load_markets` performs the
//! fetch, concurrent callers await the same in-flight result, and every subsequent caller reads
//! the cached snapshot until `force_reload` or an explicit refresh.

use spotlink_instrument::model::market::Market;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

enum State {
    Empty,
    Loading,
    Loaded(Arc<HashMap<String, Market>>),
}

pub struct MarketCache {
    state: Mutex<State>,
    notify: Notify,
}

impl Default for MarketCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Empty),
            notify: Notify::new(),
        }
    }

    /// Return the cached market map, invoking `fetch` at most once across any number of
    /// concurrent callers (spec §4.4 single-flight contract).
    pub async fn load_markets<F, Fut, E>(&self, force_reload: bool, fetch: F) -> Result<Arc<HashMap<String, Market>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<HashMap<String, Market>, E>>,
    {
        loop {
            let mut state = self.state.lock().await;
            match &*state {
                State::Loaded(markets) if !force_reload => return Ok(markets.clone()),
                State::Loading => {
                    drop(state);
                    self.notify.notified().await;
                    continue;
                }
                _ => {
                    *state = State::Loading;
                    drop(state);
                    break;
                }
            }
        }

        let result = fetch().await;
        let mut state = self.state.lock().await;
        match result {
            Ok(markets) => {
                let markets = Arc::new(markets);
                *state = State::Loaded(markets.clone());
                drop(state);
                self.notify.notify_waiters();
                Ok(markets)
            }
            Err(error) => {
                *state = State::Empty;
                drop(state);
                self.notify.notify_waiters();
                Err(error)
            }
        }
    }

    pub async fn symbols(&self) -> Vec<String> {
        let state = self.state.lock().await;
        match &*state {
            State::Loaded(markets) => markets.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Look up a single market from whatever snapshot is currently cached, without triggering a
    /// load. Returns `None` both when the symbol is unknown and when nothing has been loaded yet
    /// (spec §4.4 `market(symbol)`); callers that need a load-on-miss should call
    /// [`MarketCache::load_markets`] first.
    pub async fn market(&self, symbol: &str) -> Option<Market> {
        let state = self.state.lock().await;
        match &*state {
            State::Loaded(markets) => markets.get(symbol).cloned(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotlink_instrument::exchange::ExchangeId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn concurrent_callers_trigger_a_single_fetch() {
        let cache = Arc::new(MarketCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .load_markets(false, || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                            let mut map = HashMap::new();
                            map.insert(
                                "BTC/USDT".to_string(),
                                Market::new(ExchangeId::Binance, "BTCUSDT", "BTC", "USDT"),
                            );
                            Ok::<_, ()>(map)
                        }
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn market_is_none_until_loaded_then_found_by_symbol() {
        let cache = MarketCache::new();
        assert!(cache.market("BTC/USDT").await.is_none());
        cache
            .load_markets(false, || async {
                let mut map = HashMap::new();
                map.insert(
                    "BTC/USDT".to_string(),
                    Market::new(ExchangeId::Binance, "BTCUSDT", "BTC", "USDT"),
                );
                Ok::<_, ()>(map)
            })
            .await
            .unwrap();
        assert!(cache.market("BTC/USDT").await.is_some());
        assert!(cache.market("ETH/USDT").await.is_none());
    }

    #[tokio::test]
    async fn force_reload_bypasses_the_cache() {
        let cache = MarketCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            cache
                .load_markets(true, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(HashMap::new())
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
