use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use herald_channels::{Error as ChannelError, IdentityResolver, Result as ChannelResult};

/// Memoises another resolver for the lifetime of one run.
///
/// Negative answers are cached too, so a handle that failed once is not
/// looked up again until the next run builds a fresh cache.
pub struct CachedResolver {
    inner: Arc<dyn IdentityResolver>,
    cache: Mutex<HashMap<String, Option<i64>>>,
}

impl CachedResolver {
    pub fn new(inner: Arc<dyn IdentityResolver>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, handle: &str) -> Option<Option<i64>> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(handle).copied()
    }

    fn remember(&self, handle: &str, identity: Option<i64>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(handle.to_string(), identity);
    }
}

#[async_trait]
impl IdentityResolver for CachedResolver {
    async fn resolve(&self, handle: &str) -> ChannelResult<i64> {
        match self.cached(handle) {
            Some(Some(identity)) => return Ok(identity),
            Some(None) => return Err(ChannelError::not_found(handle)),
            None => {},
        }

        match self.inner.resolve(handle).await {
            Ok(identity) => {
                self.remember(handle, Some(identity));
                Ok(identity)
            },
            Err(e) => {
                self.remember(handle, None);
                Err(e)
            },
        }
    }
}
