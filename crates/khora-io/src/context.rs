// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The explicit context handed to package loading.

use crate::{config::StorageConfig, decode::DecodePool};
use std::sync::Arc;

/// Everything package loading needs besides a path: the configuration and the
/// decode pool shared by all zstd archives.
///
/// Whoever assembles the asset subsystem at startup owns the context. Cloning
/// it shares the same pool.
#[derive(Debug, Clone, Default)]
pub struct StorageContext {
    config: StorageConfig,
    decode_pool: Arc<DecodePool>,
}

impl StorageContext {
    /// Creates a context with a decode pool sized from `config`.
    pub fn new(config: StorageConfig) -> Self {
        let decode_pool = Arc::new(DecodePool::new(config.decode_threads));
        Self {
            config,
            decode_pool,
        }
    }

    /// Creates a context around an existing decode pool.
    pub fn with_decode_pool(config: StorageConfig, decode_pool: Arc<DecodePool>) -> Self {
        Self {
            config,
            decode_pool,
        }
    }

    /// The storage configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// The shared decode pool.
    pub fn decode_pool(&self) -> &Arc<DecodePool> {
        &self.decode_pool
    }
}
