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

use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use std::sync::OnceLock;

#[derive(Debug)]
enum Workers {
    Threaded(ThreadPool),
    Inline,
}

/// The worker pool that decodes compressed archive frames.
///
/// One pool is shared by every zstd archive loaded through the same
/// [`StorageContext`](crate::StorageContext). Worker threads are spawned on the
/// first decode, not when the pool is created. Dropping the last reference tells
/// the workers to exit; the drop does not wait for them.
///
/// [`DecodePool::inline`] runs all work on the calling thread, which keeps tests
/// deterministic.
#[derive(Debug)]
pub struct DecodePool {
    threads: usize,
    workers: OnceLock<Workers>,
}

impl DecodePool {
    /// Creates a pool of `threads` workers. Zero uses one worker per core.
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            workers: OnceLock::new(),
        }
    }

    /// Creates a pool that decodes on the calling thread.
    pub fn inline() -> Self {
        let workers = OnceLock::new();
        let _ = workers.set(Workers::Inline);
        Self {
            threads: 1,
            workers,
        }
    }

    /// Returns `true` once the workers exist.
    pub fn is_started(&self) -> bool {
        self.workers.get().is_some()
    }

    /// Returns `true` if work runs on the calling thread.
    pub fn is_inline(&self) -> bool {
        matches!(self.workers.get(), Some(Workers::Inline))
    }

    /// The number of threads decoding in parallel.
    pub fn thread_count(&self) -> usize {
        match self.workers.get() {
            Some(Workers::Threaded(pool)) => pool.current_num_threads(),
            Some(Workers::Inline) => 1,
            None if self.threads == 0 => rayon::current_num_threads(),
            None => self.threads,
        }
    }

    /// Applies `f` to every item, in parallel on the workers, and blocks until all
    /// results are in. Results keep the order of `items`.
    pub(crate) fn map_mut<T, R, F>(&self, items: &mut [T], f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(&mut T) -> R + Send + Sync,
    {
        match self.workers() {
            Workers::Threaded(pool) => pool.install(|| items.par_iter_mut().map(&f).collect()),
            Workers::Inline => items.iter_mut().map(f).collect(),
        }
    }

    fn workers(&self) -> &Workers {
        self.workers.get_or_init(|| {
            let built = ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .thread_name(|index| format!("khora-decode-{index}"))
                .build();
            match built {
                Ok(pool) => {
                    log::debug!(
                        "DecodePool: started {} worker threads",
                        pool.current_num_threads()
                    );
                    Workers::Threaded(pool)
                }
                Err(e) => {
                    log::warn!("DecodePool: failed to start workers ({e}), decoding inline");
                    Workers::Inline
                }
            }
        })
    }
}

impl Default for DecodePool {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workers_start_lazily() {
        let pool = DecodePool::new(2);
        assert!(!pool.is_started());

        let mut items = [1, 2, 3];
        let doubled = pool.map_mut(&mut items, |x| {
            *x *= 2;
            *x
        });
        assert_eq!(doubled, vec![2, 4, 6]);
        assert_eq!(items, [2, 4, 6]);
        assert!(pool.is_started());
        assert_eq!(pool.thread_count(), 2);
    }

    #[test]
    fn test_inline_pool_keeps_order() {
        let pool = DecodePool::inline();
        assert!(pool.is_inline());
        let mut items: Vec<u32> = (0..100).collect();
        assert_eq!(pool.map_mut(&mut items, |x| *x + 1), (1..101).collect::<Vec<_>>());
    }
}
