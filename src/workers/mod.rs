// Copyright 2015-2020 Aerospike, Inc.
//
// Portions may be licensed to Aerospike, Inc. under one or more contributor
// license agreements.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

//! A fixed-size pool of OS threads plus a `WaitGroup`-style completion
//! barrier, used to fan a batch request out across nodes and block the
//! caller until every per-node task has finished.

use std::sync::{Arc, Condvar, Mutex};

use threadpool::ThreadPool;

/// Blocks a caller until a known number of in-flight tasks have all called
/// `done`. Unlike a plain join handle list, this works when the task count
/// is only known after tasks are already queued on the pool (each task
/// calls `add` for itself, then `done` on completion).
pub struct WaitGroup {
    count: Mutex<usize>,
    condvar: Condvar,
}

impl WaitGroup {
    pub fn new() -> Arc<Self> {
        Arc::new(WaitGroup {
            count: Mutex::new(0),
            condvar: Condvar::new(),
        })
    }

    pub fn add(&self, delta: usize) {
        let mut count = self.count.lock().unwrap();
        *count += delta;
    }

    pub fn done(&self) {
        let mut count = self.count.lock().unwrap();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.condvar.notify_all();
        }
    }

    pub fn wait(&self) {
        let mut count = self.count.lock().unwrap();
        while *count > 0 {
            count = self.condvar.wait(count).unwrap();
        }
    }
}

/// Thin wrapper over [`threadpool::ThreadPool`] that always hands out a
/// [`WaitGroup`] alongside the pool so callers can block for completion of
/// a task fan-out without building their own synchronization each time.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        WorkerPool {
            pool: ThreadPool::new(size.max(1)),
        }
    }

    /// Queues `job`, blocking the caller if every worker thread is already
    /// busy and the pool's internal queue capacity (unbounded, per
    /// `threadpool`'s design) would otherwise grow without limit under
    /// caller-enforced backpressure. For this core, callers instead use
    /// `spawn` paired with a `WaitGroup` sized to the fan-out.
    pub fn spawn<F>(&self, wg: Arc<WaitGroup>, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        wg.add(1);
        self.pool.execute(move || {
            job();
            wg.done();
        });
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn queued_count(&self) -> usize {
        self.pool.queued_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn wait_blocks_until_all_tasks_done() {
        let pool = WorkerPool::new(4);
        let wg = WaitGroup::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = counter.clone();
            pool.spawn(wg.clone(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        wg.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }
}
