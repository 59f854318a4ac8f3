//! Debounced saving of edited chains.
//!
//! Call [`AutoSave::observe`] after every edit and [`AutoSave::poll`] from
//! the event loop. A chain is written once its edits have been quiet for the
//! configured delay, with the state it had at its last edit; bursts of edits
//! produce a single write.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use cadena_core::{Chain, ChainId, DEFAULT_DEBOUNCE, Debouncer};

use crate::codec;
use crate::error::ConfigError;
use crate::record::ChainRecord;
use crate::repository::Repository;

/// Per-chain debounced writer.
#[derive(Debug)]
pub struct AutoSave {
    delay: Duration,
    pending: HashMap<ChainId, Debouncer<ChainRecord>>,
    seen: HashMap<ChainId, u64>,
}

impl AutoSave {
    /// Writes chains `delay` after their last observed edit.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
            seen: HashMap::new(),
        }
    }

    /// Records `chain`'s current revision without scheduling a write.
    pub fn track(&mut self, chain: &Chain) {
        self.seen.insert(chain.id().clone(), chain.revision());
    }

    /// Schedules a write of `chain` if it changed since it was last seen.
    ///
    /// A chain seen for the first time is only tracked. Returns `true` when
    /// a write was (re)scheduled.
    pub fn observe(&mut self, chain: &Chain, now: Instant) -> bool {
        let revision = chain.revision();
        match self.seen.insert(chain.id().clone(), revision) {
            Some(previous) if previous != revision => {
                let delay = self.delay;
                self.pending
                    .entry(chain.id().clone())
                    .or_insert_with(|| Debouncer::new(delay))
                    .schedule(codec::encode_chain(chain), now);
                true
            }
            _ => false,
        }
    }

    /// Writes every record whose quiet period has elapsed. Returns how many
    /// records the repository accepted.
    pub fn poll<R: Repository + ?Sized>(
        &mut self,
        now: Instant,
        repo: &mut R,
    ) -> Result<usize, ConfigError> {
        let due: Vec<ChainRecord> = self
            .pending
            .values_mut()
            .filter_map(|d| d.poll(now))
            .collect();
        self.pending.retain(|_, d| d.is_pending());
        write_all(&due, repo)
    }

    /// Writes everything pending right away.
    pub fn flush<R: Repository + ?Sized>(&mut self, repo: &mut R) -> Result<usize, ConfigError> {
        let due: Vec<ChainRecord> = self
            .pending
            .drain()
            .filter_map(|(_, mut d)| d.flush())
            .collect();
        write_all(&due, repo)
    }

    /// Drops any pending write for a removed chain.
    pub fn forget(&mut self, id: &ChainId) {
        self.pending.remove(id);
        self.seen.remove(id);
    }

    /// Returns `true` while any write is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.values().any(Debouncer::is_pending)
    }
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

fn write_all<R: Repository + ?Sized>(
    records: &[ChainRecord],
    repo: &mut R,
) -> Result<usize, ConfigError> {
    let mut written = 0;
    for record in records {
        if repo.update(record)? {
            tracing::debug!("autosaved chain '{}'", record.name);
            written += 1;
        }
    }
    Ok(written)
}
