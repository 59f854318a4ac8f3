//! The set of chains the user works with.
//!
//! A [`ChainCollection`] owns its chains and the [`Repository`] they are
//! saved to. Every chain gets its own engine from the collection's engine
//! factory, and remembered source files are reloaded through the
//! collection's [`SourceLoader`].

use std::fmt;

use cadena_core::{AudioEngine, Chain, ChainId, ChainParts, SourceLoader};

use crate::codec;
use crate::error::ConfigError;
use crate::example_chains;
use crate::record::ChainRecord;
use crate::repository::Repository;

/// Builds a fresh engine for each chain.
pub type EngineFactory = Box<dyn Fn() -> Box<dyn AudioEngine>>;

/// Prefix of automatically assigned chain names.
pub const NAME_PREFIX: &str = "Queue";

/// An ordered set of chains backed by a repository.
pub struct ChainCollection<R: Repository> {
    chains: Vec<Chain>,
    repo: R,
    engine_factory: EngineFactory,
    loader: Box<dyn SourceLoader>,
}

impl<R: Repository> ChainCollection<R> {
    /// An empty collection. Nothing is read from or written to `repo`.
    pub fn new(repo: R, engine_factory: EngineFactory, loader: Box<dyn SourceLoader>) -> Self {
        Self {
            chains: Vec::new(),
            repo,
            engine_factory,
            loader,
        }
    }

    /// Loads every saved chain.
    ///
    /// Malformed records are repaired one by one (see
    /// [`parse_records`](crate::parse_records)). With nothing saved
    /// yet, or a saved blob that is not a list of chains at all, the bundled
    /// example chains are loaded instead and written back right away so the
    /// next load reads the same data. An unreadable blob is first moved
    /// aside with [`Repository::set_aside_blob`].
    pub fn load_all(
        repo: R,
        engine_factory: EngineFactory,
        loader: Box<dyn SourceLoader>,
    ) -> Result<Self, ConfigError> {
        let mut collection = Self::new(repo, engine_factory, loader);

        let stored = match collection.repo.load_records() {
            Ok(stored) => stored,
            Err(err) if err.is_corrupt_data() => {
                tracing::warn!("saved chains unreadable ({err}), restoring examples");
                collection.repo.set_aside_blob()?;
                None
            }
            Err(err) => return Err(err),
        };

        match stored {
            Some(records) => {
                collection.chains = records.iter().map(|r| collection.restore(r)).collect();
                tracing::info!("loaded {} saved chains", collection.chains.len());
            }
            None => {
                let records = example_chains::example_records();
                collection.chains = records.iter().map(|r| collection.restore(r)).collect();
                collection.save_all()?;
                tracing::info!("first run: stored {} example chains", collection.chains.len());
            }
        }
        Ok(collection)
    }

    fn restore(&self, record: &ChainRecord) -> Chain {
        let mut chain = Chain::from_parts(codec::decode(record), (self.engine_factory)());
        if let Err(err) = chain.restore_source(self.loader.as_ref()) {
            tracing::warn!("chain '{}': {err}", chain.name());
        }
        chain
    }

    /// Writes every chain, replacing the saved collection.
    pub fn save_all(&mut self) -> Result<(), ConfigError> {
        let records: Vec<ChainRecord> = self.chains.iter().map(codec::encode_chain).collect();
        self.repo.store_records(&records)
    }

    /// Writes one chain over its saved record.
    ///
    /// Returns `false` (and writes nothing) when the chain is unknown or has
    /// no saved record yet.
    pub fn save_chain(&mut self, id: &ChainId) -> Result<bool, ConfigError> {
        let Some(chain) = self.get(id) else {
            return Ok(false);
        };
        let record = codec::encode_chain(chain);
        self.repo.update(&record)
    }

    /// Adds a copy of `template` under a fresh id and the next free
    /// `"Queue N"` name, then saves the collection.
    pub fn add(&mut self, template: &ChainParts) -> Result<&mut Chain, ConfigError> {
        let parts = ChainParts {
            id: ChainId::generate(),
            name: self.next_default_name(),
            ..template.clone()
        };
        let mut chain = Chain::from_parts(parts, (self.engine_factory)());
        if let Err(err) = chain.restore_source(self.loader.as_ref()) {
            tracing::warn!("chain '{}': {err}", chain.name());
        }
        tracing::info!("added chain '{}' ({})", chain.name(), chain.id());
        self.chains.push(chain);
        self.save_all()?;
        let index = self.chains.len() - 1;
        Ok(&mut self.chains[index])
    }

    /// Adds a blank chain.
    pub fn add_blank(&mut self) -> Result<&mut Chain, ConfigError> {
        self.add(&ChainParts::blank())
    }

    /// Name for the next added chain: one past the largest number among
    /// names containing `"Queue"`. Gaps are not refilled, and a number too
    /// large to step past is ignored.
    pub fn next_default_name(&self) -> String {
        let next = self
            .chains
            .iter()
            .map(Chain::name)
            .filter(|name| name.contains(NAME_PREFIX))
            .filter_map(|name| {
                name.replace(&format!("{NAME_PREFIX} "), "")
                    .parse::<i64>()
                    .unwrap_or(0)
                    .checked_add(1)
            })
            .max()
            .unwrap_or(1)
            .max(1);
        format!("{NAME_PREFIX} {next}")
    }

    /// Removes the chain with `id` and saves the collection. Returns `false`
    /// if there was no such chain.
    pub fn remove(&mut self, id: &ChainId) -> Result<bool, ConfigError> {
        let before = self.chains.len();
        self.chains.retain(|c| c.id() != id);
        if self.chains.len() == before {
            return Ok(false);
        }
        tracing::info!("removed chain {id}");
        self.save_all()?;
        Ok(true)
    }

    /// Renames a chain and saves it.
    ///
    /// Names must be unique within the collection.
    pub fn rename(&mut self, id: &ChainId, name: &str) -> Result<(), ConfigError> {
        let name = name.trim();
        if self.chains.iter().any(|c| c.id() != id && c.name() == name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
        let chain = self
            .get_mut(id)
            .ok_or_else(|| ConfigError::ChainNotFound(id.to_string()))?;
        chain.rename(name);
        self.save_chain(id)?;
        Ok(())
    }

    /// All chains, in order.
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Iterates over the chains.
    pub fn iter(&self) -> impl Iterator<Item = &Chain> {
        self.chains.iter()
    }

    /// Number of chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` when there are no chains.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// The chain with `id`.
    pub fn get(&self, id: &ChainId) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id() == id)
    }

    /// Mutable access to the chain with `id`.
    pub fn get_mut(&mut self, id: &ChainId) -> Option<&mut Chain> {
        self.chains.iter_mut().find(|c| c.id() == id)
    }

    /// Finds a chain by 1-based position, exact id, or name (case-insensitive).
    pub fn find(&self, key: &str) -> Option<&Chain> {
        if let Ok(n) = key.parse::<usize>()
            && let Some(chain) = n.checked_sub(1).and_then(|i| self.chains.get(i))
        {
            return Some(chain);
        }
        self.chains
            .iter()
            .find(|c| c.id().as_str() == key)
            .or_else(|| self.chains.iter().find(|c| c.name().eq_ignore_ascii_case(key)))
    }

    /// The backing repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Mutable access to the backing repository.
    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    /// Takes a chain out of the collection without saving, e.g. to render it
    /// on a worker. Put it back with [`reinsert`](Self::reinsert).
    pub fn take(&mut self, id: &ChainId) -> Option<(usize, Chain)> {
        let index = self.chains.iter().position(|c| c.id() == id)?;
        Some((index, self.chains.remove(index)))
    }

    /// Puts a taken chain back at `index` (clamped to the end).
    pub fn reinsert(&mut self, index: usize, chain: Chain) {
        let index = index.min(self.chains.len());
        self.chains.insert(index, chain);
    }
}

impl<R: Repository + fmt::Debug> fmt::Debug for ChainCollection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainCollection")
            .field("chains", &self.chains)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use cadena_core::testing::RecordingEngine;
    use cadena_core::{LoadError, SourceBuffer};
    use std::path::Path;

    struct NoFiles;

    impl SourceLoader for NoFiles {
        fn load(&self, path: &Path) -> Result<SourceBuffer, LoadError> {
            Err(format!("{} not available", path.display()).into())
        }
    }

    fn factory() -> EngineFactory {
        Box::new(|| Box::new(RecordingEngine::new().0) as Box<dyn AudioEngine>)
    }

    fn empty() -> ChainCollection<MemoryRepository> {
        ChainCollection::new(MemoryRepository::new(), factory(), Box::new(NoFiles))
    }

    fn named(collection: &mut ChainCollection<MemoryRepository>, names: &[&str]) {
        for name in names {
            let id = collection.add_blank().unwrap().id().clone();
            collection.get_mut(&id).unwrap().rename(*name);
        }
    }

    #[test]
    fn next_name_skips_past_highest_number() {
        let mut c = empty();
        named(&mut c, &["Queue 1", "Queue 3"]);
        assert_eq!(c.next_default_name(), "Queue 4");
        let added = c.add_blank().unwrap();
        assert_eq!(added.name(), "Queue 4");
    }

    #[test]
    fn next_name_ignores_unrelated_names() {
        let mut c = empty();
        assert_eq!(c.next_default_name(), "Queue 1");
        named(&mut c, &["Example queue 1", "Drums", "Queue x"]);
        assert_eq!(c.next_default_name(), "Queue 1");
    }

    #[test]
    fn next_name_survives_the_largest_number() {
        let mut c = empty();
        named(&mut c, &["Queue 9223372036854775807", "Queue 2"]);
        assert_eq!(c.next_default_name(), "Queue 3");

        let mut only_max = empty();
        named(&mut only_max, &["Queue 9223372036854775807"]);
        assert_eq!(only_max.next_default_name(), "Queue 1");
        assert_eq!(only_max.add_blank().unwrap().name(), "Queue 1");
    }

    #[test]
    fn add_copies_template_under_new_id() {
        let mut c = empty();
        let template = ChainParts {
            volume: 0.3,
            ..ChainParts::blank()
        };
        let added = c.add(&template).unwrap();
        assert_ne!(added.id(), &template.id);
        assert_eq!(added.volume(), 0.3);
        assert_eq!(c.repository().writes(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut c = empty();
        let id = c.add_blank().unwrap().id().clone();
        assert!(c.remove(&id).unwrap());
        assert!(!c.remove(&id).unwrap());
        assert!(c.is_empty());
    }

    #[test]
    fn rename_rejects_duplicates() {
        let mut c = empty();
        named(&mut c, &["Queue 1", "Queue 2"]);
        let second = c.chains()[1].id().clone();
        let err = c.rename(&second, "Queue 1").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(_)));
        c.rename(&second, "Vocals").unwrap();
        assert_eq!(c.get(&second).unwrap().name(), "Vocals");
    }

    #[test]
    fn rename_unknown_chain_fails() {
        let mut c = empty();
        let err = c.rename(&ChainId::from("nope"), "x").unwrap_err();
        assert!(matches!(err, ConfigError::ChainNotFound(_)));
    }

    #[test]
    fn find_by_position_id_or_name() {
        let mut c = empty();
        named(&mut c, &["Drums", "Bass"]);
        let bass = c.chains()[1].id().clone();
        assert_eq!(c.find("2").unwrap().id(), &bass);
        assert_eq!(c.find("bass").unwrap().id(), &bass);
        assert_eq!(c.find(bass.as_str()).unwrap().name(), "Bass");
        assert!(c.find("0").is_none());
        assert!(c.find("Guitar").is_none());
    }

    #[test]
    fn take_and_reinsert_keep_order() {
        let mut c = empty();
        named(&mut c, &["A", "B", "C"]);
        let b = c.chains()[1].id().clone();
        let (index, chain) = c.take(&b).unwrap();
        assert_eq!(c.len(), 2);
        c.reinsert(index, chain);
        assert_eq!(c.chains()[1].id(), &b);
    }
}
