//! Our caching system keeps contexts and login tokens around between runs.
//!
//! To use the cache system, implement the Cacheable and CacheKey traits, then you can
//! use the read() and write() methods of a [Cache].
use crate::api::AuthToken;
use crate::context::{Context, ContextName};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// You need a cache key in order to read something for cache.
pub trait CacheKey {
    fn as_path(&self) -> String;
}

/// Anything that can be cached needs to implement this trait.
///
/// Cacheable has an associated type so that we can always pair up a struct to be cached
/// with its cache key. Reading a `Context` with anything but a `ContextName` will not compile.
///
/// There is nothing stopping you from using the same CacheKey type for multiple Cacheables.
pub trait Cacheable {
    type CacheKey;

    fn cache_key(&self) -> Self::CacheKey;

    /// All structs of the same type will be saved in the same folder, so that we can answer
    /// questions like "what contexts do we have". Type ids should be unique.
    fn type_id() -> &'static str;
}

/// A folder of JSON files, one sub folder per cacheable type.
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    /// The cache in the user's home folder.
    pub fn user_cache() -> Result<Cache, crate::Error> {
        let home = std::env::var("HOME")?;

        let mut root = PathBuf::from(home);
        root.push(".cache");
        root.push("askdb");
        root.push("cache");
        root.push("v1");

        Ok(Cache { root })
    }

    pub fn at(root: PathBuf) -> Cache {
        Cache { root }
    }

    pub fn read<D, K>(&self, cache_key: &K) -> Result<D, crate::Error>
    where
        // Makes sure we can only read() to structs that are actually meant to be read from that
        // key type.
        D: Cacheable<CacheKey = K> + DeserializeOwned,
        K: CacheKey,
    {
        let file_location = self.path(D::type_id(), cache_key.as_path().as_str())?;

        let data = serde_json::from_reader(fs::File::open(file_location)?)?;

        Ok(data)
    }

    pub fn write<D, K>(&self, data: &D) -> Result<(), crate::Error>
    where
        D: Cacheable<CacheKey = K> + Serialize,
        K: CacheKey,
    {
        let file_location = self.path(D::type_id(), data.cache_key().as_path().as_str())?;

        let data = serde_json::to_string(&data)?;

        fs::write(file_location, data)?;

        Ok(())
    }

    /// Removing something that is not there is fine.
    pub fn remove<D, K>(&self, cache_key: &K) -> Result<(), crate::Error>
    where
        D: Cacheable<CacheKey = K>,
        K: CacheKey,
    {
        let file_location = self.path(D::type_id(), cache_key.as_path().as_str())?;

        match fs::remove_file(&file_location) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    pub fn read_all<D>(&self) -> Result<Vec<D>, crate::Error>
    where
        D: Cacheable + DeserializeOwned,
    {
        let folder = self.require_folder(D::type_id())?;
        let mut all = Vec::new();

        for entry in fs::read_dir(folder)? {
            let path = entry?.path();

            match serde_json::from_reader(fs::File::open(&path)?) {
                Ok(data) => all.push(data),
                Err(error) => debug!("Skipping unreadable cache file {path:?}: {error}"),
            }
        }

        Ok(all)
    }

    fn path(&self, type_id: &'static str, cache_key: &str) -> Result<PathBuf, crate::Error> {
        let mut location = self.require_folder(type_id)?;

        location.push(cache_key);

        Ok(location)
    }

    fn require_folder(&self, type_id: &'static str) -> Result<PathBuf, crate::Error> {
        let path = self.root.join(type_id);

        fs::create_dir_all(&path)?;

        Ok(path)
    }
}

// Please dump all impls here, so we keep the rest of the code base clean.

impl Cacheable for Context {
    type CacheKey = ContextName;

    fn cache_key(&self) -> Self::CacheKey {
        self.name.clone()
    }

    fn type_id() -> &'static str {
        "context"
    }
}

impl CacheKey for ContextName {
    fn as_path(&self) -> String {
        format!("context_{}.json", self)
    }
}

impl Cacheable for ContextName {
    type CacheKey = SharedCacheKey;

    fn cache_key(&self) -> Self::CacheKey {
        SharedCacheKey(Self::type_id().to_owned())
    }

    fn type_id() -> &'static str {
        "current_context"
    }
}

/// Tokens are per context, so you can be logged in to several APIs at once.
impl Cacheable for AuthToken {
    type CacheKey = ContextName;

    fn cache_key(&self) -> Self::CacheKey {
        self.context.clone()
    }

    fn type_id() -> &'static str {
        "token"
    }
}

pub struct SharedCacheKey(String);

impl CacheKey for SharedCacheKey {
    fn as_path(&self) -> String {
        self.0.clone()
    }
}

impl SharedCacheKey {
    pub fn current_context() -> SharedCacheKey {
        SharedCacheKey(ContextName::type_id().to_owned())
    }
}
