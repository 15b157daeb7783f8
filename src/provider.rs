use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::hackernews::HackerNews;
use crate::lobsters::Lobsters;
use crate::model::{Source, Thread};
use crate::reconcile::reconcile_thread;

/// Source-scoped identifier of a discussion item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Number(u64),
    Short(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(id) => write!(f, "{id}"),
            ItemId::Short(id) => f.write_str(id),
        }
    }
}

pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;
    fn source(&self) -> Source;
    fn is_match(&self, url: &str) -> bool;
    fn extract_id(&self, url: &str) -> Result<ItemId>;
    /// Looks for a link to one of this source's items inside free text, such
    /// as a feed entry's description.
    fn extract_id_from_reference(&self, text: &str) -> Result<ItemId>;
    fn fetch_thread(&self, id: &ItemId) -> Result<Thread>;
}

pub struct Registry {
    providers: Vec<Box<dyn Provider>>,
}

impl Registry {
    pub fn new(providers: Vec<Box<dyn Provider>>) -> Self {
        Self { providers }
    }

    pub fn with_defaults(fetcher: Arc<Fetcher>) -> Self {
        Self::new(vec![
            Box::new(HackerNews::new(fetcher.clone())),
            Box::new(Lobsters::new(fetcher)),
        ])
    }

    pub fn providers(&self) -> impl Iterator<Item = &dyn Provider> {
        self.providers.iter().map(|provider| provider.as_ref())
    }

    pub fn provider_for(&self, url: &str) -> Option<&dyn Provider> {
        self.providers().find(|provider| provider.is_match(url))
    }

    /// Finds the provider owning a feed item, trying its url before any
    /// reference embedded in its description.
    pub fn resolve(&self, url: &str, description: Option<&str>) -> Result<(&dyn Provider, ItemId)> {
        for provider in self.providers().filter(|provider| provider.is_match(url)) {
            match provider.extract_id(url) {
                Ok(id) => return Ok((provider, id)),
                Err(Error::NotFound(_)) => {
                    debug!("{} matched {url} but found no item id", provider.name());
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(text) = description {
            for provider in self.providers() {
                match provider.extract_id_from_reference(text) {
                    Ok(id) => return Ok((provider, id)),
                    Err(Error::NotFound(_)) => {}
                    Err(err) => return Err(err),
                }
            }
        }

        Err(Error::UnsupportedSource(url.to_string()))
    }

    /// Resolves, fetches and nests the thread behind a feed item.
    pub fn fetch(&self, url: &str, description: Option<&str>) -> Result<Thread> {
        let (provider, id) = self.resolve(url, description)?;
        debug!("{} owns {url} as item {id}", provider.name());
        let thread = provider.fetch_thread(&id)?;
        Ok(reconcile_thread(thread))
    }
}
