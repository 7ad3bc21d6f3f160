//! Chain resolution
//!
//! Starting from one resource, walks its lineage depth-first, extracting the
//! calls of every ancestor exactly once, and orders the resulting resources
//! so that each one comes after everything it was derived from.

use crate::call::{build_calls, Call};
use crate::error::ReifyError;
use crate::extract::Extractor;
use crate::resource::{Action, IdError, ResourceFetcher, ResourceId};
use futures::future::{FutureExt, LocalBoxFuture};
use std::collections::{HashMap, HashSet};

/// Who owns the locally stored copies of fetched resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// The store was supplied by the caller and is left untouched
    #[default]
    External,
    /// The store was created for this run; entries are evicted once their
    /// resource has been reified, and side reads when the walk ends
    Owned,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Carry source field edits over as update options
    pub add_fields: bool,
    pub cache: CacheMode,
}

/// Resources in replay order and the calls that recreate each of them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    pub objects: Vec<ResourceId>,
    pub calls: HashMap<ResourceId, Vec<Call>>,
}

impl Chain {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The resource the chain was resolved for
    pub fn root(&self) -> Option<&ResourceId> {
        self.objects.last()
    }

    pub fn calls_for(&self, id: &ResourceId) -> &[Call] {
        self.calls.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Origins referenced by some call but lacking calls of their own.
    /// Empty for every chain the resolver returns.
    pub fn missing_origins(&self) -> Vec<&ResourceId> {
        let mut missing: Vec<&ResourceId> = self
            .calls
            .values()
            .flatten()
            .flat_map(Call::origins)
            .filter(|origin| !self.calls.contains_key(*origin))
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

/// Mutable state of one resolution
#[derive(Debug, Default)]
pub struct ResolutionContext {
    pub calls: HashMap<ResourceId, Vec<Call>>,
    /// Resources in discovery order, repeats included
    pub objects: Vec<ResourceId>,
}

/// Drop repeated ids, keeping the first sighting
pub fn dedup_first_seen<I>(ids: I) -> Vec<ResourceId>
where
    I: IntoIterator<Item = ResourceId>,
{
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Replay order of a discovery list: ancestors are discovered after their
/// descendants, so the list is read backwards and each id is kept where it
/// is first met
pub fn uniquify(discovered: &[ResourceId]) -> Vec<ResourceId> {
    dedup_first_seen(discovered.iter().rev().cloned())
}

/// Walks resource lineage through a fetcher
pub struct Resolver<'a, F> {
    fetcher: &'a F,
    extractor: Extractor<'a, F>,
    options: ResolveOptions,
}

impl<'a, F: ResourceFetcher> Resolver<'a, F> {
    pub fn new(fetcher: &'a F, options: ResolveOptions) -> Self {
        Self {
            fetcher,
            extractor: Extractor::new(fetcher, options.add_fields),
            options,
        }
    }

    /// Resolve the chain of `raw_id`. A string that is not a resource id
    /// yields an empty chain.
    pub async fn resolve(&self, raw_id: &str) -> Result<Chain, ReifyError> {
        let root = match ResourceId::parse(raw_id) {
            Ok(id) => id,
            Err(IdError::Malformed(raw)) => {
                tracing::warn!("Nothing to reify: '{}' is not a resource id", raw);
                return Ok(Chain::default());
            }
            Err(IdError::UnknownKind(kind)) => return Err(ReifyError::UnsupportedType(kind)),
        };

        let mut context = ResolutionContext {
            calls: HashMap::new(),
            objects: vec![root.clone()],
        };
        let walked = self.reify_resource(&root, &mut context).await;
        if self.options.cache == CacheMode::Owned {
            self.evict_unreified(&context);
        }
        walked?;

        let chain = Chain {
            objects: uniquify(&context.objects),
            calls: context.calls,
        };
        debug_assert!(
            chain.missing_origins().is_empty(),
            "unresolved origins: {:?}",
            chain.missing_origins()
        );

        tracing::info!("Resolved {} resources for {}", chain.objects.len(), root);
        Ok(chain)
    }

    /// Extract the calls of `id` and resolve its origins
    fn reify_resource<'s>(
        &'s self,
        id: &'s ResourceId,
        context: &'s mut ResolutionContext,
    ) -> LocalBoxFuture<'s, Result<(), ReifyError>> {
        async move {
            tracing::info!("Analyzing {}", id);
            let extraction = self.extractor.extract(id).await?;
            self.add(id, build_calls(id, extraction), context).await?;

            if self.options.cache == CacheMode::Owned {
                self.fetcher.evict(id);
            }
            Ok(())
        }
        .boxed_local()
    }

    /// Evict resources that were read but never reified: models compared
    /// against on behalf of an ensemble or a prediction, and anything left
    /// over by a failed walk
    fn evict_unreified(&self, context: &ResolutionContext) {
        for id in self.extractor.fetched() {
            if !context.calls.contains_key(&id) {
                tracing::debug!("Evicting {}", id);
                self.fetcher.evict(&id);
            }
        }
    }

    async fn add(
        &self,
        id: &ResourceId,
        calls: Vec<Call>,
        context: &mut ResolutionContext,
    ) -> Result<(), ReifyError> {
        context
            .calls
            .entry(id.clone())
            .or_insert_with(|| calls.clone());

        for call in &calls {
            for origin in call.origins() {
                if !context.objects.contains(origin) {
                    tracing::debug!("New origin found for {}: {}", id, origin);
                }
                context.objects.push(origin.clone());

                if !context.calls.contains_key(origin) {
                    self.reify_resource(origin, context).await?;
                } else {
                    // Already resolved: its own origins move up with it
                    let rediscovered: Vec<ResourceId> = context
                        .calls
                        .get(origin)
                        .into_iter()
                        .flatten()
                        .filter(|known| known.action == Action::Create)
                        .flat_map(|known| known.origins().cloned())
                        .collect();
                    context.objects.extend(rediscovered);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryFetcher;
    use serde_json::json;
    use std::cell::RefCell;

    const SOURCE: &str = "source/5143a51a37203f2cf7000001";
    const DATASET: &str = "dataset/5143a51a37203f2cf7000002";
    const MODEL: &str = "model/5143a51a37203f2cf7000003";

    fn id(raw: &str) -> ResourceId {
        ResourceId::parse(raw).unwrap()
    }

    fn fetcher() -> MemoryFetcher {
        MemoryFetcher::new()
            .with(json!({"resource": SOURCE, "name": "iris.csv", "file_name": "iris.csv"}))
            .with(json!({"resource": DATASET, "name": "iris.csv dataset", "source": SOURCE}))
            .with(json!({"resource": MODEL, "name": "iris.csv dataset model", "dataset": DATASET}))
    }

    /// Records evictions on top of a memory fetcher
    struct Recording {
        inner: MemoryFetcher,
        evicted: RefCell<Vec<ResourceId>>,
    }

    impl ResourceFetcher for Recording {
        async fn fetch(&self, id: &ResourceId) -> Result<serde_json::Value, crate::resource::FetchError> {
            self.inner.fetch(id).await
        }

        fn evict(&self, id: &ResourceId) {
            self.evicted.borrow_mut().push(id.clone());
        }
    }

    #[test]
    fn test_uniquify_reverses_and_keeps_first_sighting() {
        let discovered = vec![id(MODEL), id(DATASET), id(SOURCE), id(DATASET), id(SOURCE)];
        assert_eq!(uniquify(&discovered), vec![id(SOURCE), id(DATASET), id(MODEL)]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let once = dedup_first_seen(vec![id(SOURCE), id(MODEL), id(SOURCE), id(DATASET)]);
        assert_eq!(once, vec![id(SOURCE), id(MODEL), id(DATASET)]);
        assert_eq!(dedup_first_seen(once.clone()), once);
    }

    #[test]
    fn test_missing_origins() {
        let mut chain = Chain::default();
        chain.objects.push(id(DATASET));
        chain.calls.insert(
            id(DATASET),
            vec![Call::create(
                &id(DATASET),
                vec![crate::call::Argument::Resource(id(SOURCE))],
                Default::default(),
            )],
        );
        assert_eq!(chain.missing_origins(), vec![&id(SOURCE)]);
    }

    #[tokio::test]
    async fn test_malformed_root_is_a_no_op() {
        let fetcher = fetcher();
        let resolver = Resolver::new(&fetcher, ResolveOptions::default());
        let chain = resolver.resolve("not a resource").await.unwrap();
        assert!(chain.is_empty());
        assert!(chain.calls.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_type_is_an_error() {
        let fetcher = fetcher();
        let resolver = Resolver::new(&fetcher, ResolveOptions::default());
        let result = resolver.resolve("project/5143a51a37203f2cf7000001").await;
        assert!(matches!(result, Err(ReifyError::UnsupportedType(kind)) if kind == "project"));
    }

    #[tokio::test]
    async fn test_owned_cache_is_evicted() {
        let recording = Recording {
            inner: fetcher(),
            evicted: RefCell::new(Vec::new()),
        };

        let options = ResolveOptions {
            cache: CacheMode::Owned,
            ..ResolveOptions::default()
        };
        let chain = Resolver::new(&recording, options).resolve(MODEL).await.unwrap();
        assert_eq!(chain.objects, vec![id(SOURCE), id(DATASET), id(MODEL)]);
        // Ancestors finish first
        assert_eq!(
            *recording.evicted.borrow(),
            vec![id(SOURCE), id(DATASET), id(MODEL)]
        );

        recording.evicted.borrow_mut().clear();
        Resolver::new(&recording, ResolveOptions::default())
            .resolve(MODEL)
            .await
            .unwrap();
        assert!(recording.evicted.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_owned_cache_evicts_inspected_models() {
        const MEMBER: &str = "model/5143a51a37203f2cf7000013";
        const ENSEMBLE: &str = "ensemble/5143a51a37203f2cf7000005";
        let recording = Recording {
            inner: fetcher()
                .with(json!({"resource": MEMBER, "dataset": DATASET, "ensemble_id": ENSEMBLE}))
                .with(json!({"resource": ENSEMBLE, "dataset": DATASET, "models": [MEMBER]})),
            evicted: RefCell::new(Vec::new()),
        };

        let options = ResolveOptions {
            cache: CacheMode::Owned,
            ..ResolveOptions::default()
        };
        let chain = Resolver::new(&recording, options).resolve(ENSEMBLE).await.unwrap();
        assert!(!chain.calls.contains_key(&id(MEMBER)));
        assert!(recording.evicted.borrow().contains(&id(MEMBER)));
        assert!(recording.evicted.borrow().contains(&id(ENSEMBLE)));
    }

    #[tokio::test]
    async fn test_failed_walk_still_evicts() {
        let recording = Recording {
            inner: MemoryFetcher::new()
                .with(json!({"resource": DATASET, "name": "iris.csv dataset", "source": SOURCE})),
            evicted: RefCell::new(Vec::new()),
        };

        let options = ResolveOptions {
            cache: CacheMode::Owned,
            ..ResolveOptions::default()
        };
        let result = Resolver::new(&recording, options).resolve(DATASET).await;
        assert!(matches!(result, Err(ReifyError::MissingResource(_))));
        assert!(recording.evicted.borrow().contains(&id(DATASET)));
    }
}
