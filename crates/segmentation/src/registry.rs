//! Segment registry: name to segment mapping with lazy, cached
//! materialization.
//!
//! Descriptors move one way: registered (factory only) to materialized
//! (factory plus cached instance). Registration is closed by [`Registry::seal`];
//! lookups are safe from any thread at any time.

use audience_core::{AudienceError, AudienceResult, Member, MissPolicy};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::builtin::{AllSegment, NoneSegment, ALL, NONE, RESERVED};
use crate::key::SegmentKey;
use crate::segment::{Segment, SegmentHandle};
use crate::store::MemberStore;

/// Builds a segment on first lookup.
pub type SegmentFactory<M> =
    Box<dyn Fn(&SegmentContext<M>) -> AudienceResult<Box<dyn Segment<M>>> + Send + Sync>;

/// What a factory gets to work with when it is finally invoked.
pub struct SegmentContext<M: Member> {
    name: SegmentKey,
    store: Arc<dyn MemberStore<M>>,
}

impl<M: Member> SegmentContext<M> {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn store(&self) -> Arc<dyn MemberStore<M>> {
        Arc::clone(&self.store)
    }
}

struct Descriptor<M: Member> {
    factory: SegmentFactory<M>,
    instance: Mutex<Option<Arc<SegmentHandle<M>>>>,
}

impl<M: Member> Descriptor<M> {
    fn new(factory: SegmentFactory<M>) -> Self {
        Self {
            factory,
            instance: Mutex::new(None),
        }
    }

    fn is_materialized(&self) -> bool {
        self.instance.lock().is_some()
    }

    /// Construct at most once. The slot stays locked for the duration of the
    /// factory call so concurrent first lookups wait for the same instance;
    /// a failed construction leaves the slot empty.
    fn materialize(
        &self,
        key: &SegmentKey,
        store: &Arc<dyn MemberStore<M>>,
    ) -> AudienceResult<Arc<SegmentHandle<M>>> {
        let mut slot = self.instance.lock();
        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(handle));
        }

        let context = SegmentContext {
            name: key.clone(),
            store: Arc::clone(store),
        };
        match (self.factory)(&context) {
            Ok(segment) => {
                let handle = Arc::new(SegmentHandle::new(key.clone(), segment));
                *slot = Some(Arc::clone(&handle));
                debug!(segment = %key, "Segment materialized");
                Ok(handle)
            }
            Err(e) => {
                warn!(segment = %key, error = %e, "Segment construction failed");
                Err(e)
            }
        }
    }
}

struct Table<M: Member> {
    order: Vec<SegmentKey>,
    descriptors: HashMap<SegmentKey, Arc<Descriptor<M>>>,
}

/// Process-wide catalog of named segments for one member type.
///
/// Sealing only closes registration. Lookups, `valid` and `segments` are
/// allowed before `seal()` and then see the catalog as registered so far;
/// hosts that need the complete catalog must register everything and seal
/// before handing the registry to readers.
pub struct Registry<M: Member> {
    store: Arc<dyn MemberStore<M>>,
    miss_policy: MissPolicy,
    table: RwLock<Table<M>>,
    sealed: AtomicBool,
}

impl<M: Member> Registry<M> {
    pub fn new(store: Arc<dyn MemberStore<M>>) -> Self {
        Self::with_policy(store, MissPolicy::default())
    }

    /// Create a registry holding only the `all` and `none` built-ins.
    pub fn with_policy(store: Arc<dyn MemberStore<M>>, miss_policy: MissPolicy) -> Self {
        let mut table = Table {
            order: Vec::new(),
            descriptors: HashMap::new(),
        };
        let builtins: [(&str, SegmentFactory<M>); 2] = [
            (
                ALL,
                Box::new(|ctx: &SegmentContext<M>| {
                    Ok(Box::new(AllSegment::new(ctx.store())) as Box<dyn Segment<M>>)
                }),
            ),
            (
                NONE,
                Box::new(|ctx: &SegmentContext<M>| {
                    Ok(Box::new(NoneSegment::new(ctx.store())) as Box<dyn Segment<M>>)
                }),
            ),
        ];
        for (name, factory) in builtins {
            let key = SegmentKey::builtin(name);
            table.order.push(key.clone());
            table.descriptors.insert(key, Arc::new(Descriptor::new(factory)));
        }

        Self {
            store,
            miss_policy,
            table: RwLock::new(table),
            sealed: AtomicBool::new(false),
        }
    }

    /// Register a segment under `name`, to be constructed by `factory` on
    /// first lookup.
    pub fn register<S, F>(&self, name: impl AsRef<str>, factory: F) -> AudienceResult<()>
    where
        S: Segment<M> + 'static,
        F: Fn(&SegmentContext<M>) -> AudienceResult<S> + Send + Sync + 'static,
    {
        self.register_boxed(
            name,
            Box::new(move |ctx: &SegmentContext<M>| {
                factory(ctx).map(|s| Box::new(s) as Box<dyn Segment<M>>)
            }),
        )
    }

    pub fn register_boxed(
        &self,
        name: impl AsRef<str>,
        factory: SegmentFactory<M>,
    ) -> AudienceResult<()> {
        let key = SegmentKey::parse(name)?;
        let mut table = self.table.write();

        if self.sealed.load(Ordering::Acquire) {
            return Err(AudienceError::Sealed(key.to_string()));
        }
        if RESERVED.contains(&key.as_str()) {
            return Err(AudienceError::ReservedName(key.to_string()));
        }
        if table.descriptors.contains_key(&key) {
            return Err(AudienceError::DuplicateName(key.to_string()));
        }

        table.order.push(key.clone());
        table
            .descriptors
            .insert(key.clone(), Arc::new(Descriptor::new(factory)));
        info!(segment = %key, total = table.order.len(), "Segment registered");
        Ok(())
    }

    /// Close registration. Idempotent.
    pub fn seal(&self) {
        let table = self.table.write();
        if !self.sealed.swap(true, Ordering::AcqRel) {
            info!(segments = table.order.len(), "Segment registry sealed");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub fn miss_policy(&self) -> MissPolicy {
        self.miss_policy
    }

    /// Resolve `name`, materializing it if this is the first lookup.
    pub fn segment(&self, name: impl AsRef<str>) -> AudienceResult<Arc<SegmentHandle<M>>> {
        let key = SegmentKey::parse(name)?;
        let descriptor = self.table.read().descriptors.get(&key).cloned();
        match descriptor {
            Some(descriptor) => descriptor.materialize(&key, &self.store),
            None => match self.miss_policy {
                MissPolicy::Strict => Err(AudienceError::NotFound(key.to_string())),
                MissPolicy::FallbackNone => {
                    warn!(segment = %key, "Unknown segment, falling back to none");
                    self.segment(NONE)
                }
            },
        }
    }

    /// Whether `name` is registered. Never materializes.
    pub fn valid(&self, name: impl AsRef<str>) -> bool {
        SegmentKey::parse(name)
            .map(|key| self.table.read().descriptors.contains_key(&key))
            .unwrap_or(false)
    }

    /// Whether `name` has already been constructed.
    pub fn is_materialized(&self, name: impl AsRef<str>) -> bool {
        let Ok(key) = SegmentKey::parse(name) else {
            return false;
        };
        self.table
            .read()
            .descriptors
            .get(&key)
            .is_some_and(|d| d.is_materialized())
    }

    /// Registered names in registration order, built-ins first.
    pub fn segment_names(&self) -> Vec<String> {
        self.table
            .read()
            .order
            .iter()
            .map(|key| key.to_string())
            .collect()
    }

    /// Every registered segment, materializing any not yet built.
    pub fn segments(&self) -> AudienceResult<Vec<Arc<SegmentHandle<M>>>> {
        let entries: Vec<_> = {
            let table = self.table.read();
            table
                .order
                .iter()
                .filter_map(|key| {
                    table
                        .descriptors
                        .get(key)
                        .map(|d| (key.clone(), Arc::clone(d)))
                })
                .collect()
        };
        entries
            .iter()
            .map(|(key, descriptor)| descriptor.materialize(key, &self.store))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: Member> fmt::Debug for Registry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("segments", &self.segment_names())
            .field("miss_policy", &self.miss_policy)
            .field("sealed", &self.is_sealed())
            .finish_non_exhaustive()
    }
}
