//! The audience context: one member type, its store, and its registry.
//!
//! Components that need segmentation take an `&Audience<M>` explicitly. A
//! host may additionally designate one audience for the whole process with
//! [`Audience::install`], which pins the process to a single member type.

use audience_core::{AudienceConfig, AudienceError, AudienceResult, Member};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::info;

use crate::registry::{Registry, SegmentContext};
use crate::segment::{Segment, SegmentHandle};
use crate::store::MemberStore;

struct Designation {
    member_type: &'static str,
    audience: Arc<dyn Any + Send + Sync>,
}

static DESIGNATED: OnceLock<Designation> = OnceLock::new();

pub struct Audience<M: Member> {
    registry: Registry<M>,
    config: AudienceConfig,
}

impl<M: Member> Audience<M> {
    pub fn new(store: Arc<dyn MemberStore<M>>) -> Self {
        Self::with_config(store, AudienceConfig::default())
    }

    pub fn with_config(store: Arc<dyn MemberStore<M>>, config: AudienceConfig) -> Self {
        Self {
            registry: Registry::with_policy(store, config.lookup_miss),
            config,
        }
    }

    pub fn config(&self) -> &AudienceConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry<M> {
        &self.registry
    }

    pub fn register<S, F>(&self, name: impl AsRef<str>, factory: F) -> AudienceResult<()>
    where
        S: Segment<M> + 'static,
        F: Fn(&SegmentContext<M>) -> AudienceResult<S> + Send + Sync + 'static,
    {
        self.registry.register(name, factory)
    }

    pub fn seal(&self) {
        self.registry.seal();
    }

    pub fn segment(&self, name: impl AsRef<str>) -> AudienceResult<Arc<SegmentHandle<M>>> {
        self.registry.segment(name)
    }

    pub fn valid_segment(&self, name: impl AsRef<str>) -> bool {
        self.registry.valid(name)
    }

    pub fn segment_names(&self) -> Vec<String> {
        self.registry.segment_names()
    }

    pub fn segments(&self) -> AudienceResult<Vec<Arc<SegmentHandle<M>>>> {
        self.registry.segments()
    }

    /// Walk a segment's members in batches of the configured size.
    pub fn each_batch<F>(&self, name: impl AsRef<str>, f: F) -> AudienceResult<()>
    where
        F: FnMut(Vec<M>),
    {
        self.segment(name)?.each_batch(self.config.batch_size, f)
    }

    /// Seal this audience and designate it, and its member type, for the
    /// process. Succeeds once; later calls fail whatever their member type.
    pub fn install(self: Arc<Self>) -> AudienceResult<Arc<Self>> {
        self.seal();
        let designation = Designation {
            member_type: type_name::<M>(),
            audience: Arc::clone(&self) as Arc<dyn Any + Send + Sync>,
        };
        match DESIGNATED.set(designation) {
            Ok(()) => {
                info!(
                    member_type = type_name::<M>(),
                    segments = self.registry.len(),
                    "Audience installed"
                );
                Ok(self)
            }
            Err(_) => Err(AudienceError::MemberTypeAlreadyDesignated {
                existing: DESIGNATED.get().map_or("unknown", |d| d.member_type),
                attempted: type_name::<M>(),
            }),
        }
    }

    /// The process-wide audience installed for `M`.
    pub fn global() -> AudienceResult<Arc<Self>> {
        let designation = DESIGNATED.get().ok_or(AudienceError::NoDesignatedMember)?;
        Arc::clone(&designation.audience)
            .downcast::<Self>()
            .map_err(|_| AudienceError::MemberTypeMismatch {
                designated: designation.member_type,
                requested: type_name::<M>(),
            })
    }
}

impl<M: Member> fmt::Debug for Audience<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Audience")
            .field("member_type", &type_name::<M>())
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use audience_core::{MissPolicy, Profile};

    fn audience() -> Audience<Profile> {
        let store = InMemoryStore::with_members((0..5).map(|i| Profile::new(format!("u{i}"))));
        Audience::new(Arc::new(store))
    }

    #[test]
    fn test_each_batch_uses_configured_size() {
        let store = InMemoryStore::with_members((0..5).map(|i| Profile::new(format!("u{i}"))));
        let config = AudienceConfig {
            batch_size: 2,
            ..AudienceConfig::default()
        };
        let audience: Audience<Profile> = Audience::with_config(Arc::new(store), config);

        let mut sizes = Vec::new();
        audience
            .each_batch("all", |batch| sizes.push(batch.len()))
            .unwrap();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_config_policy_reaches_registry() {
        let config = AudienceConfig {
            lookup_miss: MissPolicy::FallbackNone,
            ..AudienceConfig::default()
        };
        let audience: Audience<Profile> =
            Audience::with_config(Arc::new(InMemoryStore::<Profile>::new()), config);
        assert_eq!(audience.registry().miss_policy(), MissPolicy::FallbackNone);
        assert_eq!(audience.segment("ghost").unwrap().name(), "none");
    }

    #[test]
    fn test_all_members_match_store() {
        let audience = audience();
        let ids: Vec<_> = audience
            .segment("all")
            .unwrap()
            .members()
            .unwrap()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["u0", "u1", "u2", "u3", "u4"]);
        assert_eq!(audience.segment("none").unwrap().size().unwrap(), 0);
    }
}
