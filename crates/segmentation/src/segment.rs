//! Segment capability contract and the named handle the registry hands out.

use audience_core::{AudienceError, AudienceResult, Member};
use rand::seq::IteratorRandom;
use std::fmt;

use crate::key::SegmentKey;
use crate::store::Members;

/// A named subset of members. Membership is computed against the live
/// population, never snapshotted.
///
/// `members` and `include` are mandatory. `add` and `remove` default to
/// `NotImplemented`; read-only variants may override them to decline with
/// `UnsupportedOperation` or to do nothing.
pub trait Segment<M: Member>: Send + Sync {
    fn members(&self) -> AudienceResult<Members<M>>;

    fn include(&self, member: &M) -> AudienceResult<bool>;

    fn add(&self, _member: &M) -> AudienceResult<()> {
        Err(AudienceError::NotImplemented { operation: "add" })
    }

    fn remove(&self, _member: &M) -> AudienceResult<()> {
        Err(AudienceError::NotImplemented { operation: "remove" })
    }

    fn size(&self) -> AudienceResult<usize> {
        Ok(self.members()?.count())
    }

    /// Up to `amount` members chosen uniformly at random.
    fn sample(&self, amount: usize) -> AudienceResult<Vec<M>> {
        let mut rng = rand::thread_rng();
        Ok(self.members()?.choose_multiple(&mut rng, amount))
    }
}

/// A materialized segment together with the name it was registered under.
///
/// The name is fixed at construction; every segment operation forwards to
/// the wrapped variant.
pub struct SegmentHandle<M: Member> {
    name: SegmentKey,
    inner: Box<dyn Segment<M>>,
}

impl<M: Member> SegmentHandle<M> {
    pub(crate) fn new(name: SegmentKey, inner: Box<dyn Segment<M>>) -> Self {
        Self { name, inner }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn key(&self) -> &SegmentKey {
        &self.name
    }

    pub fn members(&self) -> AudienceResult<Members<M>> {
        self.inner.members()
    }

    pub fn include(&self, member: &M) -> AudienceResult<bool> {
        self.inner.include(member)
    }

    pub fn add(&self, member: &M) -> AudienceResult<()> {
        self.inner.add(member)
    }

    pub fn remove(&self, member: &M) -> AudienceResult<()> {
        self.inner.remove(member)
    }

    pub fn size(&self) -> AudienceResult<usize> {
        self.inner.size()
    }

    pub fn sample(&self, amount: usize) -> AudienceResult<Vec<M>> {
        self.inner.sample(amount)
    }

    /// Visit every member in `members()` order.
    pub fn each<F>(&self, mut f: F) -> AudienceResult<()>
    where
        F: FnMut(M),
    {
        for member in self.members()? {
            f(member);
        }
        Ok(())
    }

    /// Visit members in batches of at most `batch_size`. A zero batch size
    /// is treated as one.
    pub fn each_batch<F>(&self, batch_size: usize, mut f: F) -> AudienceResult<()>
    where
        F: FnMut(Vec<M>),
    {
        let batch_size = batch_size.max(1);
        let mut batch = Vec::with_capacity(batch_size);
        for member in self.members()? {
            batch.push(member);
            if batch.len() == batch_size {
                f(std::mem::replace(&mut batch, Vec::with_capacity(batch_size)));
            }
        }
        if !batch.is_empty() {
            f(batch);
        }
        Ok(())
    }
}

impl<M: Member> fmt::Debug for SegmentHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentHandle")
            .field("name", &self.name.as_str())
            .finish_non_exhaustive()
    }
}
