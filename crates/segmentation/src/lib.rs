//! Named member segments: the segment contract, the `all`/`none`
//! built-ins, a lazily materializing registry, and member-side
//! segment awareness.

pub mod audience;
pub mod builder;
pub mod builtin;
pub mod key;
pub mod list;
pub mod predicates;
pub mod registry;
pub mod rule;
pub mod segment;
pub mod segmentable;
pub mod store;

pub use audience::Audience;
pub use builder::RuleBuilder;
pub use builtin::{AllSegment, NoneSegment};
pub use key::SegmentKey;
pub use list::ListSegment;
pub use registry::{Registry, SegmentContext, SegmentFactory};
pub use rule::{RuleDefinition, RuleSegment};
pub use segment::{Segment, SegmentHandle};
pub use segmentable::Segmentable;
pub use store::{InMemoryStore, MemberStore, Members};
