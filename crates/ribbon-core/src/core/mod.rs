mod registry;
mod segment;
mod span;

pub use registry::{Registry, ResourceIndex};
pub use segment::Segment;
pub use span::Span;
