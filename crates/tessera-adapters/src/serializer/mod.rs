//! Document serializers.

mod structured;

pub use structured::StructuredSerializer;
