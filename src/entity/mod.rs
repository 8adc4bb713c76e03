pub mod extraction;
pub mod types;

pub use extraction::{EntityExtractor, PatternEntityExtractor};
pub use types::*;

pub const TARGET_ENTITY: &str = "entity";
