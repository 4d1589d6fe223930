pub mod page;
pub mod verdict;

pub use page::{FieldKind, FormDescriptor, PageMetadata};
pub use verdict::{HeuristicMatch, Verdict};
