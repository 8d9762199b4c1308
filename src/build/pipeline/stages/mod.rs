//! Default pipeline stages.
//!
//! Each stage adapts one component to the collection's configured
//! directories:
//!
//! 1. **DedupStage** - Move unique documents into the complete directory
//! 2. **SequenceStage** - Report id gaps, duplicate ids and page gaps
//! 3. **RenameStage** - Rename survivors to `<id>.md`
//! 4. **ReadmeStage** - Write the README index
//! 5. **JsonStage** - Convert documents to JSON and write the docs index
//! 6. **PagesStage** - Paginate the docs index

mod dedup;
mod json;
mod pages;
mod readme;
mod rename;
mod sequence;

pub use dedup::DedupStage;
pub use json::JsonStage;
pub use pages::PagesStage;
pub use readme::ReadmeStage;
pub use rename::RenameStage;
pub use sequence::SequenceStage;
