pub mod convert;
pub mod dedup;
pub mod document;
pub mod extract;
pub mod files;
pub mod html;
pub mod markdown;
pub mod naming;
pub mod normalize;
pub mod paginate;
pub mod pipeline;
pub mod readme;
pub mod rename;
pub mod sequence;
