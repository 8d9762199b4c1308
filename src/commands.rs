pub mod build_index;
pub mod check_sequence;
pub mod dedup;
pub mod extract;
pub mod index_pages;
pub mod init;
pub mod md_to_json;
pub mod rename;
pub mod run;
