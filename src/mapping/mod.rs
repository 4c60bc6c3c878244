//! # Provider Mapping
//!
//! The provider-rule document: how it is retrieved, parsed, and queried.

pub mod parser;
pub mod registry;
pub mod source;

pub use parser::{parse_mapping, parse_mapping_str};
pub use registry::{ProviderRegistry, ProviderRule};
pub use source::{MappingFetcher, MappingSource};
