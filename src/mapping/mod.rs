// Concept mapping — extracted phrases onto knowledge-base concepts.

pub mod embeddings;
pub mod fuzzy;
pub mod mapper;
pub mod semantic;
