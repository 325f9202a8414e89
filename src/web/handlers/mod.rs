pub mod analyze;
pub mod concepts;
pub mod export;
