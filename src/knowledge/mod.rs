// Knowledge base — the fixed vocabulary of business-analysis concepts.

pub mod base;
pub mod theory;
