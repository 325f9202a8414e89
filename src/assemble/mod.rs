// Answer assembly — theory templates filled with mapped concepts.

pub mod answer;
pub mod templates;
