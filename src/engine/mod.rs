pub mod action_url;
mod assembler;
pub mod builder;
mod extractor;
mod resolver;
pub mod templating;

pub use builder::{CardBuildError, CardBuilder};
pub use templating::{expand_card, TemplateValues};
