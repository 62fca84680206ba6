// Request-scoped viewer resolution and privileged-caller guards

pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use viewer_context_extractor::{ServiceCaller, Vc};
pub use viewer_context_middleware::*;
