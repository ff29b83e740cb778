//! Analytical advisor client.
//!
//! [`HttpWeightAdvisor`] talks to a text-generation endpoint that accepts a
//! prompt and returns free-form content. The first JSON object in that
//! content is taken as the proposal; everything else about the reply is
//! ignored.

mod http;
mod prompt;

pub use http::{DEFAULT_MODEL_ID, HttpAdvisorConfig, HttpWeightAdvisor};
pub use prompt::{build_prompt, parse_proposal};
