//! # Article Forge
//!
//! Produces long-form articles by passing a draft through a fixed sequence of
//! personas (writer, editors, SEO reviewer, simulated audience) on a chat
//! completion service, under a running cost budget, and renders the result
//! to PDF.
//!
//! ## Modules
//! - [`pipeline`] - stage sequencing, call execution with retry, budget gate
//! - [`budget`] - cost estimation and interactive confirmation
//! - [`llm`] - completion service client
//! - [`research`] - research report for pipelines that draft from one
//! - [`artifact`] - sanitization and PDF rendering
//! - [`forge`] - end-to-end article production

pub mod artifact;
pub mod budget;
pub mod config;
pub mod forge;
pub mod llm;
pub mod pipeline;
pub mod research;

pub use config::Config;
pub use forge::{ArticleForge, ArticleReport};
