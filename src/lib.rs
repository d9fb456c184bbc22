//! GitHub proxy and project catalogue backing a portfolio site.
//!
//! The [`server`] module exposes everything over HTTP; the same operations
//! are reachable from the `portfolio-api` command line through [`github`] and
//! [`catalogue`] directly.

pub mod catalogue;
pub mod config;
pub mod error;
pub mod fanout;
pub mod github;
pub mod logging;
pub mod server;

#[cfg(test)]
mod test_support;
