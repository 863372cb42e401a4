//! newsdesk: automated news publishing pipeline.
//!
//! Fetches news candidates, resolves a supporting image, enhances the text
//! into publishable HTML, uploads media, resolves a taxonomy category,
//! creates the article on a WordPress-style CMS and optionally announces it
//! on X.
//!
//! The crate is built around five capability traits (see [`contract`]) so
//! every external service can be mocked in tests; [`pipeline`] holds the
//! per-item state machine and [`batch`] the coordinator that paces many
//! items across topical groups.

pub mod batch;
pub mod cli;
pub mod config;
pub mod contract;
pub mod enhance;
pub mod generate;
pub mod images;
pub mod load_config;
pub mod news;
pub mod pipeline;
pub mod report;
pub mod social;
pub mod wordpress;
