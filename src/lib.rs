#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod error;
pub mod fetch;
pub mod http;
pub mod links;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod sanitize;
