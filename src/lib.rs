pub mod cli;
pub mod error;
pub mod export;
pub mod files;
pub mod fixtures;
pub mod github_provider;
pub mod mapping;
pub mod provider;
pub mod rate_limit;
pub mod release;
pub mod report;
pub mod sync;
