#![allow(clippy::needless_range_loop)]

pub mod bench;
pub mod config;
pub mod encoding;
pub mod engine;
pub mod env;
pub mod error;
pub mod matvec;
pub mod oracle;
pub mod poly_eval;
pub mod report;
pub mod sampler;
pub mod storage;
pub mod utils;

pub use error::KernelError;
