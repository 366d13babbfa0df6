pub mod client;

pub use client::{BatchReport, ContentFetcher, FetchItem, FetchOutcome, HashAlgorithm};
