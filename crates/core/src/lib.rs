pub mod config;
pub mod domain;
pub mod imaging;
pub mod ingest;
pub mod selection;
pub mod storage;
pub mod time;
