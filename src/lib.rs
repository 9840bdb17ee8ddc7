pub mod app;
pub mod cohort;
pub mod config;
pub mod domain;
pub mod error;
pub mod loader;
pub mod models;
pub mod output;
pub mod ped;
pub mod pedigree;
pub mod shortcuts;
pub mod union_find;
