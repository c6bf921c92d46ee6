#![forbid(unsafe_code)]

pub mod cache;
pub mod repository;
pub mod sqlite;
