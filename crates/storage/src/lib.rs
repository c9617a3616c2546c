#![forbid(unsafe_code)]

pub mod auth;
mod mapping;
pub mod remote;
pub mod repository;
pub mod sqlite;
