#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod model;
pub mod rollup;
pub mod time;

pub use error::Error;
pub use time::Clock;
