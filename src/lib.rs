#![forbid(unsafe_code)]

pub use borderless;

pub mod basis;
pub mod client;
pub mod errors;
pub mod imports;
pub mod model;
pub mod statement;
pub mod util;
