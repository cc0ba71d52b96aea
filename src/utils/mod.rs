//! Helper modules

pub mod logger;
