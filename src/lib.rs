#![forbid(unsafe_code)]

pub mod cli;
pub mod convert;
pub mod error;
pub mod import;
pub mod languages;
pub mod logging;
pub mod manifest;
pub mod markup;
pub mod source;
pub mod status;
pub mod store;
pub mod story;
pub mod verify;
