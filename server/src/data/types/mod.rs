//! Data transfer types shared between the storage layer and the API

pub mod span;
pub mod table;
pub mod trace;
