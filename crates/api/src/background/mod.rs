//! Background jobs spawned by the server binary.

pub mod weekly_limit;
