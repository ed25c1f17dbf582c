#[macro_use]
pub(crate) mod common;
pub mod catalog;
pub mod data;
pub mod transfer;
pub mod worker;

#[cfg(test)]
pub mod tests;
