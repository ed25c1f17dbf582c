pub mod copy;
pub mod listener;
pub mod location;
pub mod logical;
pub mod registry;
