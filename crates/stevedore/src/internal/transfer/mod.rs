pub mod directory;
pub mod local;
pub mod node;
