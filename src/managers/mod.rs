pub mod executor;
pub mod node;
pub mod ssh;
pub mod workspace;
