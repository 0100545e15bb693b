pub mod logger;
pub mod process;
pub mod scripted;
pub mod validation;
