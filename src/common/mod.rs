//! Common module - digest helpers and formatting utilities shared across the codebase

pub mod digest;
pub mod utils;

pub use digest::DigestUtils;
pub use utils::{FormatUtils, Timer};
