pub mod memory;
pub mod retrying;
pub mod source;
