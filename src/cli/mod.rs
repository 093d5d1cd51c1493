pub mod chatgpt;
pub mod claude;
pub mod memory;
pub mod stats;
pub mod voice;
