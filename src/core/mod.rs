/*!
 * Core Module
 * Fundamental engine types and error handling
 */

pub mod definition;
pub mod errors;
pub mod limits;
pub mod path;
pub mod resource;
pub mod types;

// Re-export for convenience
pub use definition::Definition;
pub use errors::*;
pub use resource::Resource;
pub use types::*;
