//! INI documents exchanged with the engine: the configuration overlay and the
//! title batch.

pub mod batch;
pub mod document;
pub mod overlay;

pub use batch::{BatchArtifact, BatchDocument};
pub use document::ConfigurationDocument;
pub use overlay::ConfigOverlay;
