pub mod artifacts;
#[cfg(feature = "native")]
pub mod native;
pub mod scripted;
