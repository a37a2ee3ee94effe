// src/ports/mod.rs
//
// Capabilities the pipeline consumes from the outside world.
//
// Every method may suspend on the network and reports remote failures as
// `AppError::Transport`. A missing remote resource is `Ok(None)` or an
// empty list, never an error.

pub mod catalog;
pub mod metadata;
pub mod publisher;

pub use catalog::SourceCatalogReader;
pub use metadata::MetadataResolver;
pub use publisher::ChannelPublisher;

#[cfg(test)]
pub use catalog::MockSourceCatalogReader;
#[cfg(test)]
pub use metadata::MockMetadataResolver;
#[cfg(test)]
pub use publisher::MockChannelPublisher;
