//! Resolution and lifecycle services
//!
//! Leaf-first: local resolver and external client feed the tree builder;
//! the import pipeline drives all three; the batch manager records and
//! undoes what a pipeline run created.

pub mod batch_manager;
pub mod import_pipeline;
pub mod local_resolver;
pub mod resolution_client;
pub mod tree_builder;

pub use batch_manager::{BatchManager, BatchRecorder};
pub use import_pipeline::{ImportPipeline, PipelineConfig};
pub use local_resolver::LocalResolver;
pub use resolution_client::{
    ExternalOutcome, ExternalResolver, HttpNameMatchService, NameMatch, NameMatchService,
    NameQuery, ResolverError, ACCEPT_THRESHOLD,
};
pub use tree_builder::TreeBuilder;
