mod client;
pub mod manifest;
pub mod version_file;

pub use client::acquire_client_jar;
pub use manifest::{ManifestResolver, ResolvedVersion, VersionEntry, VersionManifest};
pub use version_file::{
    rules_allow, ArgumentValue, AssetIndexInfo, DownloadArtifact, Library, LibraryArtifact,
    Rule, RuleAction, VersionDescriptor,
};
