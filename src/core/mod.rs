// ─── Prelaunch Core ───
// Everything a vanilla client needs on disk before the JVM starts.
//
// Architecture:
//   core/
//     version/     Version manifest, descriptor schema, OS rules, client jar
//     downloader/  Bounded concurrent downloads with SHA-1 validation
//     store        On-disk content layout and cache checks
//     assets/      Asset index + object synchronization
//     launch/      Classpath, native extraction, game arguments
//     auth/        Launch session identity
//     pipeline     End-to-end preparation into a launch plan
//     platform     Target OS names, JVM flags, classpath separators
//     settings     Persisted pipeline tunables

pub mod assets;
pub mod auth;
pub mod downloader;
pub mod error;
pub mod http;
pub mod launch;
pub mod pipeline;
pub mod platform;
pub mod settings;
pub mod store;
pub mod version;
