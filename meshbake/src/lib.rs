//! meshbake - photogrammetry job archives to self-contained GLB assets.
//!
//! A photogrammetry job running on a remote processing node produces an
//! archive holding a textured OBJ mesh, its MTL material library and
//! texture images. This library watches such jobs, converts their archive
//! into a single binary glTF file with every texture embedded, and caches
//! the result keyed by project and job.
//!
//! # Modules
//!
//! - [`job`]: job keys, statuses, credentials and options
//! - [`archive`]: ZIP ingestion and material relinking
//! - [`texture`]: bounded-size texture transcoding
//! - [`glb`]: OBJ/MTL parsing and GLB assembly
//! - [`pipeline`]: the per-job conversion stages
//! - [`cache`]: the on-disk result cache
//! - [`remote`]: the processing node client
//! - [`watcher`]: job status polling
//! - [`service`]: cache-aware, coalesced conversions
//!
//! # Example
//!
//! ```ignore
//! use meshbake::job::{Credential, JobKey, JobOptions};
//! use meshbake::remote::{HttpJobClient, RemoteConfig};
//! use meshbake::service::ConversionService;
//!
//! let client = Arc::new(HttpJobClient::new(RemoteConfig::new("http://odm:3000"))?);
//! let cache = Arc::new(ResultCache::new(default_cache_dir())?);
//! let service = Arc::new(ConversionService::new(client.clone(), cache, PipelineConfig::default()));
//! let watcher = JobWatcher::from_arc(client, WatcherConfig::default());
//!
//! let key = JobKey::new("42", "3f2a")?;
//! let asset = service
//!     .run_job(&watcher, key, Credential::anonymous(), JobOptions::default(), &cancel)
//!     .await?;
//! ```

pub mod archive;
pub mod cache;
pub mod config;
pub mod glb;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod remote;
pub mod service;
pub mod texture;
pub mod watcher;

/// Version of the meshbake library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
