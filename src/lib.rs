//! # tracewipe
//!
//! Erase local traces left by browsers, the Tor client and temporary files.
//!
//! The erasure engine runs on its own thread and reports what it does through
//! a small event protocol: `Log` lines, monotonic `Progress` percentages and a
//! single terminal `Completed` event. Failures are reported per location and
//! never abort the run.
//!
//! ## Usage
//!
//! ### Command Line
//!
//! ```bash
//! # Show the locations and whether they exist
//! tracewipe list
//!
//! # Erase everything without prompting
//! tracewipe run --yes
//!
//! # Machine-readable event stream
//! tracewipe run --yes --json
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use std::sync::mpsc;
//! use tracewipe::{EngineConfig, EngineEvent, ErasureEngine, ErasureTarget, Category};
//!
//! // Point the engine at a sandbox instead of the real home directory.
//! let home = std::env::temp_dir().join("tracewipe-doc-home");
//! let config = EngineConfig { home_dir: Some(home), ..Default::default() };
//! let targets = vec![ErasureTarget::new(
//!     "tor-data",
//!     "Tor client data",
//!     "~/.tor",
//!     Category::AnonymityNetwork,
//!     50,
//! )];
//!
//! let (sender, receiver) = mpsc::channel();
//! let handle = ErasureEngine::with_targets(config, targets).spawn(sender)?;
//! for event in receiver {
//!     if let EngineEvent::Log { message } = &event {
//!         println!("{message}");
//!     }
//! }
//! let report = handle.join()?;
//! assert!(!report.has_failures());
//! # Ok::<(), anyhow::Error>(())
//! ```

// Re-export core functionality
pub use tracewipe_core::*;
