//! Command trees declared in YAML or JSON.
//!
//! A [`CommandManifest`] mirrors the builder APIs of `cmdtree-dispatch`:
//! option and argument specs, the chain and extra-argument settings, and a
//! nested `commands` map. [`build_command`] validates the tree and turns it
//! into a boxed [`Command`](cmdtree_dispatch::Command), asking an
//! [`ActionResolver`] for each leaf's behavior.
//!
//! # Quick start
//!
//! ```no_run
//! use cmdtree_dispatch::{StdioSink, run};
//! use cmdtree_manifest::{CommandManifest, Invocation, Recorder, build_command};
//!
//! let manifest = CommandManifest::load("tool.yml").unwrap();
//! let mut tool = build_command(&manifest, &mut Recorder).unwrap();
//!
//! let mut invocations: Vec<Invocation> = Vec::new();
//! let tokens: Vec<String> = std::env::args().skip(1).collect();
//! let code = run(tool.as_mut(), &manifest.name, tokens, &mut invocations, &mut StdioSink);
//! std::process::exit(code.exit_status());
//! ```

mod error;
mod loader;
mod manifest;

pub use error::{ManifestError, Result};
pub use loader::{ActionResolver, Invocation, LeafAction, Recorder, build_command};
pub use manifest::CommandManifest;
