//! Scene-owner side of partview.
//!
//! Holds the authoritative part hierarchy and wires it to the VR controller:
//! - `tree`: parts, groups, colour and visibility
//! - `loader`: mesh-loader boundary and folder import
//! - `status`: status-bar notices
//! - `owner`: the UI-thread handlers (start/stop VR, part options, import)

pub mod loader;
pub mod owner;
pub mod status;
pub mod tree;

pub use loader::{ImportSummary, MeshLoader, add_file, import_folder};
pub use owner::{PartOptions, SceneOwner};
pub use status::{StatusBar, StatusMessage};
pub use tree::{ModelPart, PartId, PartTree};
