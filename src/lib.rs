//! Garden AR: an object search, a small platform game and a marker-triggered model viewer placed
//! into the camera's surroundings.
//!
//! The gameplay core (`controller`, `session`, `pool`, `placement`, `movement`, `viewer`) is plain
//! Rust that talks to the outside world through the traits in `host`. The remaining modules are Bevy
//! plugins that feed it input and draw what it owns.

pub mod app;
pub mod audio;
pub mod boundary;
pub mod camera;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod float;
pub mod host;
pub mod input;
pub mod mode;
pub mod movement;
pub mod placement;
pub mod pool;
pub mod scanning;
pub mod schedule;
pub mod session;
pub mod state;
pub mod store;
pub mod ui;
pub mod viewer;
pub mod world;

pub use app::GardenQuestPlugin;
pub use controller::{CollectionEvent, ControllerEvent, GameModeController};
pub use state::GameMode;
pub use viewer::ModelViewer;
