//! Pyramid planning and encoding.
//!
//! This module turns a source image into a Deep Zoom pyramid: the geometry
//! planner computes the level list, the encoder materializes tiles and the
//! descriptor on disk.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             BuildCoordinator            │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           Pyramid Encoder               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   geometry   │  │   descriptor    │  │
//! │  │  (level plan)│  │  (DZI XML)      │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               TileStore                 │
//! └─────────────────────────────────────────┘
//! ```

mod descriptor;
mod encoder;
mod geometry;

pub use descriptor::PyramidDescriptor;
pub use encoder::{encode, EncodeOptions, SourceImage, DEFAULT_QUALITY};
pub use geometry::{max_level, plan, PyramidLevel};
