//! Structure templates: capture a region of a world, keep it around or write it to disk, and
//! stamp it back down rotated, mirrored and run through processors.

pub mod cache;
pub mod info;
pub mod jigsaw;
pub mod level;
pub mod palette;
pub mod processor;
pub mod settings;
pub mod template;
pub mod transform;

pub use cache::StructureCache;
pub use info::{BlockInfo, EntityInfo};
pub use jigsaw::{JigsawInfo, JointType};
pub use level::Level;
pub use palette::{Palette, StatePalette};
pub use processor::{ProcessContext, StructureProcessor};
pub use settings::PlacementSettings;
pub use template::StructureTemplate;
