//! LabelForge Core - Label Encoding and Print-Layout Engine
//!
//! # Contracts
//! 1. Date codes follow ISO-8601 week numbering
//! 2. Identifiers are derived, never typed
//! 3. The QR payload field order is fixed
//! 4. Only two physical formats exist
//! 5. Exports are placed at true physical size
//! 6. A failed export leaves nothing on disk

pub mod config;
pub mod datecode;
pub mod hashing;
pub mod identifier;
pub mod layout;
pub mod payload;
pub mod pipeline;
pub mod policy;
pub mod print;
pub mod raster;
pub mod record;
pub mod session;
pub mod symbology;
pub mod templates;

pub use config::{ConfigError, LabelConfig};
pub use datecode::{current_date_code, date_code, iso_week};
pub use identifier::{current_hu_number, hu_number};
pub use layout::{render, LabelLayout, Node, NodeKind};
pub use payload::qr_payload;
pub use pipeline::{ExportError, ExportPipeline, ExportSettings, ExportedDocument};
pub use policy::{FieldError, FieldPolicy, Mutability};
pub use print::{PageSpec, Placement};
pub use raster::{BitmapRasterizer, RasterError, Rasterizer};
pub use record::{FieldName, LabelRecord};
pub use session::LabelSession;
pub use templates::{LabelPreset, LabelSize, LabelType};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
