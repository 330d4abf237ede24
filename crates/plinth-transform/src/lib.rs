//! Asset transformers for the plinth pipeline.
//!
//! Each transformer is one step of a task's chain. They wrap the libraries
//! that do the real work: `grass` and `lightningcss` for styles,
//! `minijinja` and `minify-html` for markup, `oxc` for scripts and `image`
//! for raster images. Tools without a Rust library (bundlers, font
//! converters) are invoked as external commands.

pub mod command;
pub mod critical;
pub mod css;
pub mod fonts;
pub mod grid;
pub mod html;
pub mod images;
pub mod js;
pub mod traits;

pub use command::ExternalCommand;
pub use critical::{CriticalExtractor, CriticalOptions, Viewport};
pub use css::{BrowserVersions, Preprocessor};
pub use grid::{GridConfig, GridGenerator};
pub use traits::{Asset, Transformer, TransformError};
