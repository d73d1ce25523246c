#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod assets;
pub mod compressor;
pub mod config;
pub mod loader;
pub mod naming;
pub mod pipeline;
pub mod selector;

pub use assets::{Asset, AssetCollection, RawAsset};
pub use compressor::{Algorithm, CompressionTuning, CompressorFn};
pub use config::{NameTransform, PressFileConfig, PressOptions};
pub use pipeline::{AssetPress, PressError};
pub use selector::{Selector, SelectorSpec};
