//! Configuration: data directory resolution and user settings

pub mod paths;
pub mod settings;

pub use paths::WaterfallPaths;
pub use settings::Settings;
