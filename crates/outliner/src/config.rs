use std::path::Path;

use outliner_core::OutlineConfig;

use crate::prelude::*;

/// Engine parameters: defaults, overridden by the `--config` TOML file when
/// one is given.
pub fn load(global: &crate::Global) -> Result<OutlineConfig> {
    match &global.config {
        Some(path) => load_file(path),
        None => Ok(OutlineConfig::default()),
    }
}

pub fn load_file(path: &Path) -> Result<OutlineConfig> {
    let source = std::fs::read_to_string(path)
        .wrap_err_with(|| f!("reading config file {}", path.display()))?;
    let config = OutlineConfig::from_toml(&source)
        .map_err(Error::from)
        .wrap_err_with(|| f!("loading config file {}", path.display()))?;
    log::debug!("loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}
