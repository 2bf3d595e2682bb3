use std::{fs, path::Path};

use crate::{MeteoError, Result, config::Config};

const HEADER: &str = "# meteo configuration file\n\
# Values under [state] are the slot values the application starts with.\n\n";

/// Creates a default configuration file if it doesn't exist
pub fn create_default_config_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MeteoError::io(e, parent))?;
    }

    let body = Config::default().to_toml()?;
    fs::write(path, format!("{HEADER}{body}")).map_err(|e| MeteoError::io(e, path))?;

    Ok(())
}
