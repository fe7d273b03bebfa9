use std::path::PathBuf;

use crate::db::{get_connection, init_db, set_metadata};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, fiscal_year: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(year) = fiscal_year {
        settings.fiscal_year = year;
    }

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;
    if !settings.fiscal_year.is_empty() {
        set_metadata(&conn, "fiscal_year", &settings.fiscal_year)?;
    }
    save_settings(&settings)?;

    println!("Initialized noter in {}", resolved.display());
    Ok(())
}
