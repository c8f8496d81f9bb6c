use std::path::PathBuf;

use crate::error::{BanvicError, Result};
use crate::loader::{find_file, TableKind};
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(path: &str) -> Result<()> {
    let resolved = PathBuf::from(shellexpand_path(path));

    let Some(found) = find_file(&resolved, TableKind::Transactions) else {
        return Err(BanvicError::MissingTable {
            table: TableKind::Transactions.label(),
            dir: resolved.display().to_string(),
            candidates: TableKind::Transactions.candidates().join(", "),
        });
    };

    let mut settings = load_settings();
    settings.data_dir = resolved.to_string_lossy().to_string();
    save_settings(&settings)?;

    println!("Using {} ({})", resolved.display(), found.display());
    Ok(())
}
