use crate::api::PhotoApi;
use crate::cli::parser::{Commands, PhotoCmd};
use crate::config::Config;
use crate::core::photos::{PhotoBatch, upload_all};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, success};

use super::{audit, http_api, open_store};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Photo { action } = cmd else {
        return Ok(());
    };

    match action {
        PhotoCmd::Add {
            entry_id,
            files,
            caption,
        } => {
            let batch = PhotoBatch::from_paths(files)?;
            let api = http_api(cfg)?;
            let outcomes = upload_all(&api, *entry_id, &batch, caption.as_deref());

            let store = open_store(cfg)?;
            let mut failed = 0;
            for o in &outcomes {
                match &o.result {
                    Ok(p) => {
                        audit(&store, "photo_add", &entry_id.to_string(), &o.file_name);
                        success(format!("Uploaded {} (photo {})", o.file_name, p.id));
                    }
                    Err(e) => {
                        failed += 1;
                        error(format!("Photo '{}' failed: {e}", o.file_name));
                    }
                }
            }
            if failed > 0 {
                return Err(AppError::Other(format!(
                    "{failed} of {} photo(s) failed to upload",
                    outcomes.len()
                )));
            }
            Ok(())
        }
        PhotoCmd::Delete { photo_id } => {
            http_api(cfg)?.delete_photo(*photo_id)?;
            audit(&open_store(cfg)?, "photo_delete", &photo_id.to_string(), "deleted");
            success(format!("Photo {photo_id} deleted"));
            Ok(())
        }
    }
}
