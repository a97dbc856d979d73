//! System clipboard hand-off for merged output.
//!
//! On X11/Wayland the clipboard owner must stay alive for other apps to paste,
//! so the handle is kept in a static for the rest of the process. Once the
//! process exits, the text survives only if a clipboard manager picked it up.

use filemerge_core::AppError;
use std::sync::Mutex;

static SYSTEM_CLIPBOARD: Mutex<Option<arboard::Clipboard>> = Mutex::new(None);

pub fn copy_text(text: &str) -> Result<(), AppError> {
    let mut guard = SYSTEM_CLIPBOARD
        .lock()
        .map_err(|_| AppError::Clipboard("clipboard lock poisoned".to_string()))?;

    if guard.is_none() {
        let clipboard = arboard::Clipboard::new().map_err(|e| {
            log::debug!("arboard clipboard init failed: {}", e);
            AppError::Clipboard(format!(
                "system clipboard unavailable ({}); use --stdout or --output instead",
                e
            ))
        })?;
        *guard = Some(clipboard);
    }

    let Some(clipboard) = guard.as_mut() else {
        return Err(AppError::Clipboard("system clipboard unavailable".to_string()));
    };
    if let Err(e) = clipboard.set_text(text.to_owned()) {
        log::debug!("arboard copy failed: {}, recreating clipboard", e);
        let mut fresh = arboard::Clipboard::new()
            .map_err(|e| AppError::Clipboard(format!("clipboard re-init failed: {}", e)))?;
        fresh
            .set_text(text.to_owned())
            .map_err(|e| AppError::Clipboard(format!("copy failed: {}", e)))?;
        *guard = Some(fresh);
    }
    log::debug!("Copied {} bytes to the system clipboard", text.len());
    Ok(())
}
