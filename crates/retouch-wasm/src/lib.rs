//! Retouch WASM - WebAssembly bindings for the Retouch editing core
//!
//! This crate exposes the `retouch-core` editor facade to JavaScript/TypeScript
//! hosts. The host owns the UI (toolbar, file picker, downloads) and drives
//! a single [`JsEditor`] per canvas.
//!
//! # Module Structure
//!
//! - `editor` - The `JsEditor` facade and two-phase upload handles
//! - `logging` - `log` backend writing to the browser console
//! - `types` - Name parsing and error conversion helpers
//!
//! # Usage
//!
//! ```typescript
//! import init, { init_logging, JsEditor } from '@retouch/wasm';
//!
//! await init();
//! init_logging('debug');
//!
//! const editor = new JsEditor();
//! editor.add_shape('circle');
//! const png = editor.export('png');
//! ```

use wasm_bindgen::prelude::*;

mod editor;
mod logging;
mod types;

pub use editor::{JsDecodedUpload, JsEditor, JsPendingUpload};

/// Initialize the WASM module (called automatically on load)
///
/// Installs the console logger at `warn` level.
#[wasm_bindgen(start)]
pub fn init() {
    logging::install(log::LevelFilter::Warn);
}

/// Set the console log level: `off`, `error`, `warn`, `info`, `debug` or `trace`.
#[wasm_bindgen]
pub fn init_logging(level: &str) -> Result<(), JsValue> {
    let level: log::LevelFilter = types::parse_name(level).map_err(types::js_error)?;
    logging::install(level);
    Ok(())
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_init_logging_accepts_level_names() {
        assert!(init_logging("debug").is_ok());
        assert_eq!(log::max_level(), log::LevelFilter::Debug);
        init();
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
    }
}
