//! localStorageを使う永続化アダプタ

use detection_history_common::{Error, KeyValueStore, Result};
use wasm_bindgen::JsValue;
use web_sys::Storage;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage(&self) -> Result<Storage> {
        let window = web_sys::window().ok_or_else(|| Error::Storage("window がありません".into()))?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| Error::Storage("localStorage が使えません".into()))
    }
}

fn js_error(value: JsValue) -> Error {
    let message = value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value));
    gloo::console::warn!("localStorage エラー:", message.clone());
    Error::Storage(message)
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage()?.get_item(key).map_err(js_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage()?.set_item(key, value).map_err(js_error)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage()?.remove_item(key).map_err(js_error)
    }
}
