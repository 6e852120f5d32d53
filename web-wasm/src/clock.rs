//! ブラウザの時計

use detection_history_common::Clock;

/// `Date.now()` を使う時計
#[derive(Debug, Clone, Copy, Default)]
pub struct JsClock;

impl Clock for JsClock {
    fn now_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// 表示用のローカル日時文字列
pub fn locale_now_string() -> String {
    js_sys::Date::new_0()
        .to_locale_string("default", &wasm_bindgen::JsValue::UNDEFINED)
        .into()
}
