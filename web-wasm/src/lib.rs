//! Detection History Web binding (WASM)
//!
//! JavaScript側のUIから検出履歴ファサードを使うためのハンドル。
//! 永続化は localStorage、Undo期限は setTimeout で処理する。

mod clock;
mod local_store;
mod timer;

pub use clock::JsClock;
pub use local_store::LocalStorageStore;
pub use timer::TimeoutScheduler;

use detection_history_common::{
    DetectionHistory, DetectionRecord, DetectionResponse, PreviewPair, DEFAULT_STORAGE_KEY,
};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
}

/// JavaScript側に渡すプレビュー
#[derive(Serialize)]
struct JsPreview<'a> {
    input: &'a str,
    output: &'a str,
}

impl<'a> From<&'a PreviewPair> for JsPreview<'a> {
    fn from(pair: &'a PreviewPair) -> Self {
        Self {
            input: &pair.input,
            output: &pair.output,
        }
    }
}

type ExpireCallback = Rc<RefCell<Option<js_sys::Function>>>;

#[wasm_bindgen]
pub struct HistoryHandle {
    inner: Rc<RefCell<DetectionHistory>>,
    on_expire: ExpireCallback,
}

#[wasm_bindgen]
impl HistoryHandle {
    /// localStorageから履歴を読み込んで起動
    #[wasm_bindgen(constructor)]
    pub fn new(storage_key: Option<String>) -> HistoryHandle {
        let key = storage_key.unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        let on_expire: ExpireCallback = Rc::new(RefCell::new(None));
        let callback = Rc::clone(&on_expire);

        let inner = Rc::new_cyclic(|weak: &std::rc::Weak<RefCell<DetectionHistory>>| {
            let weak = weak.clone();
            let scheduler = TimeoutScheduler::new(move |ticket| {
                let Some(history) = weak.upgrade() else {
                    return;
                };
                let expired = match history.try_borrow_mut() {
                    Ok(mut history) => history.expire_undo(ticket),
                    Err(_) => false,
                };
                if expired {
                    if let Some(f) = callback.borrow().as_ref() {
                        let _ = f.call0(&JsValue::NULL);
                    }
                }
            });

            RefCell::new(DetectionHistory::new(
                Box::new(LocalStorageStore),
                &key,
                Box::new(JsClock),
                Box::new(scheduler),
            ))
        });

        HistoryHandle { inner, on_expire }
    }

    /// Undo期限切れ時に呼ばれる関数を登録
    #[wasm_bindgen(js_name = setOnUndoExpired)]
    pub fn set_on_undo_expired(&self, f: Option<js_sys::Function>) {
        *self.on_expire.borrow_mut() = f;
    }

    /// 現在の履歴（新しい順）
    pub fn history(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.borrow().history()).map_err(Into::into)
    }

    /// プレビュー（無ければ null）
    pub fn preview(&self, id: f64) -> Result<JsValue, JsValue> {
        let history = self.inner.borrow();
        match history.preview(id as u64) {
            Some(pair) => serde_wasm_bindgen::to_value(&JsPreview::from(pair)).map_err(Into::into),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = nextId)]
    pub fn next_id(&self) -> f64 {
        self.inner.borrow().next_id() as f64
    }

    /// レコードとプレビューを追加
    #[wasm_bindgen(js_name = addDetection)]
    pub fn add_detection(&self, record: JsValue, input_preview: String, output_preview: String) -> Result<(), JsValue> {
        let record: DetectionRecord = serde_wasm_bindgen::from_value(record)?;
        self.inner
            .borrow_mut()
            .add_detection(record, input_preview, output_preview);
        Ok(())
    }

    /// 検出サービスのレスポンスJSONから追加し、新しいIDを返す
    #[wasm_bindgen(js_name = addResponse)]
    pub fn add_response(&self, response_json: &str, filename: String, input_preview: String) -> Result<f64, JsValue> {
        let response = DetectionResponse::parse(response_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let mut history = self.inner.borrow_mut();
        let id = history.next_id();
        let record = DetectionRecord::from_response(id, clock::locale_now_string(), filename, &response);
        history.add_detection(record, input_preview, response.output_data_url());
        Ok(id as f64)
    }

    #[wasm_bindgen(js_name = deleteDetection)]
    pub fn delete_detection(&self, id: f64) -> bool {
        self.inner.borrow_mut().delete_detection(id as u64)
    }

    #[wasm_bindgen(js_name = clearHistory)]
    pub fn clear_history(&self) -> u32 {
        self.inner.borrow_mut().clear_history() as u32
    }

    /// 取り消した操作の種類（"delete" / "clear"）。無ければ undefined。
    pub fn undo(&self) -> Option<String> {
        self.inner.borrow_mut().undo().map(|k| k.as_str().to_string())
    }

    #[wasm_bindgen(js_name = undoPending)]
    pub fn undo_pending(&self) -> Option<String> {
        self.inner.borrow().undo_pending().map(|k| k.as_str().to_string())
    }

    #[wasm_bindgen(js_name = undoRemainingMs)]
    pub fn undo_remaining_ms(&self) -> Option<f64> {
        self.inner
            .borrow()
            .undo_remaining()
            .map(|d| d.as_millis() as f64)
    }
}
