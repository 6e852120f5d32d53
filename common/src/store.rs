//! 永続化アダプタ
//!
//! localStorage相当の同期キー・バリューストア。
//! トランザクションはなく、書き込みは失敗しうる（容量超過など）。

use crate::error::Result;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// 同期キー・バリューストア
pub trait KeyValueStore {
    /// キーの値を取得（未設定なら `None`）
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// キーに値を書き込む
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// キーを削除（未設定でもエラーにしない）
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// メモリ上のストア
///
/// クローン同士は同じ中身を共有する。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでの `set` / `remove` 呼び出し回数
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// 生の値を取得
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.writes.set(self.writes.get() + 1);
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
