//! プレビュー画像キャッシュ
//!
//! セッション中だけ生きるメモリ上のマップ。永続化はしない。
//! リロード直後は空なので、履歴にあってもプレビューが無いのは正常。

use crate::types::PreviewPair;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PreviewCache {
    entries: HashMap<u64, PreviewPair>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: u64, pair: PreviewPair) {
        self.entries.insert(id, pair);
    }

    pub fn get(&self, id: u64) -> Option<&PreviewPair> {
        self.entries.get(&id)
    }

    pub fn delete(&mut self, id: u64) -> Option<PreviewPair> {
        self.entries.remove(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
