//! 髒標記追蹤

use ledger_core::ItemId;
use std::collections::HashSet;

/// 髒標記追蹤器
///
/// 記錄上次重新分級後有異動或修改的物料。
#[derive(Debug)]
pub struct DirtyTracker {
    dirty_items: HashSet<ItemId>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self {
            dirty_items: HashSet::new(),
        }
    }

    /// 標記物料為髒
    pub fn mark_dirty(&mut self, item_id: ItemId) {
        self.dirty_items.insert(item_id);
    }

    /// 檢查物料是否為髒
    pub fn is_dirty(&self, item_id: &ItemId) -> bool {
        self.dirty_items.contains(item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.dirty_items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirty_items.len()
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty_items.clear();
    }

    /// 獲取所有髒物料
    pub fn dirty_items(&self) -> Vec<ItemId> {
        self.dirty_items.iter().copied().collect()
    }

    /// 取出所有髒物料並清除標記
    pub fn take(&mut self) -> Vec<ItemId> {
        self.dirty_items.drain().collect()
    }
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::new()
    }
}
