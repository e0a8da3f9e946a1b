//! 儲存介面

use chrono::{DateTime, Utc};
use ledger_core::{
    Category, InventoryItem, ItemId, Result, StockMovement, Supplier, SupplierId,
};

/// 帳本儲存
///
/// 物料庫存只能透過 [`StockRepository::commit_movement`] 改變：
/// 實作必須在同一個臨界區內比對版本、寫入物料並附加異動。
pub trait StockRepository: Send + Sync {
    /// 新增分類（名稱不分大小寫唯一）
    fn insert_category(&self, category: Category) -> Result<Category>;

    fn categories(&self) -> Result<Vec<Category>>;

    /// 新增物料（分類必須存在、名稱唯一、尚無庫存）
    fn insert_item(&self, item: InventoryItem) -> Result<InventoryItem>;

    /// 讀取物料，不存在時回傳 `ItemNotFound`
    fn item(&self, id: ItemId) -> Result<InventoryItem>;

    fn items(&self) -> Result<Vec<InventoryItem>>;

    /// 更新物料基本資料，回傳新版本
    ///
    /// `item.version()` 必須等於儲存中的版本，否則回傳 `ConcurrencyConflict`。
    /// 庫存、啟用狀態與建立時間一律沿用儲存中的值。
    fn update_item(&self, item: InventoryItem, at: DateTime<Utc>) -> Result<InventoryItem>;

    /// 停用物料（不刪除，歷史異動仍保留），版本遞增
    fn deactivate_item(&self, id: ItemId, at: DateTime<Utc>) -> Result<InventoryItem>;

    /// 寫入異動
    ///
    /// 儲存中的物料版本必須等於 `expected_version`，
    /// 否則回傳 `ConcurrencyConflict` 且不做任何修改。
    /// 寫入的物料由儲存中的那一筆套用 `movement` 重新算出，
    /// 與呼叫端提供的 `item` 不一致時回傳 `Validation`。
    fn commit_movement(
        &self,
        expected_version: u64,
        item: InventoryItem,
        movement: StockMovement,
    ) -> Result<()>;

    /// 單一物料的異動（依寫入順序）
    fn movements_for(&self, item_id: ItemId) -> Result<Vec<StockMovement>>;

    fn all_movements(&self) -> Result<Vec<StockMovement>>;

    /// 新增供應商（名稱唯一）
    fn insert_supplier(&self, supplier: Supplier) -> Result<Supplier>;

    /// 讀取供應商，不存在時回傳 `SupplierNotFound`
    fn supplier(&self, id: SupplierId) -> Result<Supplier>;

    fn suppliers(&self) -> Result<Vec<Supplier>>;

    fn deactivate_supplier(&self, id: SupplierId) -> Result<Supplier>;
}
