//! 庫存物料模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    CategoryId, ItemId, LedgerError, Money, Quantity, Result, StockMovement, Unit,
};

/// 庫存物料
///
/// 現有庫存只能透過 [`InventoryItem::apply`] 套用異動來改變。
/// 反序列化時會重新檢查欄位與庫存。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord")]
pub struct InventoryItem {
    /// 物料ID
    pub id: ItemId,

    /// 名稱（目錄內唯一）
    pub name: String,

    /// 分類
    pub category_id: CategoryId,

    /// 計量單位
    pub unit: Unit,

    /// 現有庫存
    current_stock: Quantity,

    /// 最低庫存
    pub minimum_stock: Quantity,

    /// 目前單價
    pub unit_cost: Option<Money>,

    /// 說明
    pub description: Option<String>,

    /// 是否啟用（停用後不可再異動）
    pub active: bool,

    /// 版本號（每次寫入遞增）
    version: u64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// 創建新的物料（庫存為 0）
    pub fn new(
        name: impl Into<String>,
        category_id: CategoryId,
        unit: Unit,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            category_id,
            unit,
            current_stock: Quantity::ZERO,
            minimum_stock: Quantity::ZERO,
            unit_cost: None,
            description: None,
            active: true,
            version: 0,
            created_at,
            updated_at: created_at,
        }
    }

    /// 建構器模式：設置最低庫存
    pub fn with_minimum_stock(mut self, minimum_stock: Quantity) -> Self {
        self.minimum_stock = minimum_stock;
        self
    }

    /// 建構器模式：設置單價
    pub fn with_unit_cost(mut self, unit_cost: Money) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    /// 建構器模式：設置說明
    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn current_stock(&self) -> Quantity {
        self.current_stock
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// 檢查物料欄位
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::Validation("物料名稱不可為空".to_string()));
        }
        if self.minimum_stock.is_negative() {
            return Err(LedgerError::Validation(format!(
                "{} 的最低庫存不可為負數",
                self.name
            )));
        }
        if !self.minimum_stock.fits_unit(self.unit) {
            return Err(LedgerError::PrecisionOverflow(format!(
                "{} 的最低庫存 {} 不符合單位 {} 的精度",
                self.name, self.minimum_stock, self.unit
            )));
        }
        if self.unit_cost.is_some_and(|cost| cost.is_negative()) {
            return Err(LedgerError::Validation(format!(
                "{} 的單價不可為負數",
                self.name
            )));
        }
        Ok(())
    }

    /// 套用一筆異動，回傳更新後的物料
    ///
    /// 出庫數量大於現有庫存時失敗，不做截斷。
    pub fn apply(&self, movement: &StockMovement) -> Result<InventoryItem> {
        if movement.item_id != self.id {
            return Err(LedgerError::Validation(format!(
                "異動 {} 不屬於物料 {}",
                movement.id, self.name
            )));
        }
        if !self.active {
            return Err(LedgerError::ItemInactive(self.id));
        }
        if !movement.quantity.is_positive() {
            return Err(LedgerError::Validation(format!(
                "{} 的異動數量必須大於 0，收到 {}",
                self.name, movement.quantity
            )));
        }
        if movement.is_outbound() && movement.quantity > self.current_stock {
            return Err(LedgerError::InsufficientStock {
                item_id: self.id,
                name: self.name.clone(),
                current: self.current_stock,
                requested: movement.quantity,
            });
        }

        let new_stock = self.current_stock.checked_add(movement.signed_quantity())?;
        if !new_stock.fits_unit(self.unit) {
            return Err(LedgerError::PrecisionOverflow(format!(
                "{} 的庫存 {} 不符合單位 {} 的精度",
                self.name, new_stock, self.unit
            )));
        }

        let mut updated = self.clone();
        updated.current_stock = new_stock;
        updated.version = self.version + 1;
        updated.updated_at = movement.recorded_at;
        Ok(updated)
    }

    /// 以編輯後的資料更新基本欄位，回傳新版本
    ///
    /// 只取名稱、分類、單位、最低庫存、單價與說明。
    /// 庫存、啟用狀態與建立時間沿用目前的值。
    /// 物料一旦寫入過（版本大於 0），單位不可再變更。
    pub fn revise(&self, edited: &InventoryItem, at: DateTime<Utc>) -> Result<InventoryItem> {
        if edited.id != self.id {
            return Err(LedgerError::Validation(format!(
                "編輯資料 {} 不屬於物料 {}",
                edited.id, self.name
            )));
        }
        if edited.unit != self.unit && self.version > 0 {
            return Err(LedgerError::Validation(format!(
                "{} 已有紀錄，單位不可由 {} 改為 {}",
                self.name, self.unit, edited.unit
            )));
        }

        let mut revised = self.clone();
        revised.name = edited.name.clone();
        revised.category_id = edited.category_id;
        revised.unit = edited.unit;
        revised.minimum_stock = edited.minimum_stock;
        revised.unit_cost = edited.unit_cost;
        revised.description = edited.description.clone();
        revised.validate()?;

        revised.version = self.version + 1;
        revised.updated_at = at;
        Ok(revised)
    }

    /// 停用物料（軟刪除），版本遞增
    pub fn deactivate(&mut self, at: DateTime<Utc>) {
        self.active = false;
        self.version += 1;
        self.updated_at = at;
    }

    /// 庫存價值（現有庫存 * 目前單價）
    pub fn stock_value(&self) -> Result<Money> {
        match self.unit_cost {
            Some(cost) => self.current_stock.checked_mul_money(cost),
            None => Ok(Money::ZERO),
        }
    }
}

/// 反序列化用的原始欄位
#[derive(Deserialize)]
struct ItemRecord {
    id: ItemId,
    name: String,
    category_id: CategoryId,
    unit: Unit,
    current_stock: Quantity,
    minimum_stock: Quantity,
    unit_cost: Option<Money>,
    description: Option<String>,
    active: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRecord> for InventoryItem {
    type Error = LedgerError;

    fn try_from(record: ItemRecord) -> Result<Self> {
        let item = InventoryItem {
            id: record.id,
            name: record.name,
            category_id: record.category_id,
            unit: record.unit,
            current_stock: record.current_stock,
            minimum_stock: record.minimum_stock,
            unit_cost: record.unit_cost,
            description: record.description,
            active: record.active,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        item.validate()?;

        if item.current_stock.is_negative() {
            return Err(LedgerError::Validation(format!(
                "{} 的庫存不可為負數：{}",
                item.name, item.current_stock
            )));
        }
        if !item.current_stock.fits_unit(item.unit) {
            return Err(LedgerError::PrecisionOverflow(format!(
                "{} 的庫存 {} 不符合單位 {} 的精度",
                item.name, item.current_stock, item.unit
            )));
        }
        if item.version == 0 && !item.current_stock.is_zero() {
            return Err(LedgerError::Validation(format!(
                "{} 尚無紀錄卻帶有庫存 {}",
                item.name, item.current_stock
            )));
        }
        Ok(item)
    }
}
