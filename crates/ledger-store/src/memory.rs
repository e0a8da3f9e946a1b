//! 記憶體儲存
//!
//! 以 `RwLock` 保護全部狀態，適合測試與單一行程使用。

use chrono::{DateTime, Utc};
use ledger_calc::catalog::{
    ensure_unique_category_name, ensure_unique_item_name, ensure_unique_supplier_name,
};
use ledger_core::{
    Category, InventoryItem, ItemId, LedgerError, Result, StockMovement, Supplier, SupplierId,
};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::repository::StockRepository;

#[derive(Debug, Default)]
struct State {
    categories: Vec<Category>,
    items: Vec<InventoryItem>,
    movements: Vec<StockMovement>,
    suppliers: Vec<Supplier>,
}

impl State {
    fn item_index(&self, id: ItemId) -> Result<usize> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or(LedgerError::ItemNotFound(id))
    }

    fn supplier_index(&self, id: SupplierId) -> Result<usize> {
        self.suppliers
            .iter()
            .position(|supplier| supplier.id == id)
            .ok_or(LedgerError::SupplierNotFound(id))
    }

    fn ensure_category(&self, item: &InventoryItem) -> Result<()> {
        if self.categories.iter().any(|c| c.id == item.category_id) {
            Ok(())
        } else {
            Err(LedgerError::CategoryNotFound(item.category_id))
        }
    }
}

/// 記憶體帳本儲存
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))
    }
}

impl StockRepository for InMemoryRepository {
    fn insert_category(&self, category: Category) -> Result<Category> {
        let mut state = self.write()?;
        ensure_unique_category_name(&state.categories, &category.name)?;
        state.categories.push(category.clone());
        Ok(category)
    }

    fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.read()?.categories.clone())
    }

    fn insert_item(&self, item: InventoryItem) -> Result<InventoryItem> {
        if item.version() != 0 || !item.current_stock().is_zero() {
            return Err(LedgerError::Validation(format!(
                "新物料 {} 不可帶有庫存，請使用期初庫存",
                item.name
            )));
        }

        let mut state = self.write()?;
        if state.items.iter().any(|existing| existing.id == item.id) {
            return Err(LedgerError::Validation(format!("物料 {} 已存在", item.id)));
        }
        state.ensure_category(&item)?;
        ensure_unique_item_name(&state.items, &item.name, None)?;
        state.items.push(item.clone());
        Ok(item)
    }

    fn item(&self, id: ItemId) -> Result<InventoryItem> {
        let state = self.read()?;
        let index = state.item_index(id)?;
        Ok(state.items[index].clone())
    }

    fn items(&self) -> Result<Vec<InventoryItem>> {
        Ok(self.read()?.items.clone())
    }

    fn update_item(&self, item: InventoryItem, at: DateTime<Utc>) -> Result<InventoryItem> {
        let mut state = self.write()?;
        let index = state.item_index(item.id)?;
        let stored = &state.items[index];

        if stored.version() != item.version() {
            return Err(LedgerError::ConcurrencyConflict {
                item_id: item.id,
                expected: item.version(),
                found: stored.version(),
            });
        }
        let revised = stored.revise(&item, at)?;
        state.ensure_category(&revised)?;
        ensure_unique_item_name(&state.items, &revised.name, Some(revised.id))?;

        state.items[index] = revised.clone();
        Ok(revised)
    }

    fn deactivate_item(&self, id: ItemId, at: DateTime<Utc>) -> Result<InventoryItem> {
        let mut state = self.write()?;
        let index = state.item_index(id)?;
        let item = &mut state.items[index];
        item.deactivate(at);
        Ok(item.clone())
    }

    fn commit_movement(
        &self,
        expected_version: u64,
        item: InventoryItem,
        movement: StockMovement,
    ) -> Result<()> {
        if movement.item_id != item.id {
            return Err(LedgerError::Validation(format!(
                "異動 {} 不屬於物料 {}",
                movement.id, item.id
            )));
        }

        let mut state = self.write()?;
        let index = state.item_index(item.id)?;
        let stored = &state.items[index];
        let found = stored.version();
        if found != expected_version {
            return Err(LedgerError::ConcurrencyConflict {
                item_id: item.id,
                expected: expected_version,
                found,
            });
        }

        let applied = stored.apply(&movement)?;
        if applied != item {
            return Err(LedgerError::Validation(format!(
                "物料 {} 的寫入內容與異動 {} 不符",
                item.name, movement.id
            )));
        }

        state.items[index] = applied;
        state.movements.push(movement);
        Ok(())
    }

    fn movements_for(&self, item_id: ItemId) -> Result<Vec<StockMovement>> {
        Ok(self
            .read()?
            .movements
            .iter()
            .filter(|m| m.item_id == item_id)
            .cloned()
            .collect())
    }

    fn all_movements(&self) -> Result<Vec<StockMovement>> {
        Ok(self.read()?.movements.clone())
    }

    fn insert_supplier(&self, supplier: Supplier) -> Result<Supplier> {
        let mut state = self.write()?;
        ensure_unique_supplier_name(&state.suppliers, &supplier.name, None)?;
        state.suppliers.push(supplier.clone());
        Ok(supplier)
    }

    fn supplier(&self, id: SupplierId) -> Result<Supplier> {
        let state = self.read()?;
        let index = state.supplier_index(id)?;
        Ok(state.suppliers[index].clone())
    }

    fn suppliers(&self) -> Result<Vec<Supplier>> {
        Ok(self.read()?.suppliers.clone())
    }

    fn deactivate_supplier(&self, id: SupplierId) -> Result<Supplier> {
        let mut state = self.write()?;
        let index = state.supplier_index(id)?;
        let supplier = &mut state.suppliers[index];
        supplier.active = false;
        Ok(supplier.clone())
    }
}
