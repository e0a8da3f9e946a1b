//! 帳本服務
//!
//! 對外的操作入口。同一物料的寫入在行程內以物料鎖序列化，
//! 行程外的寫入者則由儲存層的版本檢查攔下。

use chrono::{DateTime, Utc};
use ledger_calc::{
    CatalogFilter, Dashboard, DashboardBuilder, InventoryReportRow, LedgerAggregator,
    LedgerReplay, LedgerSummary, MovementMetadata, MovementRecorder, PurchaseReportRow,
    ReplayCheck, ReportBuilder, RunningBalance, StockAlert, StockStatus, ThresholdClassifier,
    TimeWindow, UsageReportRow,
};
use ledger_core::{
    Category, Counterparty, InventoryItem, ItemId, LedgerConfig, LedgerError, Money,
    MovementType, Quantity, Result, StockMovement, Supplier, SupplierId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::dirty_tracking::DirtyTracker;
use crate::repository::StockRepository;

fn poisoned<T>(_: T) -> LedgerError {
    LedgerError::Storage("lock poisoned".to_string())
}

/// 庫存帳本
pub struct StockLedger<R> {
    repo: R,
    config: LedgerConfig,
    recorder: MovementRecorder,
    classifier: ThresholdClassifier,
    item_locks: Mutex<HashMap<ItemId, Arc<Mutex<()>>>>,
    dirty: Mutex<DirtyTracker>,
    statuses: RwLock<HashMap<ItemId, StockStatus>>,
}

impl<R: StockRepository> StockLedger<R> {
    /// 創建新的帳本服務（配置無效時回傳 `InvalidConfig`）
    pub fn new(repo: R, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            recorder: MovementRecorder::new(&config),
            classifier: ThresholdClassifier::from_config(&config),
            repo,
            config,
            item_locks: Mutex::new(HashMap::new()),
            dirty: Mutex::new(DirtyTracker::new()),
            statuses: RwLock::new(HashMap::new()),
        })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn item_lock(&self, item_id: ItemId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.item_locks.lock().map_err(poisoned)?;
        Ok(Arc::clone(locks.entry(item_id).or_default()))
    }

    fn mark_dirty(&self, item_id: ItemId) -> Result<()> {
        self.dirty.lock().map_err(poisoned)?.mark_dirty(item_id);
        Ok(())
    }

    // ---- 目錄 ----

    pub fn create_category(&self, name: impl Into<String>) -> Result<Category> {
        let category = Category::new(name.into().trim());
        let category = self.repo.insert_category(category)?;
        tracing::info!("新增分類：{}", category.name);
        Ok(category)
    }

    /// 新增物料（庫存從 0 開始，期初數量請用 [`StockLedger::open_balance`]）
    pub fn create_item(&self, item: InventoryItem) -> Result<InventoryItem> {
        item.validate()?;
        let item = self.repo.insert_item(item)?;
        self.mark_dirty(item.id)?;
        tracing::info!("新增物料：{} ({})", item.name, item.unit);
        Ok(item)
    }

    /// 更新物料基本資料（不可改變庫存、啟用狀態與建立時間）
    pub fn update_item(&self, item: InventoryItem, at: DateTime<Utc>) -> Result<InventoryItem> {
        item.validate()?;
        let lock = self.item_lock(item.id)?;
        let _guard = lock.lock().map_err(poisoned)?;
        let item = self.repo.update_item(item, at)?;
        self.mark_dirty(item.id)?;
        tracing::info!("更新物料：{}（版本 {}）", item.name, item.version());
        Ok(item)
    }

    pub fn deactivate_item(&self, item_id: ItemId, at: DateTime<Utc>) -> Result<InventoryItem> {
        let lock = self.item_lock(item_id)?;
        let _guard = lock.lock().map_err(poisoned)?;
        let item = self.repo.deactivate_item(item_id, at)?;
        self.mark_dirty(item_id)?;
        tracing::info!("停用物料：{}", item.name);
        Ok(item)
    }

    pub fn register_supplier(&self, supplier: Supplier) -> Result<Supplier> {
        supplier.validate()?;
        let supplier = self.repo.insert_supplier(supplier)?;
        tracing::info!("新增供應商：{}", supplier.name);
        Ok(supplier)
    }

    pub fn deactivate_supplier(&self, supplier_id: SupplierId) -> Result<Supplier> {
        let supplier = self.repo.deactivate_supplier(supplier_id)?;
        tracing::info!("停用供應商：{}", supplier.name);
        Ok(supplier)
    }

    pub fn item(&self, item_id: ItemId) -> Result<InventoryItem> {
        self.repo.item(item_id)
    }

    pub fn items(&self) -> Result<Vec<InventoryItem>> {
        self.repo.items()
    }

    pub fn search_items(&self, filter: &CatalogFilter) -> Result<Vec<InventoryItem>> {
        let items = self.repo.items()?;
        Ok(filter
            .apply(&items, &self.classifier)
            .into_iter()
            .cloned()
            .collect())
    }

    // ---- 異動 ----

    /// 在物料鎖內讀取、驗證並寫入
    fn commit_locked<F>(&self, item_id: ItemId, build: F) -> Result<StockMovement>
    where
        F: FnOnce(&InventoryItem) -> Result<(InventoryItem, StockMovement)>,
    {
        let lock = self.item_lock(item_id)?;
        let _guard = lock.lock().map_err(poisoned)?;

        let item = self.repo.item(item_id)?;
        let (updated, movement) = build(&item)?;
        self.repo
            .commit_movement(item.version(), updated, movement.clone())?;
        self.mark_dirty(item_id)?;

        tracing::info!(
            "記錄異動：{} {} {} {}（{}）",
            item.name,
            movement.movement_type.as_str(),
            movement.quantity,
            item.unit,
            movement.counterparty.label()
        );
        Ok(movement)
    }

    fn check_supplier(&self, counterparty: &Counterparty) -> Result<()> {
        if let Some(supplier_id) = counterparty.supplier_id() {
            let supplier = self.repo.supplier(supplier_id)?;
            if !supplier.active {
                return Err(LedgerError::SupplierInactive(supplier_id));
            }
        }
        Ok(())
    }

    /// 記錄一筆入庫或出庫
    pub fn record_movement(
        &self,
        item_id: ItemId,
        movement_type: MovementType,
        quantity: Quantity,
        metadata: MovementMetadata,
        recorded_at: DateTime<Utc>,
    ) -> Result<StockMovement> {
        self.check_supplier(&metadata.counterparty)?;
        self.commit_locked(item_id, |item| {
            self.recorder
                .record(item, movement_type, quantity, metadata, recorded_at)
        })
    }

    /// 向供應商進貨
    pub fn receive_stock(
        &self,
        item_id: ItemId,
        quantity: Quantity,
        supplier_id: SupplierId,
        unit_cost: Option<Money>,
        recorded_at: DateTime<Utc>,
    ) -> Result<StockMovement> {
        let supplier = self.repo.supplier(supplier_id)?;
        let mut metadata =
            MovementMetadata::new(Counterparty::supplier(supplier.id, supplier.name));
        if let Some(cost) = unit_cost {
            metadata = metadata.with_unit_cost(cost);
        }
        self.record_movement(item_id, MovementType::In, quantity, metadata, recorded_at)
    }

    /// 廚房領用
    pub fn consume_stock(
        &self,
        item_id: ItemId,
        quantity: Quantity,
        used_by: impl Into<String>,
        purpose: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> Result<StockMovement> {
        let metadata = MovementMetadata::new(Counterparty::kitchen(used_by, purpose));
        self.record_movement(item_id, MovementType::Out, quantity, metadata, recorded_at)
    }

    /// 盤點調整
    pub fn adjust_stock(
        &self,
        item_id: ItemId,
        counted: Quantity,
        metadata: MovementMetadata,
        recorded_at: DateTime<Utc>,
    ) -> Result<StockMovement> {
        self.commit_locked(item_id, |item| {
            self.recorder.adjust(item, counted, metadata, recorded_at)
        })
    }

    /// 期初庫存
    pub fn open_balance(
        &self,
        item_id: ItemId,
        quantity: Quantity,
        metadata: MovementMetadata,
        recorded_at: DateTime<Utc>,
    ) -> Result<StockMovement> {
        self.commit_locked(item_id, |item| {
            self.recorder
                .open_balance(item, quantity, metadata, recorded_at)
        })
    }

    /// 單一物料的逐筆累計庫存
    pub fn item_history(&self, item_id: ItemId) -> Result<Vec<RunningBalance>> {
        self.repo.item(item_id)?;
        let movements = self.repo.movements_for(item_id)?;
        Ok(LedgerAggregator::running_balances(&movements)?
            .remove(&item_id)
            .unwrap_or_default())
    }

    // ---- 狀態與警示 ----

    /// 重新分級上次之後有變動的物料，回傳處理數量
    pub fn refresh_statuses(&self) -> Result<usize> {
        let dirty = self.dirty.lock().map_err(poisoned)?.take();
        if dirty.is_empty() {
            return Ok(0);
        }

        let mut statuses = self.statuses.write().map_err(poisoned)?;
        for item_id in &dirty {
            match self.repo.item(*item_id) {
                Ok(item) if item.active => {
                    statuses.insert(item.id, self.classifier.classify_item(&item));
                }
                Ok(_) | Err(LedgerError::ItemNotFound(_)) => {
                    statuses.remove(item_id);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!("重新分級 {} 個物料", dirty.len());
        Ok(dirty.len())
    }

    /// 所有啟用物料的庫存狀態
    pub fn statuses(&self) -> Result<HashMap<ItemId, StockStatus>> {
        self.refresh_statuses()?;
        Ok(self.statuses.read().map_err(poisoned)?.clone())
    }

    /// 依配置的警示範圍列出低庫存物料
    pub fn alerts(&self) -> Result<Vec<StockAlert>> {
        let items = self.repo.items()?;
        let alerts = self
            .classifier
            .low_stock_alerts(&items, self.config.alert_policy);
        if !alerts.is_empty() {
            tracing::warn!("{} 個物料庫存偏低", alerts.len());
        }
        Ok(alerts)
    }

    // ---- 彙總與報表 ----

    pub fn summarize(&self, window: TimeWindow) -> Result<LedgerSummary> {
        let items = self.repo.items()?;
        let movements = self.repo.all_movements()?;
        LedgerAggregator::new(&items).summarize(&movements, window)
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> Result<Dashboard> {
        DashboardBuilder::new(&self.config).build(
            &self.repo.items()?,
            &self.repo.categories()?,
            &self.repo.suppliers()?,
            &self.repo.all_movements()?,
            now,
        )
    }

    pub fn inventory_report(&self) -> Result<Vec<InventoryReportRow>> {
        let categories = self.repo.categories()?;
        ReportBuilder::new(&categories).inventory(&self.repo.items()?)
    }

    pub fn purchase_report(&self, window: TimeWindow) -> Result<Vec<PurchaseReportRow>> {
        let summary = self.summarize(window)?;
        let categories = self.repo.categories()?;
        Ok(ReportBuilder::new(&categories).purchases(&summary, &self.repo.suppliers()?))
    }

    pub fn usage_report(&self, window: TimeWindow) -> Result<Vec<UsageReportRow>> {
        let items = self.repo.items()?;
        let daily = LedgerAggregator::new(&items).daily_usage(&self.repo.all_movements()?, window)?;
        let categories = self.repo.categories()?;
        Ok(ReportBuilder::new(&categories).usage(&daily))
    }

    /// 重播所有異動並回傳與現有庫存不一致的物料
    pub fn verify_ledger(&self) -> Result<Vec<ReplayCheck>> {
        let items = self.repo.items()?;
        let movements = self.repo.all_movements()?;
        let mismatches = LedgerReplay::verify_all(&items, &movements)?;
        tracing::info!(
            "帳本檢查完成：{} 個物料，{} 個不一致",
            items.len(),
            mismatches.len()
        );
        Ok(mismatches)
    }
}
