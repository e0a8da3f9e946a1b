//! 庫存狀態分級

use ledger_core::{
    quantity, AlertPolicy, InventoryItem, ItemId, LedgerConfig, Quantity, Unit,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 庫存狀態（依嚴重程度排序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// 危急：現有 <= 最低
    Critical,
    /// 偏低：最低 < 現有 <= 最低 * 倍率
    Low,
    /// 充足
    Good,
}

impl StockStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::Critical => "Critical",
            StockStatus::Low => "Low",
            StockStatus::Good => "Good",
        }
    }

    /// 檢查在指定警示範圍內是否需要警示
    pub fn is_alert(&self, policy: AlertPolicy) -> bool {
        match policy {
            AlertPolicy::CriticalOnly => *self == StockStatus::Critical,
            AlertPolicy::CriticalAndLow => *self != StockStatus::Good,
        }
    }
}

/// 門檻分級器
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    low_multiplier: Decimal,
}

impl ThresholdClassifier {
    /// 創建新的分級器
    pub fn new(low_multiplier: Decimal) -> Self {
        Self { low_multiplier }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.low_stock_multiplier)
    }

    /// 依現有與最低庫存分級
    pub fn classify(&self, current: Quantity, minimum: Quantity) -> StockStatus {
        if current <= minimum {
            return StockStatus::Critical;
        }

        match quantity::multiply(minimum.value(), self.low_multiplier) {
            Ok(low_ceiling) if current.value() <= low_ceiling => StockStatus::Low,
            Ok(_) => StockStatus::Good,
            // 門檻超出可表示範圍，任何現有庫存都不會超過
            Err(_) => StockStatus::Low,
        }
    }

    pub fn classify_item(&self, item: &InventoryItem) -> StockStatus {
        self.classify(item.current_stock(), item.minimum_stock)
    }

    /// 找出需要警示的啟用物料（最嚴重優先，再依名稱）
    pub fn low_stock_alerts(
        &self,
        items: &[InventoryItem],
        policy: AlertPolicy,
    ) -> Vec<StockAlert> {
        let mut alerts: Vec<StockAlert> = items
            .iter()
            .filter(|item| item.active)
            .filter_map(|item| {
                let status = self.classify_item(item);
                status.is_alert(policy).then(|| StockAlert::new(item, status))
            })
            .collect();

        alerts.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.name.cmp(&b.name)));
        alerts
    }

    /// 統計各狀態的啟用物料數量
    pub fn status_breakdown(&self, items: &[InventoryItem]) -> StatusBreakdown {
        items
            .iter()
            .filter(|item| item.active)
            .fold(StatusBreakdown::default(), |mut acc, item| {
                match self.classify_item(item) {
                    StockStatus::Critical => acc.critical += 1,
                    StockStatus::Low => acc.low += 1,
                    StockStatus::Good => acc.good += 1,
                }
                acc
            })
    }
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

/// 使用預設倍率 1.5 分級
pub fn classify(current: Quantity, minimum: Quantity) -> StockStatus {
    ThresholdClassifier::default().classify(current, minimum)
}

/// 低庫存警示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlert {
    pub item_id: ItemId,
    pub name: String,
    pub unit: Unit,
    pub current: Quantity,
    pub minimum: Quantity,
    pub status: StockStatus,
    /// 距最低庫存的缺口（不小於 0）
    pub shortfall: Quantity,
}

impl StockAlert {
    fn new(item: &InventoryItem, status: StockStatus) -> Self {
        let current = item.current_stock();
        let shortfall = if current < item.minimum_stock {
            item.minimum_stock
                .checked_sub(current)
                .unwrap_or(item.minimum_stock)
        } else {
            Quantity::ZERO
        };

        Self {
            item_id: item.id,
            name: item.name.clone(),
            unit: item.unit,
            current,
            minimum: item.minimum_stock,
            status,
            shortfall,
        }
    }
}

/// 各狀態物料數量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub critical: usize,
    pub low: usize,
    pub good: usize,
}

impl StatusBreakdown {
    pub fn total(&self) -> usize {
        self.critical + self.low + self.good
    }
}
