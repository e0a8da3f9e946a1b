//! 首頁儀表板

use chrono::{DateTime, Utc};
use ledger_core::{
    Category, InventoryItem, ItemId, LedgerConfig, MovementType, Quantity, Result,
    StockMovement, Supplier, Unit,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::aggregator::TimeWindow;
use crate::classifier::{StatusBreakdown, StockAlert, ThresholdClassifier};
use crate::report::ReportBuilder;

/// 統計數字
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// 啟用物料數
    pub total_items: usize,
    /// 現有 <= 最低的物料數
    pub low_stock_items: usize,
    /// 啟用供應商數
    pub total_suppliers: usize,
    /// 最近用量期間的出庫合計
    pub monthly_usage: Quantity,
}

/// 分類庫存分布
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub quantity: Quantity,
}

/// 最近異動
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub item_id: ItemId,
    pub item_name: String,
    pub unit: Option<Unit>,
    pub movement_type: MovementType,
    pub quantity: Quantity,
    pub counterparty: String,
    pub recorded_at: DateTime<Utc>,
}

/// 儀表板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub alerts: Vec<StockAlert>,
    pub status_breakdown: StatusBreakdown,
    pub category_distribution: Vec<CategoryShare>,
    pub recent_activity: Vec<RecentActivity>,
}

/// 儀表板產生器
pub struct DashboardBuilder<'a> {
    config: &'a LedgerConfig,
    classifier: ThresholdClassifier,
}

impl<'a> DashboardBuilder<'a> {
    pub fn new(config: &'a LedgerConfig) -> Self {
        Self {
            config,
            classifier: ThresholdClassifier::from_config(config),
        }
    }

    pub fn build(
        &self,
        items: &[InventoryItem],
        categories: &[Category],
        suppliers: &[Supplier],
        movements: &[StockMovement],
        now: DateTime<Utc>,
    ) -> Result<Dashboard> {
        tracing::info!(
            "產生儀表板：{} 個物料，{} 筆異動",
            items.len(),
            movements.len()
        );

        let active: Vec<InventoryItem> = items.iter().filter(|i| i.active).cloned().collect();

        let window = TimeWindow::trailing_days(now, self.config.usage_window_days);
        let monthly_usage = Quantity::checked_sum(
            movements
                .iter()
                .filter(|m| m.is_outbound() && window.contains(m.occurred_at))
                .map(|m| m.quantity),
        )?;

        let stats = DashboardStats {
            total_items: active.len(),
            low_stock_items: active
                .iter()
                .filter(|item| item.current_stock() <= item.minimum_stock)
                .count(),
            total_suppliers: suppliers.iter().filter(|s| s.active).count(),
            monthly_usage,
        };

        Ok(Dashboard {
            stats,
            alerts: self
                .classifier
                .low_stock_alerts(&active, self.config.alert_policy),
            status_breakdown: self.classifier.status_breakdown(&active),
            category_distribution: category_distribution(&active, categories)?,
            recent_activity: self.recent_activity(items, movements),
        })
    }

    /// 最近 N 筆異動（依記錄時間由新到舊）
    fn recent_activity(
        &self,
        items: &[InventoryItem],
        movements: &[StockMovement],
    ) -> Vec<RecentActivity> {
        let by_id: HashMap<ItemId, &InventoryItem> = items.iter().map(|i| (i.id, i)).collect();

        let mut ordered: Vec<&StockMovement> = movements.iter().collect();
        ordered.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then_with(|| b.id.cmp(&a.id)));

        ordered
            .into_iter()
            .take(self.config.recent_activity_limit)
            .map(|movement| {
                let item = by_id.get(&movement.item_id);
                RecentActivity {
                    item_id: movement.item_id,
                    item_name: item.map_or_else(|| "Unknown Item".to_string(), |i| i.name.clone()),
                    unit: item.map(|i| i.unit),
                    movement_type: movement.movement_type,
                    quantity: movement.quantity,
                    counterparty: movement.counterparty.label().to_string(),
                    recorded_at: movement.recorded_at,
                }
            })
            .collect()
    }
}

/// 各分類現有庫存（依分類名稱）
fn category_distribution(
    items: &[InventoryItem],
    categories: &[Category],
) -> Result<Vec<CategoryShare>> {
    let names = ReportBuilder::new(categories);
    let mut totals: BTreeMap<&str, Quantity> = BTreeMap::new();
    for item in items {
        let total = totals.entry(names.category_name(item.category_id)).or_default();
        *total = total.checked_add(item.current_stock())?;
    }
    Ok(totals
        .into_iter()
        .map(|(category, quantity)| CategoryShare {
            category: category.to_string(),
            quantity,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{MovementMetadata, MovementRecorder};
    use chrono::Duration;
    use ledger_core::{CategoryId, Counterparty};

    #[test]
    fn test_dashboard_stats() {
        let config = LedgerConfig::default().with_recent_activity_limit(2);
        let recorder = MovementRecorder::new(&config);
        let now = Utc::now();
        let vegetables = Category::new("Vegetables");
        let supplier = Supplier::new("Fresh Farm Co.", now);
        let mut retired_supplier = Supplier::new("Old Market", now);
        retired_supplier.active = false;

        let mut movements = Vec::new();
        let tomatoes = InventoryItem::new("Tomatoes", vegetables.id, Unit::Kilogram, now)
            .with_minimum_stock(Quantity::from_int(10));
        let (tomatoes, m) = recorder
            .open_balance(
                &tomatoes,
                Quantity::from_int(5),
                MovementMetadata::internal("期初"),
                now - Duration::days(40),
            )
            .unwrap();
        movements.push(m);
        let (tomatoes, m) = recorder
            .record(
                &tomatoes,
                MovementType::In,
                Quantity::from_int(20),
                MovementMetadata::new(Counterparty::supplier(supplier.id, "Fresh Farm Co.")),
                now - Duration::days(35),
            )
            .unwrap();
        movements.push(m);
        // 超出 30 天，不計入用量
        let (tomatoes, m) = recorder
            .record(
                &tomatoes,
                MovementType::Out,
                Quantity::from_int(2),
                MovementMetadata::new(Counterparty::kitchen("Chef Lisa", None)),
                now - Duration::days(31),
            )
            .unwrap();
        movements.push(m);
        let (tomatoes, m) = recorder
            .record(
                &tomatoes,
                MovementType::Out,
                Quantity::from_int(8),
                MovementMetadata::new(Counterparty::kitchen("Chef Lisa", Some("Salsa".into()))),
                now - Duration::days(1),
            )
            .unwrap();
        movements.push(m);

        // 庫存 0、最低 4，且分類不存在
        let beef = InventoryItem::new("Beef", CategoryId::new(), Unit::Kilogram, now)
            .with_minimum_stock(Quantity::from_int(4));

        let items = vec![tomatoes, beef];
        let dashboard = DashboardBuilder::new(&config)
            .build(
                &items,
                &[vegetables],
                &[supplier, retired_supplier],
                &movements,
                now,
            )
            .unwrap();

        assert_eq!(dashboard.stats.total_items, 2);
        assert_eq!(dashboard.stats.low_stock_items, 1);
        assert_eq!(dashboard.stats.total_suppliers, 1);
        assert_eq!(dashboard.stats.monthly_usage, Quantity::from_int(8));

        // Tomatoes 15 / 10 為偏低
        assert_eq!(dashboard.alerts.len(), 2);
        assert_eq!(dashboard.alerts[0].name, "Beef");
        assert_eq!(dashboard.status_breakdown.low, 1);

        assert_eq!(
            dashboard.category_distribution,
            vec![
                CategoryShare {
                    category: "Uncategorized".to_string(),
                    quantity: Quantity::ZERO,
                },
                CategoryShare {
                    category: "Vegetables".to_string(),
                    quantity: Quantity::from_int(15),
                },
            ]
        );

        assert_eq!(dashboard.recent_activity.len(), 2);
        assert_eq!(dashboard.recent_activity[0].quantity, Quantity::from_int(8));
        assert_eq!(dashboard.recent_activity[0].counterparty, "Chef Lisa");
        assert_eq!(dashboard.recent_activity[1].movement_type, MovementType::Out);
    }
}
