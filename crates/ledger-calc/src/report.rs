//! 報表產生
//!
//! 產出庫存、採購與用量三種報表。數值保留完整精度，
//! 轉成 [`ReportTable`] 時才格式化成字串交給匯出端。

use chrono::NaiveDate;
use ledger_core::{Category, CategoryId, InventoryItem, Money, Quantity, Result, Supplier};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::aggregator::{DailyUsage, LedgerSummary};

/// 找不到分類時的顯示名稱
pub const UNCATEGORIZED: &str = "Uncategorized";

/// 找不到供應商時的顯示名稱
pub const UNKNOWN_SUPPLIER: &str = "Unknown Supplier";

/// 庫存報表列（每個分類一列）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReportRow {
    pub category: String,
    /// 現有庫存合計
    pub current: Quantity,
    /// 最低庫存合計
    pub target: Quantity,
    /// 現有庫存 * 目前單價
    pub value: Money,
}

/// 採購報表列（每個供應商一列）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReportRow {
    pub supplier: String,
    pub amount: Money,
    /// 入庫筆數
    pub orders: usize,
}

/// 用量報表列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReportRow {
    pub date: NaiveDate,
    pub category: String,
    pub quantity: Quantity,
}

/// 匯出用的純文字表格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    fn new(title: &str, headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    pub fn inventory(rows: &[InventoryReportRow]) -> Self {
        Self::new(
            "Inventory Report",
            &["Category", "Current Stock", "Target Stock", "Value ($)"],
            rows.iter()
                .map(|row| {
                    vec![
                        row.category.clone(),
                        row.current.to_string(),
                        row.target.to_string(),
                        row.value.display(),
                    ]
                })
                .collect(),
        )
    }

    pub fn purchases(rows: &[PurchaseReportRow]) -> Self {
        Self::new(
            "Purchase Report",
            &["Supplier", "Amount ($)", "Orders"],
            rows.iter()
                .map(|row| {
                    vec![
                        row.supplier.clone(),
                        row.amount.display(),
                        row.orders.to_string(),
                    ]
                })
                .collect(),
        )
    }

    pub fn usage(rows: &[UsageReportRow]) -> Self {
        Self::new(
            "Usage Report",
            &["Date", "Category", "Quantity"],
            rows.iter()
                .map(|row| {
                    vec![
                        row.date.format("%Y-%m-%d").to_string(),
                        row.category.clone(),
                        row.quantity.to_string(),
                    ]
                })
                .collect(),
        )
    }
}

/// 報表產生器
pub struct ReportBuilder<'a> {
    category_names: HashMap<CategoryId, &'a str>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        Self {
            category_names: categories
                .iter()
                .map(|c| (c.id, c.name.as_str()))
                .collect(),
        }
    }

    /// 分類名稱，未知分類歸入 "Uncategorized"
    pub fn category_name(&self, category_id: CategoryId) -> &'a str {
        self.category_names
            .get(&category_id)
            .copied()
            .unwrap_or(UNCATEGORIZED)
    }

    /// 庫存報表（只計入啟用物料，依分類名稱排序）
    pub fn inventory(&self, items: &[InventoryItem]) -> Result<Vec<InventoryReportRow>> {
        let mut rows: BTreeMap<&str, InventoryReportRow> = BTreeMap::new();

        for item in items.iter().filter(|item| item.active) {
            let category = self.category_name(item.category_id);
            let row = rows.entry(category).or_insert_with(|| InventoryReportRow {
                category: category.to_string(),
                current: Quantity::ZERO,
                target: Quantity::ZERO,
                value: Money::ZERO,
            });
            row.current = row.current.checked_add(item.current_stock())?;
            row.target = row.target.checked_add(item.minimum_stock)?;
            row.value = row.value.checked_add(item.stock_value()?)?;
        }

        tracing::debug!("庫存報表：{} 個分類", rows.len());
        Ok(rows.into_values().collect())
    }

    /// 採購報表（依金額由高到低）
    pub fn purchases(
        &self,
        summary: &LedgerSummary,
        suppliers: &[Supplier],
    ) -> Vec<PurchaseReportRow> {
        let names: HashMap<_, _> = suppliers.iter().map(|s| (s.id, s.name.as_str())).collect();

        let mut rows: Vec<PurchaseReportRow> = summary
            .per_supplier
            .iter()
            .map(|(supplier_id, totals)| PurchaseReportRow {
                supplier: names
                    .get(supplier_id)
                    .copied()
                    .unwrap_or(UNKNOWN_SUPPLIER)
                    .to_string(),
                amount: totals.value_in,
                orders: totals.movements,
            })
            .collect();

        rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.supplier.cmp(&b.supplier)));
        rows
    }

    /// 用量報表
    pub fn usage(&self, daily: &[DailyUsage]) -> Vec<UsageReportRow> {
        daily
            .iter()
            .map(|usage| UsageReportRow {
                date: usage.date,
                category: self.category_name(usage.category_id).to_string(),
                quantity: usage.quantity,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{LedgerAggregator, TimeWindow};
    use crate::recorder::{MovementMetadata, MovementRecorder};
    use chrono::{Duration, Utc};
    use ledger_core::{Counterparty, MovementType, Unit};
    use rust_decimal::Decimal;

    fn money(s: &str) -> Money {
        Money::new(s.parse::<Decimal>().unwrap())
    }

    #[test]
    fn test_inventory_report_groups_by_category() {
        let vegetables = Category::new("Vegetables");
        let categories = vec![vegetables.clone()];
        let recorder = MovementRecorder::default();
        let now = Utc::now();

        let tomatoes = InventoryItem::new("Tomatoes", vegetables.id, Unit::Kilogram, now)
            .with_minimum_stock(Quantity::from_int(10))
            .with_unit_cost(money("2.50"));
        let (tomatoes, _) = recorder
            .open_balance(
                &tomatoes,
                Quantity::from_int(12),
                MovementMetadata::internal("期初"),
                now,
            )
            .unwrap();
        let onions = InventoryItem::new("Onions", vegetables.id, Unit::Kilogram, now)
            .with_minimum_stock(Quantity::from_int(5))
            .with_unit_cost(money("1.20"));
        let (onions, _) = recorder
            .open_balance(
                &onions,
                Quantity::from_int(10),
                MovementMetadata::internal("期初"),
                now,
            )
            .unwrap();
        // 分類不存在
        let stray = InventoryItem::new("Saffron", CategoryId::new(), Unit::Gram, now);

        let rows = ReportBuilder::new(&categories)
            .inventory(&[tomatoes, onions, stray])
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, UNCATEGORIZED);
        assert_eq!(rows[1].category, "Vegetables");
        assert_eq!(rows[1].current, Quantity::from_int(22));
        assert_eq!(rows[1].target, Quantity::from_int(15));
        assert_eq!(rows[1].value, money("42"));

        let table = ReportTable::inventory(&rows);
        assert_eq!(
            table.headers,
            vec!["Category", "Current Stock", "Target Stock", "Value ($)"]
        );
        assert_eq!(table.rows[1][3], "42.00");
    }

    #[test]
    fn test_purchase_and_usage_reports() {
        let dairy = Category::new("Dairy");
        let categories = vec![dairy.clone()];
        let supplier = Supplier::new("Dairy Fresh", Utc::now());
        let recorder = MovementRecorder::default();
        let now = Utc::now();

        let milk = InventoryItem::new("Milk", dairy.id, Unit::Litre, now - Duration::hours(2))
            .with_unit_cost(money("1.10"));
        let (milk, receipt) = recorder
            .record(
                &milk,
                MovementType::In,
                Quantity::from_int(20),
                MovementMetadata::new(Counterparty::supplier(supplier.id, &supplier.name)),
                now - Duration::hours(1),
            )
            .unwrap();
        let (milk, usage) = recorder
            .record(
                &milk,
                MovementType::Out,
                Quantity::from_int(3),
                MovementMetadata::new(Counterparty::kitchen("Chef Ana", None)),
                now,
            )
            .unwrap();

        let items = vec![milk];
        let movements = vec![receipt, usage];
        let aggregator = LedgerAggregator::new(&items);
        let summary = aggregator
            .summarize(&movements, TimeWindow::unbounded())
            .unwrap();
        let builder = ReportBuilder::new(&categories);

        let purchases = builder.purchases(&summary, &[supplier]);
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].supplier, "Dairy Fresh");
        assert_eq!(purchases[0].amount, money("22"));
        assert_eq!(purchases[0].orders, 1);
        assert_eq!(ReportTable::purchases(&purchases).rows[0], vec!["Dairy Fresh", "22.00", "1"]);

        let daily = aggregator
            .daily_usage(&movements, TimeWindow::unbounded())
            .unwrap();
        let usage_rows = builder.usage(&daily);
        assert_eq!(usage_rows.len(), 1);
        assert_eq!(usage_rows[0].category, "Dairy");
        assert_eq!(usage_rows[0].quantity, Quantity::from_int(3));

        // 供應商已被移除時
        let orphan = builder.purchases(&summary, &[]);
        assert_eq!(orphan[0].supplier, UNKNOWN_SUPPLIER);
    }
}
