//! 餐廳一日庫存示例

use anyhow::Result;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use stockledger::calc::ReportTable;
use stockledger::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== 餐廳一日庫存示例 ===\n");

    let ledger = StockLedger::new(InMemoryRepository::new(), LedgerConfig::default())?;
    let morning = Utc::now() - Duration::hours(10);

    // 建立目錄
    let vegetables = ledger.create_category("Vegetables")?;
    let dairy = ledger.create_category("Dairy")?;
    let farm = ledger.register_supplier(
        Supplier::new("Fresh Farm Co.", morning)
            .with_contact_person("John Smith".to_string())
            .with_email("orders@freshfarm.com".to_string()),
    )?;

    let tomatoes = ledger.create_item(
        InventoryItem::new("Tomatoes", vegetables.id, Unit::Kilogram, morning)
            .with_minimum_stock(Quantity::from_int(10))
            .with_unit_cost(Money::new(Decimal::new(250, 2))),
    )?;
    let milk = ledger.create_item(
        InventoryItem::new("Milk", dairy.id, Unit::Litre, morning)
            .with_minimum_stock(Quantity::from_int(5))
            .with_unit_cost(Money::new(Decimal::new(110, 2))),
    )?;

    // 期初與進貨
    let count = || MovementMetadata::internal("期初盤點");
    ledger.open_balance(tomatoes.id, Quantity::from_int(5), count(), morning)?;
    ledger.open_balance(milk.id, Quantity::from_int(8), count(), morning)?;
    ledger.receive_stock(
        tomatoes.id,
        Quantity::from_int(20),
        farm.id,
        None,
        morning + Duration::hours(1),
    )?;

    // 廚房領用
    ledger.consume_stock(
        tomatoes.id,
        Quantity::from_int(8),
        "Chef Lisa",
        Some("Lunch salsa".to_string()),
        morning + Duration::hours(3),
    )?;
    ledger.consume_stock(
        milk.id,
        Quantity::new(Decimal::new(45, 1))?,
        "Chef Ana",
        None,
        morning + Duration::hours(4),
    )?;

    // 超量領用會被拒絕
    let overdraw = ledger.consume_stock(
        milk.id,
        Quantity::from_int(10),
        "Chef Ana",
        None,
        morning + Duration::hours(5),
    );
    if let Err(e) = overdraw {
        println!("拒絕：{e}\n");
    }

    let dashboard = ledger.dashboard(Utc::now())?;
    println!("物料數: {}", dashboard.stats.total_items);
    println!("低庫存: {}", dashboard.stats.low_stock_items);
    println!("30 天用量: {}", dashboard.stats.monthly_usage);
    for alert in &dashboard.alerts {
        println!(
            "  ! {} {} {}（最低 {}）",
            alert.name,
            alert.current,
            alert.unit,
            alert.minimum
        );
    }

    let table = ReportTable::inventory(&ledger.inventory_report()?);
    println!("\n{}", table.title);
    println!("  {}", table.headers.join(" | "));
    for row in &table.rows {
        println!("  {}", row.join(" | "));
    }

    let mismatches = ledger.verify_ledger()?;
    println!("\n帳本檢查: {} 個不一致", mismatches.len());

    Ok(())
}
