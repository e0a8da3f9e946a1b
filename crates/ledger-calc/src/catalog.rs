//! 物料目錄：搜尋、篩選與名稱唯一性

use ledger_core::{
    Category, CategoryId, InventoryItem, ItemId, LedgerError, Result, Supplier, SupplierId,
};

use crate::classifier::{StockStatus, ThresholdClassifier};

/// 名稱比對用的正規化（去頭尾空白、不分大小寫）
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn ensure_unique<'a>(mut existing: impl Iterator<Item = &'a str>, name: &str) -> Result<()> {
    let wanted = normalize_name(name);
    if wanted.is_empty() {
        return Err(LedgerError::Validation("名稱不可為空".to_string()));
    }
    if existing.any(|other| normalize_name(other) == wanted) {
        return Err(LedgerError::DuplicateName(name.trim().to_string()));
    }
    Ok(())
}

/// 檢查物料名稱在目錄內唯一（`except` 為正在編輯的物料）
pub fn ensure_unique_item_name(
    items: &[InventoryItem],
    name: &str,
    except: Option<ItemId>,
) -> Result<()> {
    ensure_unique(
        items
            .iter()
            .filter(|item| Some(item.id) != except)
            .map(|item| item.name.as_str()),
        name,
    )
}

/// 檢查供應商名稱唯一
pub fn ensure_unique_supplier_name(
    suppliers: &[Supplier],
    name: &str,
    except: Option<SupplierId>,
) -> Result<()> {
    ensure_unique(
        suppliers
            .iter()
            .filter(|supplier| Some(supplier.id) != except)
            .map(|supplier| supplier.name.as_str()),
        name,
    )
}

/// 檢查分類名稱唯一
pub fn ensure_unique_category_name(categories: &[Category], name: &str) -> Result<()> {
    ensure_unique(categories.iter().map(|c| c.name.as_str()), name)
}

/// 物料篩選條件
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// 搜尋字串（比對名稱與說明）
    pub search: Option<String>,
    /// 分類（None 表示全部）
    pub category: Option<CategoryId>,
    /// 庫存狀態
    pub status: Option<StockStatus>,
    /// 是否包含停用物料
    pub include_inactive: bool,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置搜尋字串
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search)
        };
        self
    }

    /// 建構器模式：設置分類
    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// 建構器模式：設置庫存狀態
    pub fn with_status(mut self, status: StockStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// 建構器模式：包含停用物料
    pub fn with_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    pub fn matches(&self, item: &InventoryItem, classifier: &ThresholdClassifier) -> bool {
        if !self.include_inactive && !item.active {
            return false;
        }
        if self.category.is_some_and(|category| category != item.category_id) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = normalize_name(search);
            let in_name = item.name.to_lowercase().contains(&needle);
            let in_description = item
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_name && !in_description {
                return false;
            }
        }
        if let Some(status) = self.status {
            if classifier.classify_item(item) != status {
                return false;
            }
        }
        true
    }

    /// 套用篩選，保留原順序
    pub fn apply<'a>(
        &self,
        items: &'a [InventoryItem],
        classifier: &ThresholdClassifier,
    ) -> Vec<&'a InventoryItem> {
        items
            .iter()
            .filter(|item| self.matches(item, classifier))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ledger_core::{Quantity, Unit};

    fn catalog() -> (Vec<InventoryItem>, CategoryId, CategoryId) {
        let vegetables = CategoryId::new();
        let dairy = CategoryId::new();
        let now = Utc::now();
        let mut retired = InventoryItem::new("Old Cream", dairy, Unit::Litre, now);
        retired.deactivate(now);
        let items = vec![
            InventoryItem::new("Tomatoes", vegetables, Unit::Kilogram, now)
                .with_minimum_stock(Quantity::from_int(10))
                .with_description("Roma, vine ripened".to_string()),
            InventoryItem::new("Onions", vegetables, Unit::Kilogram, now),
            InventoryItem::new("Milk", dairy, Unit::Litre, now),
            retired,
        ];
        (items, vegetables, dairy)
    }

    #[test]
    fn test_search_name_and_description() {
        let (items, _, _) = catalog();
        let classifier = ThresholdClassifier::default();

        let found = CatalogFilter::new().with_search("TOMA").apply(&items, &classifier);
        assert_eq!(found.len(), 1);

        let found = CatalogFilter::new().with_search("vine").apply(&items, &classifier);
        assert_eq!(found[0].name, "Tomatoes");

        // 空白搜尋等於不篩選
        let found = CatalogFilter::new().with_search("  ").apply(&items, &classifier);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_category_and_inactive() {
        let (items, vegetables, dairy) = catalog();
        let classifier = ThresholdClassifier::default();

        let veg = CatalogFilter::new().with_category(vegetables).apply(&items, &classifier);
        assert_eq!(veg.len(), 2);

        let dairy_active = CatalogFilter::new().with_category(dairy).apply(&items, &classifier);
        assert_eq!(dairy_active.len(), 1);

        let dairy_all = CatalogFilter::new()
            .with_category(dairy)
            .with_inactive()
            .apply(&items, &classifier);
        assert_eq!(dairy_all.len(), 2);
    }

    #[test]
    fn test_status_filter() {
        let (items, _, _) = catalog();
        let classifier = ThresholdClassifier::default();
        // 所有物料庫存皆為 0，全部為危急
        let critical = CatalogFilter::new()
            .with_status(StockStatus::Critical)
            .apply(&items, &classifier);
        assert_eq!(critical.len(), 3);
        let good = CatalogFilter::new()
            .with_status(StockStatus::Good)
            .apply(&items, &classifier);
        assert!(good.is_empty());
    }

    #[test]
    fn test_unique_names() {
        let (items, _, _) = catalog();
        assert!(matches!(
            ensure_unique_item_name(&items, " tomatoes ", None),
            Err(LedgerError::DuplicateName(_))
        ));
        assert!(ensure_unique_item_name(&items, "Tomatoes", Some(items[0].id)).is_ok());
        assert!(ensure_unique_item_name(&items, "Garlic", None).is_ok());
        assert!(matches!(
            ensure_unique_item_name(&items, "", None),
            Err(LedgerError::Validation(_))
        ));

        let categories = vec![Category::new("Vegetables")];
        assert!(ensure_unique_category_name(&categories, "VEGETABLES").is_err());

        let suppliers = vec![Supplier::new("Dairy Fresh", Utc::now())];
        assert!(ensure_unique_supplier_name(&suppliers, "dairy fresh", None).is_err());
    }
}
