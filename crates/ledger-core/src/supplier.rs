//! 供應商模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result, SupplierId};

/// 供應商
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    /// 供應商ID
    pub id: SupplierId,

    /// 名稱（唯一）
    pub name: String,

    /// 聯絡人
    pub contact_person: Option<String>,

    /// 電話
    pub phone: Option<String>,

    /// 電子郵件
    pub email: Option<String>,

    /// 地址
    pub address: Option<String>,

    /// 是否啟用
    pub active: bool,

    pub created_at: DateTime<Utc>,
}

impl Supplier {
    /// 創建新的供應商
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: SupplierId::new(),
            name: name.into(),
            contact_person: None,
            phone: None,
            email: None,
            address: None,
            active: true,
            created_at,
        }
    }

    /// 建構器模式：設置聯絡人
    pub fn with_contact_person(mut self, contact_person: String) -> Self {
        self.contact_person = Some(contact_person);
        self
    }

    /// 建構器模式：設置電話
    pub fn with_phone(mut self, phone: String) -> Self {
        self.phone = Some(phone);
        self
    }

    /// 建構器模式：設置電子郵件
    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    /// 建構器模式：設置地址
    pub fn with_address(mut self, address: String) -> Self {
        self.address = Some(address);
        self
    }

    /// 檢查供應商欄位
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::Validation("供應商名稱不可為空".to_string()));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(LedgerError::Validation(format!(
                    "無效的電子郵件: {email}"
                )));
            }
        }
        Ok(())
    }
}
