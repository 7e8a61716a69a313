use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Error,
    Info,
}

/// One-shot status message carried across a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub category: FlashCategory,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Info,
            message: message.into(),
        }
    }
}

/// Messages shown to users. Kept together so the wording stays consistent
/// between the password and single sign-on paths.
pub mod messages {
    pub const EMAIL_NOT_REGISTERED: &str = "البريد الإلكتروني غير مسجل في النظام";
    pub const WRONG_PASSWORD: &str = "كلمة المرور غير صحيحة";
    pub const SSO_NOT_REGISTERED: &str =
        "هذا البريد الإلكتروني غير مسجل في النظام. تواصل مع المسؤول للحصول على صلاحية الدخول.";
    pub const SSO_FAILED: &str = "حدث خطأ أثناء تسجيل الدخول. حاول مرة أخرى.";
    pub const SSO_UNAVAILABLE: &str = "تسجيل الدخول عبر جوجل غير متاح حالياً";
    pub const NO_TENANT_ACCESS: &str = "ليس لديك صلاحية للوصول لهذا العميل";
    pub const NAME_AND_EMAIL_REQUIRED: &str = "الاسم والإيميل مطلوبان";
    pub const EMAIL_ALREADY_REGISTERED: &str = "هذا الإيميل مسجل مسبقاً";
    pub const USER_DELETED: &str = "تم حذف المستخدم بنجاح";

    pub fn user_added(name: &str) -> String {
        format!("تم إضافة المستخدم {} بنجاح", name)
    }

    pub fn user_edited(name: &str) -> String {
        format!("تم تعديل المستخدم {} بنجاح", name)
    }

    pub fn user_toggled(name: &str, active: bool) -> String {
        let status = if active { "تفعيل" } else { "تعطيل" };
        format!("تم {} المستخدم {}", status, name)
    }
}
