use super::super::catalog::CatalogError;
use super::super::storage::StorageError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order already completed: {0}")]
    OrderAlreadyCompleted(String),

    #[error("Order already cancelled: {0}")]
    OrderAlreadyCancelled(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid item status: {0}")]
    InvalidItemStatus(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// 将存储错误转换为错误码（前端负责本地化）
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    match e {
        StorageError::Serialization(_) | StorageError::DanglingIndex(_) => {
            return ErrorCode::StorageCorrupted;
        }
        _ => {}
    }

    // redb 错误通过字符串匹配分类
    let err_str = e.to_string().to_lowercase();

    // 磁盘空间不足
    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return ErrorCode::StorageFull;
    }

    // 内存不足
    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return ErrorCode::OutOfMemory;
    }

    // 数据损坏
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    ErrorCode::DatabaseError
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                // 不向客户端暴露存储细节，整单失败，客户端整体重试
                AppError::new(code)
            }
            ManagerError::Catalog(e) => {
                tracing::error!(error = %e, "Menu catalog lookup failed");
                AppError::new(ErrorCode::SystemBusy)
            }
            ManagerError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order not found: {}", id))
                    .with_detail("order_id", id)
            }
            ManagerError::OrderAlreadyCompleted(id) => AppError::with_message(
                ErrorCode::OrderAlreadyCompleted,
                format!("Order already completed: {}", id),
            )
            .with_detail("order_id", id),
            ManagerError::OrderAlreadyCancelled(id) => AppError::with_message(
                ErrorCode::OrderAlreadyCancelled,
                format!("Order already cancelled: {}", id),
            )
            .with_detail("order_id", id),
            ManagerError::ItemNotFound(id) => AppError::with_message(
                ErrorCode::OrderItemNotFound,
                format!("Item not found: {}", id),
            )
            .with_detail("item_id", id),
            ManagerError::MenuItemNotFound(id) => AppError::with_message(
                ErrorCode::MenuItemNotFound,
                format!("Menu item not found: {}", id),
            )
            .with_detail("menu_item_id", id),
            ManagerError::EmptyOrder => AppError::new(ErrorCode::OrderEmpty),
            ManagerError::InvalidQuantity(msg) => {
                AppError::with_message(ErrorCode::InvalidQuantity, msg)
            }
            ManagerError::InvalidAmount(msg) => {
                AppError::with_message(ErrorCode::PaymentInvalidAmount, msg)
            }
            ManagerError::InvalidPrice(msg) => {
                AppError::with_message(ErrorCode::MenuItemInvalidPrice, msg)
            }
            ManagerError::InvalidItemStatus(msg) => {
                AppError::with_message(ErrorCode::InvalidItemStatus, msg)
            }
            ManagerError::InvalidOperation(msg) => AppError::validation(msg),
            ManagerError::Internal(msg) => AppError::internal(msg),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping_keeps_id() {
        let app: AppError = ManagerError::OrderNotFound("o-1".into()).into();
        assert_eq!(app.code, ErrorCode::OrderNotFound);
        assert_eq!(app.details.unwrap().get("order_id").unwrap(), "o-1");
    }

    #[test]
    fn test_validation_mapping() {
        let app: AppError = ManagerError::EmptyOrder.into();
        assert_eq!(app.code, ErrorCode::OrderEmpty);

        let app: AppError = ManagerError::InvalidItemStatus("cancelled".into()).into();
        assert_eq!(app.code, ErrorCode::InvalidItemStatus);
    }

    #[test]
    fn test_storage_error_is_opaque() {
        let json_err = serde_json::from_slice::<u8>(b"x").unwrap_err();
        let app: AppError = ManagerError::Storage(StorageError::Serialization(json_err)).into();
        assert_eq!(app.code, ErrorCode::StorageCorrupted);
        assert_eq!(app.message, ErrorCode::StorageCorrupted.message());
    }
}
