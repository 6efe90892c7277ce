use super::super::storage::StorageError;
use super::super::traits::OrderError;
use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(i64),

    #[error("Menu item unavailable: {0}")]
    MenuItemUnavailable(i64),

    #[error("{0}")]
    OutOfStock(String),

    #[error("{0}")]
    OrderNotEditable(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Concurrent update conflict on order {0}")]
    ConcurrencyConflict(String),
}

/// Map a storage error to an error code
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    match e {
        StorageError::Serialization(_) => ErrorCode::InternalError,
        StorageError::SequenceConflict { .. } => ErrorCode::ConcurrencyConflict,
        _ => ErrorCode::DatabaseError,
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        let message = err.to_string();
        let code = match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                code
            }
            ManagerError::Validation(_) => ErrorCode::ValidationFailed,
            ManagerError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            ManagerError::ItemNotFound(_) => ErrorCode::OrderItemNotFound,
            ManagerError::TicketNotFound(_) => ErrorCode::TicketNotFound,
            ManagerError::MenuItemNotFound(_) => ErrorCode::MenuItemNotFound,
            ManagerError::MenuItemUnavailable(_) => ErrorCode::MenuItemUnavailable,
            ManagerError::OutOfStock(_) => ErrorCode::ProductOutOfStock,
            ManagerError::OrderNotEditable(_) => ErrorCode::OrderNotEditable,
            ManagerError::InvalidTransition(_) => ErrorCode::InvalidTransition,
            ManagerError::ConcurrencyConflict(_) => ErrorCode::ConcurrencyConflict,
        };
        ApiError::with_message(code, message)
    }
}

impl From<OrderError> for ManagerError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::Validation(msg) => ManagerError::Validation(msg),
            OrderError::OrderNotFound(id) => ManagerError::OrderNotFound(id),
            OrderError::ItemNotFound(id) => ManagerError::ItemNotFound(id),
            OrderError::TicketNotFound(id) => ManagerError::TicketNotFound(id),
            OrderError::MenuItemNotFound(id) => ManagerError::MenuItemNotFound(id),
            OrderError::MenuItemUnavailable(id) => ManagerError::MenuItemUnavailable(id),
            OrderError::OrderNotEditable { .. } => ManagerError::OrderNotEditable(message),
            OrderError::InvalidTransition { .. } => ManagerError::InvalidTransition(message),
            OrderError::Inventory(_) => ManagerError::OutOfStock(message),
            OrderError::SequenceConflict { order_id, .. } => {
                ManagerError::ConcurrencyConflict(order_id)
            }
            OrderError::ConcurrencyConflict(order_id) => {
                ManagerError::ConcurrencyConflict(order_id)
            }
            OrderError::Storage(e) => ManagerError::Storage(e),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
