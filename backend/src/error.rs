//! Error handling for KitchenCommand
//!
//! Provides consistent error responses in English and French

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_fr: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Insufficient stock for {item}")]
    InsufficientStock {
        item: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Unit mismatch for {item}: cannot convert {from} into {to}")]
    UnitMismatch {
        item: String,
        from: String,
        to: String,
    },

    // Defensive: the resolver chain terminates in a count default, so this
    // only fires on corrupt item metadata
    #[error("Deduction strategy unresolved: {0}")]
    StrategyUnresolved(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message, message_fr } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_fr: message_fr.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_fr: format!("Données invalides : {}", msg),
                    field: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message_en: format!("A record with this {} already exists", field),
                    message_fr: format!("Un enregistrement avec ce {} existe déjà", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::Conflict { resource, message, message_fr } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message_en: message.clone(),
                    message_fr: message_fr.clone(),
                    field: Some(resource.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_fr: format!("{} introuvable", resource),
                    field: None,
                },
            ),
            AppError::InvalidTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_TRANSITION".to_string(),
                    message_en: msg.clone(),
                    message_fr: format!("Changement de statut impossible : {}", msg),
                    field: None,
                },
            ),
            AppError::InsufficientStock { item, requested, available } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient stock for {}: requested {}, available {}",
                        item, requested, available
                    ),
                    message_fr: format!(
                        "Stock insuffisant pour {} : demandé {}, disponible {}",
                        item, requested, available
                    ),
                    field: None,
                },
            ),
            AppError::UnitMismatch { item, from, to } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "UNIT_MISMATCH".to_string(),
                    message_en: format!("Cannot convert {} into {} for {}", from, to, item),
                    message_fr: format!(
                        "Impossible de convertir {} en {} pour {}",
                        from, to, item
                    ),
                    field: None,
                },
            ),
            AppError::StrategyUnresolved(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "STRATEGY_UNRESOLVED".to_string(),
                    message_en: format!("Deduction strategy unresolved: {}", msg),
                    message_fr: format!("Stratégie de déduction non résolue : {}", msg),
                    field: None,
                },
            ),
            AppError::StorageError(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "STORAGE_ERROR".to_string(),
                    message_en: format!("Storage error: {}", msg),
                    message_fr: format!("Erreur de stockage : {}", msg),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_fr: format!("Erreur de configuration : {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_fr: "Une erreur de base de données est survenue".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_fr: "Une erreur interne est survenue".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_fr: "Une erreur interne est survenue".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
