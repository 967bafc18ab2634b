//! Error types for filedepot

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Store Errors ===
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // === Transaction Errors ===
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    // === Network Errors ===
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::Status),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    // === Encoding Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert to gRPC status for RPC responses
    pub fn to_grpc_status(&self) -> tonic::Status {
        use tonic::Code;
        match self {
            Error::AlreadyExists(_) => tonic::Status::new(Code::AlreadyExists, self.to_string()),
            Error::InvalidPayload(_) | Error::Json(_) | Error::Base64(_) => {
                tonic::Status::new(Code::InvalidArgument, self.to_string())
            }
            Error::Timeout(_) => tonic::Status::new(Code::DeadlineExceeded, self.to_string()),
            Error::ConnectionFailed(_) => tonic::Status::new(Code::Unavailable, self.to_string()),
            Error::Grpc(status) => status.clone(),
            _ => tonic::Status::new(Code::Internal, self.to_string()),
        }
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::InvalidPayload(_) | Error::Json(_) | Error::Base64(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Error::ConnectionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            Error::AlreadyExists("alice".into()).to_http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::InvalidPayload("missing field".into()).to_http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Timeout("vote request".into()).to_http_status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            Error::Internal("oops".into()).to_http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_grpc_status_mapping() {
        assert_eq!(
            Error::Timeout("vote request".into()).to_grpc_status().code(),
            tonic::Code::DeadlineExceeded
        );
        assert_eq!(
            Error::ConnectionFailed("storage:6001".into())
                .to_grpc_status()
                .code(),
            tonic::Code::Unavailable
        );
    }
}
