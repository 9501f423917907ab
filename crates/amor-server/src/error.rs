use amor_shared::protocol::SaveResponse;
use amor_shared::ValidationError;
use amor_store::StoreError;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid preferences: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Body could not be read, e.g. over the size limit.
    #[error("Request body rejected: {0}")]
    Body(#[from] BytesRejection),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Validation(ValidationError::Empty) => (
                StatusCode::BAD_REQUEST,
                "Nenhuma preferência fornecida para salvar.".to_string(),
            ),
            ServerError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Storage(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Erro ao salvar preferências no servidor: {e}"),
            ),
            ServerError::Body(rejection) => (
                rejection.status(),
                format!("Corpo da requisição rejeitado: {}", rejection.body_text()),
            ),
        };

        (status, axum::Json(SaveResponse::failed(message))).into_response()
    }
}
