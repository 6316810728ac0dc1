//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::RepositoryError;

/// メッセージ履歴取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetMessageHistoryError {
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}
