//! UseCase 層
//!
//! リアルタイム配信（Room Registry）以外の読み取り系ユースケースを置く。

mod error;
mod get_message_history;

pub use error::GetMessageHistoryError;
pub use get_message_history::GetMessageHistoryUseCase;
