//! UseCase: Room のメッセージ履歴取得
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - GetMessageHistoryUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 履歴はリアルタイム配信と同じ Repository から読まれるため、
//!   Registry を経由せずに保存済みメッセージが取得できることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：保存済みメッセージが古い順に返る
//! - 異常系：Repository のエラーがそのまま UseCase のエラーになる

use std::sync::Arc;

use crate::domain::{MessageRepository, PostedMessage, RoomId};

use super::error::GetMessageHistoryError;

/// メッセージ履歴取得のユースケース
pub struct GetMessageHistoryUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn MessageRepository>,
}

impl GetMessageHistoryUseCase {
    /// 新しい GetMessageHistoryUseCase を作成
    pub fn new(repository: Arc<dyn MessageRepository>) -> Self {
        Self { repository }
    }

    /// 履歴取得を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PostedMessage>)` - 古い順のメッセージ（送信者プロフィール付き）
    /// * `Err(GetMessageHistoryError)` - 取得失敗
    pub async fn execute(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<PostedMessage>, GetMessageHistoryError> {
        let messages = self.repository.messages_in_room(room_id).await?;
        tracing::debug!("Found {} messages in room {}", messages.len(), room_id);
        Ok(messages)
    }
}
