//! Repository trait 定義
//!
//! チャットコアが必要とする永続化境界のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{MessageContent, PostedMessage, RepositoryError, RoomId, UserId};

/// Message Repository trait
///
/// Room Registry はブロードキャストのたびに `store` を await し、
/// 保存に成功したメッセージだけを配信する（persist-before-broadcast）。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを保存し、送信者のプロフィール付きで返す
    async fn store(
        &self,
        room_id: RoomId,
        sender_id: UserId,
        content: MessageContent,
    ) -> Result<PostedMessage, RepositoryError>;

    /// Room のメッセージ履歴を古い順に取得
    async fn messages_in_room(&self, room_id: RoomId) -> Result<Vec<PostedMessage>, RepositoryError>;
}
