//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! ユーザーディレクトリとメッセージ履歴をメモリ上に保持します。
//!
//! ## 技術的負債
//!
//! プロセス再起動でメッセージ履歴は失われます。
//! リレーショナル DB 実装に差し替える場合も trait はそのまま使えます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    MessageContent, MessageId, MessageRepository, PostedMessage, RepositoryError, RoomId,
    StoredMessage, UserId, UserProfile,
};
use rendezvous_shared::time::{Clock, SystemClock};

/// インメモリ Message Repository 実装
pub struct InMemoryMessageRepository {
    /// ユーザーディレクトリ（起動時に読み込み、以後は読み取り専用）
    users: HashMap<UserId, UserProfile>,
    /// 保存済みメッセージ（挿入順 = ID 昇順）
    messages: Mutex<Vec<StoredMessage>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageRepository {
    /// 新しい InMemoryMessageRepository を作成（システム時計を使用）
    pub fn new(users: Vec<UserProfile>) -> Self {
        Self::with_clock(users, Arc::new(SystemClock))
    }

    /// 時計を差し替えて作成（テスト用）
    pub fn with_clock(users: Vec<UserProfile>, clock: Arc<dyn Clock>) -> Self {
        let users = users.into_iter().map(|user| (user.id, user)).collect();
        Self {
            users,
            messages: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// 登録済みユーザー数
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn attach_sender(&self, message: StoredMessage) -> Result<PostedMessage, RepositoryError> {
        let sender = self
            .users
            .get(&message.sender_id)
            .cloned()
            .ok_or(RepositoryError::UserNotFound(message.sender_id))?;
        Ok(PostedMessage { message, sender })
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn store(
        &self,
        room_id: RoomId,
        sender_id: UserId,
        content: MessageContent,
    ) -> Result<PostedMessage, RepositoryError> {
        if !self.users.contains_key(&sender_id) {
            tracing::warn!("Cannot store message: user {} not found", sender_id);
            return Err(RepositoryError::UserNotFound(sender_id));
        }

        let message = {
            let mut messages = self.messages.lock().await;
            let message = StoredMessage {
                id: MessageId::new(messages.len() as u64 + 1),
                room_id,
                sender_id,
                content,
                created_at: self.clock.now(),
            };
            messages.push(message.clone());
            message
        };

        tracing::debug!(
            "Stored message {} in room {} from user {}",
            message.id.value(),
            room_id,
            sender_id
        );
        self.attach_sender(message)
    }

    async fn messages_in_room(&self, room_id: RoomId) -> Result<Vec<PostedMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        messages
            .iter()
            .filter(|message| message.room_id == room_id)
            .cloned()
            .map(|message| self.attach_sender(message))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendezvous_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - store: ID 採番・タイムスタンプ・送信者プロフィールの付与
    // - store: 未知のユーザーはエラー（ブロードキャストは破棄される）
    // - messages_in_room: Room ごとの絞り込みと古い順の並び
    // ========================================

    fn profile(id: u64, first_name: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            avatar_url: format!("https://example.com/{id}.png"),
            email: format!("{first_name}@example.com"),
        }
    }

    fn create_test_repository() -> InMemoryMessageRepository {
        InMemoryMessageRepository::with_clock(
            vec![profile(1, "alice"), profile(2, "bob")],
            Arc::new(FixedClock::from_millis(1_700_000_000_000)),
        )
    }

    fn content(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    fn room(id: u64) -> RoomId {
        RoomId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_store_assigns_id_timestamp_and_sender() {
        // テスト項目: 保存したメッセージに ID・時刻・送信者プロフィールが付与される
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let first = repo.store(room(5), UserId::new(1), content("hi")).await.unwrap();
        let second = repo.store(room(5), UserId::new(2), content("yo")).await.unwrap();

        // then (期待する結果):
        assert_eq!(first.message.id, MessageId::new(1));
        assert_eq!(second.message.id, MessageId::new(2));
        assert_eq!(first.message.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(first.sender.first_name, "alice");
        assert_eq!(second.sender.id, UserId::new(2));
    }

    #[tokio::test]
    async fn test_store_unknown_user_fails_without_side_effects() {
        // テスト項目: 未登録ユーザーからのメッセージは保存されない
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let result = repo.store(room(5), UserId::new(99), content("hi")).await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::UserNotFound(UserId::new(99))));
        assert!(repo.messages_in_room(room(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_messages_in_room_filters_by_room_in_order() {
        // テスト項目: 履歴は指定 Room のメッセージだけを古い順に返す
        // given (前提条件):
        let repo = create_test_repository();
        repo.store(room(5), UserId::new(1), content("one")).await.unwrap();
        repo.store(room(6), UserId::new(2), content("other room")).await.unwrap();
        repo.store(room(5), UserId::new(2), content("two")).await.unwrap();

        // when (操作):
        let history = repo.messages_in_room(room(5)).await.unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = history.iter().map(|p| p.message.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two"]);
        assert!(repo.messages_in_room(room(7)).await.unwrap().is_empty());
    }
}
