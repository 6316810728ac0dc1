//! Room membership state and the three registry operations.
//!
//! `RoomRegistry` is owned by exactly one task (see [`super::runner`]). It is
//! a plain struct with `&mut self` methods so the operations can be exercised
//! directly without spawning anything.

use std::{collections::HashMap, sync::Arc};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::{Frame, HubCommand, Subscriber};
use crate::{
    domain::{MessageContent, MessageId, MessageRepository, RepositoryError, RoomId, SessionId, UserId},
    infrastructure::dto::websocket::encode_message,
};

/// Outcome of a delivered broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub message_id: MessageId,
    /// Sessions whose queue accepted the frame
    pub delivered: usize,
    /// Sessions removed because their queue was full or closed
    pub evicted: Vec<SessionId>,
}

/// Reasons a broadcast was dropped before fan-out
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("Failed to store message: {0}")]
    Storage(#[from] RepositoryError),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

struct Member {
    user_id: UserId,
    outbound: mpsc::Sender<Frame>,
}

/// Authoritative room → members mapping.
///
/// Invariant: a room key is present iff its member set is non-empty.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, HashMap<SessionId, Member>>,
    repository: Arc<dyn MessageRepository>,
}

impl RoomRegistry {
    pub fn new(repository: Arc<dyn MessageRepository>) -> Self {
        Self {
            rooms: HashMap::new(),
            repository,
        }
    }

    /// Apply one intake event.
    pub async fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Subscribe(subscriber) => {
                self.subscribe(subscriber);
            }
            HubCommand::Unsubscribe {
                room_id,
                session_id,
            } => {
                self.unsubscribe(room_id, session_id);
            }
            HubCommand::Broadcast {
                room_id,
                sender_id,
                content,
            } => match self.broadcast(room_id, sender_id, content).await {
                Ok(report) => {
                    tracing::debug!(
                        "Broadcast message {} to room {}: delivered={}, evicted={}",
                        report.message_id.value(),
                        room_id,
                        report.delivered,
                        report.evicted.len()
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Dropping message from user {} to room {}: {}",
                        sender_id,
                        room_id,
                        e
                    );
                }
            },
        }
    }

    /// Add a session to its room. Returns `false` if it was already subscribed.
    pub fn subscribe(&mut self, subscriber: Subscriber) -> bool {
        let Subscriber {
            session_id,
            room_id,
            user_id,
            outbound,
        } = subscriber;

        let members = self.rooms.entry(room_id).or_default();
        if members.contains_key(&session_id) {
            tracing::debug!("Session {} already subscribed to room {}", session_id, room_id);
            return false;
        }
        members.insert(session_id, Member { user_id, outbound });
        tracing::info!(
            "Session {} (user {}) subscribed to room {} ({} members)",
            session_id,
            user_id,
            room_id,
            members.len()
        );
        true
    }

    /// Remove a session from its room, closing its outbound queue.
    ///
    /// Returns `false` if the session was not subscribed.
    pub fn unsubscribe(&mut self, room_id: RoomId, session_id: SessionId) -> bool {
        let Some(members) = self.rooms.get_mut(&room_id) else {
            return false;
        };
        // Dropping the member drops the only sender and closes the queue.
        let Some(member) = members.remove(&session_id) else {
            return false;
        };
        tracing::info!(
            "Session {} (user {}) unsubscribed from room {}",
            session_id,
            member.user_id,
            room_id
        );
        if members.is_empty() {
            self.rooms.remove(&room_id);
            tracing::info!("Room {} closed as it has no sessions", room_id);
        }
        true
    }

    /// Store a message, then fan it out to every session in the room.
    ///
    /// Nothing is delivered if storing or encoding fails. Sessions whose
    /// queue cannot take the frame without waiting are evicted.
    pub async fn broadcast(
        &mut self,
        room_id: RoomId,
        sender_id: UserId,
        content: MessageContent,
    ) -> Result<BroadcastReport, BroadcastError> {
        // No timeout: the whole registry waits for storage.
        let posted = self.repository.store(room_id, sender_id, content).await?;
        let frame = Frame::from(encode_message(&posted)?);

        let mut delivered = 0;
        let mut evicted = Vec::new();
        if let Some(members) = self.rooms.get(&room_id) {
            for (session_id, member) in members {
                match member.outbound.try_send(frame.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            "Outbound queue full for session {} (user {}) in room {}. Evicting.",
                            session_id,
                            member.user_id,
                            room_id
                        );
                        evicted.push(*session_id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::warn!(
                            "Outbound queue closed for session {} (user {}) in room {}. Evicting.",
                            session_id,
                            member.user_id,
                            room_id
                        );
                        evicted.push(*session_id);
                    }
                }
            }
        }

        for session_id in &evicted {
            self.unsubscribe(room_id, *session_id);
        }

        Ok(BroadcastReport {
            message_id: posted.message.id,
            delivered,
            evicted,
        })
    }

    /// Number of sessions subscribed to a room
    pub fn member_count(&self, room_id: RoomId) -> usize {
        self.rooms.get(&room_id).map_or(0, HashMap::len)
    }

    /// Whether the room currently has an entry in the membership map
    pub fn has_room(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }

    /// Number of rooms with at least one session
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockMessageRepository, UserProfile},
        infrastructure::{dto::websocket::MessageDto, repository::InMemoryMessageRepository},
    };
    use rendezvous_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - subscribe / unsubscribe の対称性と空 Room の削除
    // - 同一セッションの二重 subscribe で配信が重複しないこと
    // - 全メンバーへのバイト列一致の配信
    // - キュー満杯セッションの追い出し（バックプレッシャー）
    // - 保存失敗時は誰にも配信されないこと
    // ========================================

    const U1: u64 = 1;
    const U2: u64 = 2;

    fn profile(id: u64, first_name: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            avatar_url: String::new(),
            email: format!("{first_name}@example.com"),
        }
    }

    fn create_test_registry() -> RoomRegistry {
        let repository = InMemoryMessageRepository::with_clock(
            vec![profile(U1, "alice"), profile(U2, "bob"), profile(3, "carol")],
            Arc::new(FixedClock::from_millis(1_700_000_000_000)),
        );
        RoomRegistry::new(Arc::new(repository))
    }

    fn room(id: u64) -> RoomId {
        RoomId::new(id).unwrap()
    }

    fn content(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    fn subscriber(room_id: RoomId, user_id: u64, capacity: usize) -> (Subscriber, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity);
        let subscriber = Subscriber {
            session_id: SessionId::generate(),
            room_id,
            user_id: UserId::new(user_id),
            outbound: tx,
        };
        (subscriber, rx)
    }

    fn parse(frame: &Frame) -> MessageDto {
        serde_json::from_str(frame.as_str()).unwrap()
    }

    #[test]
    fn test_subscribe_then_unsubscribe_restores_member_count() {
        // テスト項目: subscribe → unsubscribe で Room のメンバー数が元に戻る
        // given (前提条件):
        let mut registry = create_test_registry();
        let (existing, _rx1) = subscriber(room(5), U1, 4);
        registry.subscribe(existing);
        let (newcomer, _rx2) = subscriber(room(5), U2, 4);
        let newcomer_id = newcomer.session_id;

        // when (操作):
        registry.subscribe(newcomer);
        assert_eq!(registry.member_count(room(5)), 2);
        let removed = registry.unsubscribe(room(5), newcomer_id);

        // then (期待する結果):
        assert!(removed);
        assert_eq!(registry.member_count(room(5)), 1);
    }

    #[test]
    fn test_last_unsubscribe_removes_room_key() {
        // テスト項目: 最後のメンバーが抜けると Room のキー自体が削除される
        // given (前提条件):
        let mut registry = create_test_registry();
        let (only, _rx) = subscriber(room(5), U1, 4);
        let session_id = only.session_id;
        registry.subscribe(only);
        assert!(registry.has_room(room(5)));

        // when (操作):
        registry.unsubscribe(room(5), session_id);

        // then (期待する結果):
        assert!(!registry.has_room(room(5)));
        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_outbound_queue() {
        // テスト項目: unsubscribe でセッションの送信キューが閉じられ、writer が終了できる
        // given (前提条件):
        let mut registry = create_test_registry();
        let (session, mut rx) = subscriber(room(5), U1, 4);
        let session_id = session.session_id;
        registry.subscribe(session);

        // when (操作):
        registry.unsubscribe(room(5), session_id);

        // then (期待する結果):
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_unsubscribe_unknown_session_is_noop() {
        // テスト項目: 未登録・削除済みセッションの unsubscribe はエラーにならず何もしない
        // given (前提条件):
        let mut registry = create_test_registry();
        let (session, _rx) = subscriber(room(5), U1, 4);
        let session_id = session.session_id;
        registry.subscribe(session);
        registry.unsubscribe(room(5), session_id);

        // when (操作):
        let again = registry.unsubscribe(room(5), session_id);
        let unknown_room = registry.unsubscribe(room(9), SessionId::generate());

        // then (期待する結果):
        assert!(!again);
        assert!(!unknown_room);
        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_double_subscribe_delivers_single_copy() {
        // テスト項目: 同じセッションを二重に subscribe しても配信は 1 通だけ
        // given (前提条件):
        let mut registry = create_test_registry();
        let (session, mut rx) = subscriber(room(5), U1, 4);
        assert!(registry.subscribe(session.clone()));

        // when (操作):
        let second = registry.subscribe(session);
        let report = registry.broadcast(room(5), UserId::new(U1), content("once")).await.unwrap();

        // then (期待する結果):
        assert!(!second);
        assert_eq!(registry.member_count(room(5)), 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(parse(&rx.recv().await.unwrap()).content, "once");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_delivers_identical_bytes_to_every_member() {
        // テスト項目: N 人のメンバー全員にバイト列が一致するフレームが 1 通ずつ届く
        // given (前提条件):
        let mut registry = create_test_registry();
        let mut receivers = Vec::new();
        for user in [U1, U2, 3] {
            let (session, rx) = subscriber(room(5), user, 4);
            registry.subscribe(session);
            receivers.push(rx);
        }

        // when (操作):
        let report = registry.broadcast(room(5), UserId::new(U1), content("hi all")).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 3);
        assert!(report.evicted.is_empty());
        let frames: Vec<Frame> = receivers.iter_mut().map(|rx| rx.try_recv().unwrap()).collect();
        assert!(frames.iter().all(|frame| frame.as_str() == frames[0].as_str()));
        assert!(receivers.iter_mut().all(|rx| rx.try_recv().is_err()));
    }

    #[tokio::test]
    async fn test_scenario_b_both_members_receive_same_message() {
        // テスト項目: Room 5 の U1 が "hello" を送ると U1・U2 に同じ id / timestamp で届く
        // given (前提条件):
        let mut registry = create_test_registry();
        let (s1, mut rx1) = subscriber(room(5), U1, 4);
        let (s2, mut rx2) = subscriber(room(5), U2, 4);
        registry.subscribe(s1);
        registry.subscribe(s2);

        // when (操作):
        registry.broadcast(room(5), UserId::new(U1), content("hello")).await.unwrap();

        // then (期待する結果):
        let m1 = parse(&rx1.try_recv().unwrap());
        let m2 = parse(&rx2.try_recv().unwrap());
        assert_eq!(m1.content, "hello");
        assert_eq!(m1.sender.id, U1);
        assert_eq!(m1.id, m2.id);
        assert_eq!(m1.timestamp, m2.timestamp);
        assert_eq!(m1, m2);
    }

    #[tokio::test]
    async fn test_scenario_c_full_queue_is_evicted() {
        // テスト項目: キューが満杯の U2 は追い出され、U1 には届き、以後は U1 にだけ届く
        // given (前提条件):
        let mut registry = create_test_registry();
        let (s1, mut rx1) = subscriber(room(5), U1, 4);
        let (s2, mut rx2) = subscriber(room(5), U2, 1);
        let u2_session = s2.session_id;
        s2.outbound.try_send(Frame::from("backlog")).unwrap();
        registry.subscribe(s1);
        registry.subscribe(s2);

        // when (操作):
        let report = registry.broadcast(room(5), UserId::new(U1), content("hello")).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(report.evicted, vec![u2_session]);
        assert_eq!(registry.member_count(room(5)), 1);
        assert_eq!(parse(&rx1.try_recv().unwrap()).content, "hello");
        // U2 は既存のバックログだけを受け取り、キューは閉じられている
        assert_eq!(rx2.recv().await.unwrap().as_str(), "backlog");
        assert!(rx2.recv().await.is_none());

        // when (操作): 次のブロードキャスト
        let next = registry.broadcast(room(5), UserId::new(U1), content("again")).await.unwrap();

        // then (期待する結果):
        assert_eq!(next.delivered, 1);
        assert!(next.evicted.is_empty());
        assert_eq!(parse(&rx1.try_recv().unwrap()).content, "again");
    }

    #[tokio::test]
    async fn test_closed_queue_is_evicted() {
        // テスト項目: writer が既に終了している（受信側が閉じた）セッションも追い出される
        // given (前提条件):
        let mut registry = create_test_registry();
        let (session, rx) = subscriber(room(5), U1, 4);
        registry.subscribe(session);
        drop(rx);

        // when (操作):
        let report = registry.broadcast(room(5), UserId::new(U1), content("anyone?")).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 0);
        assert_eq!(report.evicted.len(), 1);
        assert!(!registry.has_room(room(5)));
    }

    #[tokio::test]
    async fn test_broadcast_only_reaches_its_room() {
        // テスト項目: 他の Room のメンバーには配信されない
        // given (前提条件):
        let mut registry = create_test_registry();
        let (s1, mut rx1) = subscriber(room(5), U1, 4);
        let (s2, mut rx2) = subscriber(room(6), U2, 4);
        registry.subscribe(s1);
        registry.subscribe(s2);

        // when (操作):
        registry.broadcast(room(5), UserId::new(U1), content("room five")).await.unwrap();

        // then (期待する結果):
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_storage_failure_delivers_nothing_and_keeps_membership() {
        // テスト項目: 保存に失敗したメッセージは誰にも配信されず、メンバー構成も変わらない
        // given (前提条件):
        let mut repository = MockMessageRepository::new();
        repository
            .expect_store()
            .times(1)
            .returning(|_, _, _| Err(RepositoryError::Storage("disk full".to_string())));
        let mut registry = RoomRegistry::new(Arc::new(repository));
        let (s1, mut rx1) = subscriber(room(5), U1, 4);
        let (s2, mut rx2) = subscriber(room(5), U2, 4);
        registry.subscribe(s1);
        registry.subscribe(s2);

        // when (操作):
        let result = registry.broadcast(room(5), UserId::new(U1), content("lost")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(BroadcastError::Storage(_))));
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_err());
        assert_eq!(registry.member_count(room(5)), 2);
    }

    #[tokio::test]
    async fn test_unknown_sender_is_dropped() {
        // テスト項目: ユーザーディレクトリに無い送信者のメッセージは破棄される
        // given (前提条件):
        let mut registry = create_test_registry();
        let (session, mut rx) = subscriber(room(5), 99, 4);
        registry.subscribe(session);

        // when (操作):
        let result = registry.broadcast(room(5), UserId::new(99), content("who am i")).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(BroadcastError::Storage(RepositoryError::UserNotFound(_)))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_handle_applies_commands_in_order() {
        // テスト項目: handle() がコマンドを到着順に適用する
        // given (前提条件):
        let mut registry = create_test_registry();
        let (session, mut rx) = subscriber(room(5), U1, 4);
        let session_id = session.session_id;

        // when (操作):
        registry.handle(HubCommand::Subscribe(session)).await;
        registry
            .handle(HubCommand::Broadcast {
                room_id: room(5),
                sender_id: UserId::new(U1),
                content: content("first"),
            })
            .await;
        registry
            .handle(HubCommand::Unsubscribe {
                room_id: room(5),
                session_id,
            })
            .await;

        // then (期待する結果):
        assert_eq!(parse(&rx.recv().await.unwrap()).content, "first");
        assert!(rx.recv().await.is_none());
        assert!(!registry.has_room(room(5)));
    }
}
