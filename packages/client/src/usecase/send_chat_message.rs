//! UseCase: チャットメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendChatMessageUseCase::execute() メソッド
//! - 入力の検証、チャネルへの書き込み、ローカル表示用エコーの生成
//!
//! ### なぜこのテストが必要か
//! - 空白のみ・長すぎる入力がチャネルに書き込まれないことを保証
//! - Open でないチャネルへの送信がエラーとして呼び出し側に返ることを確認
//! - 送信確認の前に表示するエコーが送信内容と一致することを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：Open のチャネルへ送信し、エコーが返る
//! - 異常系：空の入力、未接続のチャネル
//! - エッジケース：現在のユーザーが不明な場合のエコー

use crate::{
    channel::ChannelManager,
    domain::{ChatMessage, MessageContent, OutgoingMessage, User, UserId},
};

use super::error::SendMessageError;

/// チャットメッセージ送信のユースケース
pub struct SendChatMessageUseCase {
    channel: ChannelManager,
}

impl SendChatMessageUseCase {
    /// 新しい SendChatMessageUseCase を作成
    pub fn new(channel: ChannelManager) -> Self {
        Self { channel }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `to` - 宛先ユーザー ID
    /// * `raw` - 入力されたままのメッセージ（前後の空白は除去される）
    /// * `me` - 現在のユーザー（不明な場合は None）
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 送信確認前にローカル表示するエコー
    /// * `Err(SendMessageError)` - 入力が不正、またはチャネルが Open でない
    pub fn execute(
        &self,
        to: UserId,
        raw: &str,
        me: Option<&User>,
    ) -> Result<ChatMessage, SendMessageError> {
        // 1. 入力を MessageContent に変換（検証）
        let content = MessageContent::new(raw)?;

        // 2. チャネルに書き込む（送信確認は待たない）
        let message = OutgoingMessage::text(to, content);
        self.channel.send(&message)?;

        // 3. ローカル表示用のエコーを作成
        Ok(ChatMessage {
            id: None,
            from_user_id: me.map(|user| user.id.value()).unwrap_or_default(),
            from_username: me.map(|user| user.username.clone()),
            from_display_name: me.and_then(|user| user.display_name.clone()),
            content: message.content.into_string(),
            timestamp: devnet_shared::time::now_rfc3339(),
        })
    }
}
