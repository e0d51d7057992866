//! UseCase: メッセージ履歴取得処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LoadHistoryUseCase::execute() メソッド
//! - 履歴が古い順に並ぶこと
//!
//! ### なぜこのテストが必要か
//! - バックエンドが新しい順で返しても古い順に表示されることを保証
//! - 時刻のないエントリが直前のエントリの位置に留まることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新しい順・オフセットなしの時刻を含む履歴
//! - 異常系：API エラー
//! - エッジケース：時刻が欠けている / 解釈できないエントリ

use std::sync::Arc;

use chrono::{DateTime, Utc};
use devnet_shared::time::parse_iso8601;

use crate::domain::{ChatDirectory, DirectoryError, HistoryEntry, UserId};

/// メッセージ履歴取得のユースケース
pub struct LoadHistoryUseCase {
    directory: Arc<dyn ChatDirectory>,
}

impl LoadHistoryUseCase {
    /// 新しい LoadHistoryUseCase を作成
    pub fn new(directory: Arc<dyn ChatDirectory>) -> Self {
        Self { directory }
    }

    /// 履歴取得を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<HistoryEntry>)` - 古い順の履歴
    /// * `Err(DirectoryError)` - API 呼び出しの失敗
    pub async fn execute(&self, peer: UserId) -> Result<Vec<HistoryEntry>, DirectoryError> {
        let entries = self.directory.history(peer).await?;
        tracing::debug!(peer = peer.value(), count = entries.len(), "History loaded");
        Ok(oldest_first(entries))
    }
}

/// 時刻のないエントリは直前のエントリの時刻を引き継ぐ（安定ソート）
fn oldest_first(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut last: Option<DateTime<Utc>> = None;
    let mut keyed: Vec<(Option<DateTime<Utc>>, HistoryEntry)> = entries
        .into_iter()
        .map(|entry| {
            if let Some(at) = entry.sent_at.as_deref().and_then(parse_iso8601) {
                last = Some(at);
            }
            (last, entry)
        })
        .collect();
    keyed.sort_by_key(|(at, _)| *at);
    keyed.into_iter().map(|(_, entry)| entry).collect()
}
