//! UseCase: ユーザー一覧取得処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ListUsersUseCase::execute() メソッド
//! - 自分自身の除外と並び順（オンライン優先、名前順）
//!
//! ### なぜこのテストが必要か
//! - 宛先候補に自分が表示されないことを保証
//! - API エラーがそのまま呼び出し側に返ることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数ユーザーの並び替え
//! - 異常系：API エラー
//! - エッジケース：現在のユーザーが不明な場合（除外しない）

use std::sync::Arc;

use crate::domain::{ChatDirectory, DirectoryError, User, UserId};

/// ユーザー一覧取得のユースケース
pub struct ListUsersUseCase {
    directory: Arc<dyn ChatDirectory>,
}

impl ListUsersUseCase {
    /// 新しい ListUsersUseCase を作成
    pub fn new(directory: Arc<dyn ChatDirectory>) -> Self {
        Self { directory }
    }

    /// ユーザー一覧取得を実行
    ///
    /// # Arguments
    ///
    /// * `me` - 一覧から除外する現在のユーザー ID
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<User>)` - オンラインのユーザーが先、同じ状態の中では名前順
    /// * `Err(DirectoryError)` - API 呼び出しの失敗
    pub async fn execute(&self, me: Option<UserId>) -> Result<Vec<User>, DirectoryError> {
        let mut users: Vec<User> = self
            .directory
            .users()
            .await?
            .into_iter()
            .filter(|user| Some(user.id) != me)
            .collect();

        users.sort_by(|a, b| {
            b.is_online
                .cmp(&a.is_online)
                .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        });
        Ok(users)
    }
}
