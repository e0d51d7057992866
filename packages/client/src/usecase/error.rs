//! UseCase 層のエラー定義

use thiserror::Error;

use crate::{channel::ChannelError, domain::ValueObjectError};

/// メッセージ送信時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// 入力がメッセージとして不正（空、長すぎる）
    #[error("invalid message: {0}")]
    InvalidContent(#[from] ValueObjectError),

    /// チャネルが送信できない状態
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
