//! UseCase 層
//!
//! クライアントのアプリケーションロジックを実装するレイヤー。
//! UI 層から呼び出され、チャネルと Directory（HTTP API）を操作します。

pub mod error;
pub mod list_users;
pub mod load_history;
pub mod send_chat_message;

pub use error::SendMessageError;
pub use list_users::ListUsersUseCase;
pub use load_history::LoadHistoryUseCase;
pub use send_chat_message::SendChatMessageUseCase;
