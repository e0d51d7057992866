//! Line commands typed at the prompt.

use crate::domain::UserId;

use super::cli::parse_user_id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Quit,
    /// Switch the chat partner
    To(UserId),
    Users,
    History,
    Help,
    /// Plain text to send to the current partner
    Say(String),
    /// Input that looks like a command but isn't one
    Invalid(String),
    Empty,
}

impl Command {
    pub(crate) fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };
        match name {
            "quit" | "exit" => Self::Quit,
            "users" => Self::Users,
            "history" => Self::History,
            "help" => Self::Help,
            "to" => match parse_user_id(argument) {
                Ok(id) => Self::To(id),
                Err(e) => Self::Invalid(format!("/to: {e}")),
            },
            other => Self::Invalid(format!("unknown command '/{other}', try /help")),
        }
    }
}

pub(crate) const HELP: &str = "\
Commands:
  /to <id>   switch chat partner
  /users     list users
  /history   reload history with the current partner
  /quit      close the connection and exit
Anything else is sent to the current partner.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        // テスト項目: 各コマンドが解釈される
        // then (期待する結果):
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("  /users "), Command::Users);
        assert_eq!(Command::parse("/history"), Command::History);
        assert_eq!(Command::parse("/to 12"), Command::To(UserId::new(12).unwrap()));
        assert_eq!(Command::parse(""), Command::Empty);
    }

    #[test]
    fn test_parse_plain_text_is_trimmed() {
        // テスト項目: コマンド以外の入力は送信テキストになる
        // then (期待する結果):
        assert_eq!(Command::parse("  hello  "), Command::Say("hello".to_string()));
    }

    #[test]
    fn test_parse_invalid_commands() {
        // テスト項目: 不正な引数や未知のコマンドは Invalid になる
        // then (期待する結果):
        assert!(matches!(Command::parse("/to"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/to -1"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/dance"), Command::Invalid(_)));
    }
}
