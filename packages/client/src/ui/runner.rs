//! Client run loop.

use std::{sync::Arc, thread};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{broadcast, mpsc};

use crate::{
    channel::{AuthMode, ChannelManager, Notification},
    domain::{ChatDirectory, CredentialSource, Delivery, UserId},
    infrastructure::{
        api::ApiClient,
        credential::{CookieFile, CookieString},
        transport::WebSocketConnector,
    },
    usecase::{ListUsersUseCase, LoadHistoryUseCase, SendChatMessageUseCase},
};

use super::{
    cli::{Args, AuthArg},
    command::{Command, HELP},
    error::RunError,
    render,
};

const PROMPT: &str = "> ";

/// Run the terminal client until `/quit` or end of input.
pub async fn run_client(args: Args) -> Result<(), RunError> {
    let credentials = credential_source(&args);
    let directory: Arc<dyn ChatDirectory> =
        Arc::new(ApiClient::new(&args.origin, credentials.clone()));

    // 1. Resolve the current user (best effort)
    let me_result = directory.me().await;
    let me = match &me_result {
        Ok(user) => {
            println!("Signed in as {} (#{})", user.name(), user.id);
            Some(user.clone())
        }
        Err(e) => {
            tracing::warn!("Could not resolve the current user: {}", e);
            None
        }
    };
    let me_id = me.as_ref().map(|user| user.id);

    // 2. Build the channel
    let auth = match args.auth {
        AuthArg::Handshake => AuthMode::Handshake,
        AuthArg::Path => match (args.user_id, me_result) {
            (Some(id), _) => AuthMode::UserPath(id),
            (None, Ok(user)) => AuthMode::UserPath(user.id),
            (None, Err(e)) => return Err(RunError::UserIdUnknown(e)),
        },
    };
    let config = args.channel_config().with_auth(auth);
    let channel = ChannelManager::new(config, Arc::new(WebSocketConnector::new()), credentials)?;
    tracing::info!(endpoint = channel.endpoint(), "Channel configured");

    channel.on_envelope(move |delivery: Delivery| {
        if let Some(line) = render::delivery_line(&delivery, me_id) {
            println!("{line}");
        }
    });
    tokio::spawn(print_notifications(channel.subscribe()));

    // 3. Show users and history, then connect
    let users = ListUsersUseCase::new(directory.clone());
    let history = LoadHistoryUseCase::new(directory);
    print_users(&users, me_id).await;
    let mut target = args.to;
    if let Some(peer) = target {
        print_history(&history, peer, me_id).await;
    }

    channel.connect()?;

    // 4. Read lines until /quit
    let sender = SendChatMessageUseCase::new(channel.clone());
    let mut lines = spawn_line_reader();
    println!("Type /help for commands.");
    while let Some(line) = lines.recv().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                channel.close();
                return Err(e.into());
            }
        };
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Empty => {}
            Command::Help => println!("{HELP}"),
            Command::Invalid(reason) => println!("! {reason}"),
            Command::Users => print_users(&users, me_id).await,
            Command::History => match target {
                Some(peer) => print_history(&history, peer, me_id).await,
                None => println!("! no chat partner, use /to <id>"),
            },
            Command::To(peer) => {
                target = Some(peer);
                println!("* now chatting with #{peer}");
                print_history(&history, peer, me_id).await;
            }
            Command::Say(text) => {
                let Some(peer) = target else {
                    println!("! no chat partner, use /to <id>");
                    continue;
                };
                match sender.execute(peer, &text, me.as_ref()) {
                    Ok(echo) => println!("{}", render::message_line(&echo, me_id)),
                    Err(e) => println!("! not sent: {e}"),
                }
            }
        }
    }

    channel.close();
    println!("Bye.");
    Ok(())
}

fn credential_source(args: &Args) -> Arc<dyn CredentialSource> {
    match (&args.cookie_file, &args.cookie) {
        (Some(path), _) => {
            tracing::debug!(path = %path.display(), "Reading credentials from cookie file");
            Arc::new(CookieFile::new(path.clone()))
        }
        (None, Some(cookie)) => Arc::new(CookieString::new(cookie.clone())),
        (None, None) => {
            tracing::warn!("No --cookie or --cookie-file given");
            Arc::new(CookieString::new(""))
        }
    }
}

async fn print_notifications(mut rx: broadcast::Receiver<Notification>) {
    loop {
        match rx.recv().await {
            Ok(notification) => {
                if let Some(line) = render::notification_line(&notification) {
                    println!("{line}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Notification printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn print_users(usecase: &ListUsersUseCase, me: Option<UserId>) {
    match usecase.execute(me).await {
        Ok(users) if users.is_empty() => println!("No other users."),
        Ok(users) => {
            println!("Users:");
            users.iter().map(render::user_line).for_each(|line| println!("{line}"));
        }
        Err(e) => println!("! could not load users: {e}"),
    }
}

async fn print_history(usecase: &LoadHistoryUseCase, peer: UserId, me: Option<UserId>) {
    match usecase.execute(peer).await {
        Ok(entries) => {
            println!("--- history with #{peer} ({} messages) ---", entries.len());
            for entry in &entries {
                println!("{}", render::history_line(entry, me));
            }
        }
        Err(e) => println!("! could not load history: {e}"),
    }
}

/// Read lines on a dedicated thread; the receiver closes at end of input.
fn spawn_line_reader() -> mpsc::UnboundedReceiver<Result<String, ReadlineError>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };
        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    if tx.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });
    rx
}
