//! 対話セッション
//!
//! 標準入力のコマンドとUndo期限タイマーを1つのループで処理する。
//! プレビューとUndoはこのセッションの間だけ有効。

use crate::config::Config;
use crate::error::Result;
use crate::render;
use crate::response;
use detection_history_common::{DetectionHistory, UndoKind, UndoTicket};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc::UnboundedReceiver;

/// セッションコマンド
#[derive(Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Add { response: PathBuf, image: PathBuf },
    List,
    Show(u64),
    Delete(u64),
    Clear,
    Undo,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

const HELP: &str = "操作: add <response.json> <image> | list | show <id> | delete <id> | clear | undo | help | quit";

/// 1行をコマンドに変換
pub fn parse_command(line: &str) -> SessionCommand {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return SessionCommand::Empty;
    };
    let args: Vec<&str> = parts.collect();

    match (head, args.as_slice()) {
        ("add", [resp, img]) => SessionCommand::Add {
            response: PathBuf::from(resp),
            image: PathBuf::from(img),
        },
        ("list" | "ls", []) => SessionCommand::List,
        ("show", [id]) => parse_id(id).map_or_else(SessionCommand::Invalid, SessionCommand::Show),
        ("delete" | "rm", [id]) => parse_id(id).map_or_else(SessionCommand::Invalid, SessionCommand::Delete),
        ("clear", []) => SessionCommand::Clear,
        ("undo" | "u", []) => SessionCommand::Undo,
        ("help" | "?", []) => SessionCommand::Help,
        ("quit" | "exit" | "q", []) => SessionCommand::Quit,
        _ => SessionCommand::Invalid(format!("不明なコマンド: {}", line.trim())),
    }
}

fn parse_id(raw: &str) -> std::result::Result<u64, String> {
    raw.parse().map_err(|_| format!("IDが不正です: {}", raw))
}

/// セッションを実行
pub async fn run_session(
    mut history: DetectionHistory,
    mut expiries: UnboundedReceiver<UndoTicket>,
    config: &Config,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("🗂 detection-history - 対話セッション");
    println!("{}\n", HELP);
    print_list(&history);

    loop {
        prompt("> ")?;

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };

                match parse_command(&line) {
                    SessionCommand::Quit => break,
                    SessionCommand::Delete(id) => {
                        if history.record(id).is_none() {
                            println!("履歴にありません: {}", id);
                        } else if confirm(&mut lines, "この検出を削除しますか？").await? {
                            history.delete_detection(id);
                            print_undo_hint(&history);
                        }
                    }
                    SessionCommand::Clear => {
                        if history.history().is_empty() {
                            println!("履歴は空です");
                        } else if confirm(&mut lines, "履歴をすべて削除しますか？").await? {
                            history.clear_history();
                            print_undo_hint(&history);
                        }
                    }
                    command => execute(&mut history, command, config),
                }
            }
            Some(ticket) = expiries.recv() => {
                if history.expire_undo(ticket) {
                    println!("\n(Undoの期限が切れました)");
                }
            }
        }
    }

    history.close();
    Ok(())
}

fn execute(history: &mut DetectionHistory, command: SessionCommand, config: &Config) {
    match command {
        SessionCommand::Add { response: response_path, image } => {
            match response::import_detection(history, &response_path, &image, &config.date_format) {
                Ok(imported) => {
                    let id = imported.record.id;
                    history.add_detection(imported.record, imported.input_preview, imported.output_preview);
                    println!("✔ 追加しました: {}", id);
                }
                Err(e) => println!("検出結果を取り込めません: {}", e),
            }
        }
        SessionCommand::List => print_list(history),
        SessionCommand::Show(id) => match history.record(id) {
            Some(record) => {
                for line in render::detail_lines(record, history.preview(id)) {
                    println!("{}", line);
                }
            }
            None => println!("履歴にありません: {}", id),
        },
        SessionCommand::Undo => match history.undo() {
            Some(UndoKind::Delete) => println!("✔ 削除を取り消しました"),
            Some(UndoKind::Clear) => println!("✔ 全消去を取り消しました"),
            None => println!("取り消せる操作はありません"),
        },
        SessionCommand::Help => println!("{}", HELP),
        SessionCommand::Invalid(message) => println!("{}", message),
        SessionCommand::Empty
        | SessionCommand::Quit
        | SessionCommand::Delete(_)
        | SessionCommand::Clear => {}
    }
}

fn print_list(history: &DetectionHistory) {
    if history.history().is_empty() {
        println!("検出履歴はまだありません");
        return;
    }
    for (i, record) in history.history().iter().enumerate() {
        println!("{}", render::summary_line(i, record, history.preview(record.id)));
    }
}

fn print_undo_hint(history: &DetectionHistory) {
    if let Some(remaining) = history.undo_remaining() {
        println!(
            "履歴を更新しました。`undo` で元に戻せます（残り{}秒）",
            remaining.as_secs()
        );
    }
}

fn prompt(text: &str) -> Result<()> {
    print!("{}", text);
    std::io::stdout().flush()?;
    Ok(())
}

async fn confirm(lines: &mut Lines<BufReader<Stdin>>, question: &str) -> Result<bool> {
    prompt(&format!("{} [y/N] ", question))?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
