use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionHistoryError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("履歴にありません: {0}")]
    RecordNotFound(u64),

    #[error("検出レスポンスのパースに失敗: {0}")]
    ResponseParse(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力エラー: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Common(#[from] detection_history_common::Error),
}

pub type Result<T> = std::result::Result<T, DetectionHistoryError>;
