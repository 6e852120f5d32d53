use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "detection-history")]
#[command(about = "物体検出結果の履歴・プレビュー管理ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 履歴を新しい順に表示
    List,

    /// 1件の詳細を表示
    Show {
        /// レコードID
        id: u64,
    },

    /// 保存済みの検出レスポンスを履歴に追加
    Add {
        /// 検出サービスのレスポンスJSON
        #[arg(required = true)]
        response: PathBuf,

        /// 検出に使った入力画像
        #[arg(short, long)]
        image: PathBuf,
    },

    /// 1件削除
    Delete {
        /// レコードID
        id: u64,

        /// 確認を省略
        #[arg(short, long)]
        yes: bool,
    },

    /// 履歴を全消去
    Clear {
        /// 確認を省略
        #[arg(short, long)]
        yes: bool,
    },

    /// 検出結果をJSON/CSVで書き出す
    Export {
        /// レコードID
        id: u64,

        /// 出力形式 (json/csv)
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// 出力ファイル（デフォルト: 標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 対話セッション（プレビューとUndoはセッション中のみ有効）
    Session,

    /// 設定の表示・変更
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 履歴の保存先ディレクトリ
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// 履歴の保存キー
        #[arg(long)]
        storage_key: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}
