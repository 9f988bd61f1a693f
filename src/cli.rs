use clap::{Parser, Subcommand};
use std::path::PathBuf;
use substation_intake_common::Category;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "変電所点検写真・試験成績書の取り込みツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ファイル名を検証・解析（ファイルの中身は読まない）
    Check {
        /// 検証するファイル名
        #[arg(required = true)]
        names: Vec<String>,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// ファイル/フォルダを取り込む
    Upload {
        /// ファイルまたはフォルダのパス
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 命名規則に無いファイルも Uncategorized として受け付ける
        #[arg(long)]
        allow_uncategorized: bool,
    },

    /// 取り込み済みファイルの一覧
    List {
        /// カテゴリで絞り込み（例: "Visual Defect", test-sheet）
        #[arg(short, long)]
        category: Option<Category>,

        /// ファイル名・item type・location等の部分一致
        #[arg(short, long)]
        search: Option<String>,

        /// カテゴリ別にグループ表示
        #[arg(short, long)]
        grouped: bool,
    },

    /// 取り込み済みファイルを削除
    Delete {
        /// レコードID
        #[arg(long, conflicts_with = "category", required_unless_present = "category")]
        id: Option<String>,

        /// カテゴリ内を全削除
        #[arg(long)]
        category: Option<Category>,
    },

    /// 命名規則テーブルを表示
    Taxonomy {
        /// カテゴリで絞り込み
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// 設定を表示/編集
    Config {
        /// 所有者IDを設定（サインイン）
        #[arg(long)]
        set_owner: Option<String>,

        /// 所有者IDを削除（サインアウト）
        #[arg(long)]
        clear_owner: bool,

        /// 保存先ディレクトリを設定
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// カスタム命名規則JSONを設定
        #[arg(long)]
        taxonomy: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
