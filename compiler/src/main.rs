//! lexsense モデルコンパイラのメインエントリーポイント
//!
//! 学習済みのモデルディレクトリをコンパイル済みのモデルファイルに変換するサブコマンドと、
//! コンパイル済みモデルを確認するためのサブコマンドを提供します。

mod build;
mod nearest;

use clap::Parser;
use thiserror::Error;

use crate::{build::BuildError, nearest::NearestError};

/// コマンドライン引数の構造体
#[derive(Parser, Debug)]
#[clap(name = "compile", version)]
struct Cli {
    /// 実行するサブコマンド
    #[clap(subcommand)]
    command: Command,
}

/// 利用可能なサブコマンド
#[derive(Parser, Debug)]
enum Command {
    /// モデルディレクトリからコンパイル済みのモデルを構築します
    ///
    /// 語彙ファイルと交換ファイルを読み込み、zstd圧縮したrkyv形式で出力します。
    Build(build::Args),

    /// コンパイル済みのモデルで近傍語義を検索します
    Nearest(nearest::Args),
}

/// コンパイラの実行中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum CompileError {
    /// モデル構築中のエラー
    #[error(transparent)]
    BuildError(#[from] BuildError),
    /// 近傍検索中のエラー
    #[error(transparent)]
    NearestError(#[from] NearestError),
}

fn main() -> Result<(), CompileError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => Ok(build::run(args)?),
        Command::Nearest(args) => Ok(nearest::run(args)?),
    }
}
