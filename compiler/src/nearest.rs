//! 近傍語義の検索モジュール
//!
//! コンパイル済みのモデルを読み込み、標準入力から1行ずつ読んだ語義名または単語の
//! 近傍語義をコサイン類似度の高い順に出力します。

use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use lexsense::errors::LexsenseError;
use lexsense::Model;

use clap::Parser;

/// 近傍検索コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "nearest", about = "Prints the nearest senses of each input line.")]
pub struct Args {
    /// Compiled model (in zstd).
    #[clap(short = 'i', long)]
    model: PathBuf,

    /// Number of senses to print for each query.
    #[clap(short = 'k', long, default_value = "10")]
    k: usize,
}

/// 近傍検索中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum NearestError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// モデル読み込みエラー
    #[error("Model loading failed: {0}")]
    Lexsense(#[from] LexsenseError),
}

/// 近傍検索コマンドを実行する
///
/// 語彙にない問い合わせは標準エラー出力に報告して読み飛ばします。
pub fn run(args: Args) -> Result<(), NearestError> {
    eprintln!("Loading the model...");
    let model = Model::from_zstd(&args.model)?;
    eprintln!("Ready to search");

    let out = io::stdout();
    let mut out = BufWriter::new(out.lock());
    for line in io::stdin().lock().lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        match model.nearest_senses(query, args.k) {
            Ok(neighbors) => {
                for (name, similarity) in neighbors {
                    writeln!(&mut out, "{query}\t{name}\t{similarity:.6}")?;
                }
                writeln!(&mut out)?;
                out.flush()?;
            }
            Err(e) if e.is_missing_key() => eprintln!("Skipped: {e}"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
