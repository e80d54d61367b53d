//! 複合語の分割を実行するユーティリティ
//!
//! このバイナリは、標準入力から読み込んだ品詞付きコーパスの各文を複合語辞書で
//! 最長一致により分割し、同じ形式で標準出力に出力します。
//! `<doc>`と`</doc>`の行はそのまま出力されます。

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use lexsense::corpus::segment_stream;
use lexsense::CompoundDictionary;

use clap::Parser;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "segment", about = "Merges multi-token compounds in a corpus")]
struct Args {
    /// Compound dictionary with one underscore-joined entry per line.
    #[clap(short = 'i', long)]
    compounds: PathBuf,
}

/// メイン関数
///
/// 複合語辞書を読み込み、標準入力のコーパスを分割して標準出力に書き出します。
/// 処理した文書数と文数、トークン数は標準エラー出力に報告されます。
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    eprintln!("Loading the compound dictionary...");
    let dict = CompoundDictionary::from_reader(File::open(&args.compounds)?)?;
    eprintln!(
        "Loaded {} compounds spanning up to {} tokens",
        dict.num_entries(),
        dict.max_span()
    );

    let out = io::stdout();
    let out = BufWriter::new(out.lock());
    let stats = segment_stream(&dict, io::stdin().lock(), out)?;

    eprintln!(
        "Segmented {} documents, {} sentences: {} tokens -> {} tokens",
        stats.documents, stats.sentences, stats.tokens_in, stats.tokens_out
    );
    Ok(())
}
