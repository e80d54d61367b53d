//! モデルのコンパイルモジュール
//!
//! 学習済みのモデルディレクトリ（`vocab.txt`と4つの交換ファイル）を読み込み、
//! zstd圧縮したrkyv形式のモデルファイルとして書き出します。

use std::fs::File;
use std::io;
use std::path::PathBuf;

use lexsense::embedding::ExchangeFormat;
use lexsense::errors::LexsenseError;
use lexsense::ModelLoader;

use clap::Parser;

/// ビルドコマンドの引数
#[derive(Parser, Debug)]
#[clap(
    name = "build",
    about = "A program to compile a trained model directory."
)]
pub struct Args {
    /// Model directory containing vocab.txt and the four exchange files.
    #[clap(short = 'i', long)]
    model_dir: PathBuf,

    /// File to which the compiled model is output (in zstd).
    #[clap(short = 'o', long)]
    model_out: PathBuf,

    /// Reads the exchange files in the whitespace-separated text format
    /// instead of the word2vec binary format.
    #[clap(long)]
    text: bool,

    /// Compression level of zstd.
    #[clap(long, default_value = "19")]
    level: i32,
}

/// ビルド処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// モデル読み込みエラー
    #[error("Model loading failed: {0}")]
    Lexsense(#[from] LexsenseError),
}

/// ビルドコマンドを実行する
///
/// # エラー
///
/// モデルの読み込みやファイルの書き込みに失敗した場合、`BuildError`を返します。
pub fn run(args: Args) -> Result<(), BuildError> {
    let format = if args.text {
        ExchangeFormat::Text
    } else {
        ExchangeFormat::Binary
    };

    println!("Loading the vocabulary...");
    let mut loader = ModelLoader::new(&args.model_dir)?.format(format);
    loader.load_vocabulary()?;

    println!("Loading the weights...");
    loader.load_weights()?;
    let model = loader.finish()?;

    println!("Writing the model...");
    let file = File::create(&args.model_out)?;
    let mut encoder = zstd::Encoder::new(file, args.level)?;
    model.write(&mut encoder)?;
    encoder.finish()?;

    println!(
        "Successfully compiled {} lemmas to {}",
        model.vocabulary().num_lemmas(),
        args.model_out.display()
    );
    Ok(())
}
