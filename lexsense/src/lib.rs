//! # lexsense
//!
//! lexsenseは、語義単位の埋め込みと文脈による語義選択の実装です。
//!
//! ## 概要
//!
//! 単語・レンマ・語義の3つの名前空間を持つ語彙と、語義ごとの密ベクトル、
//! 学習済みの語義選択層を読み込み、文脈から対象語の候補語義上の確率分布を計算します。
//! 読み込んだモデルはrkyv形式で保存でき、次回からはゼロコピーに近い形で高速に
//! 読み込めます。
//!
//! ## 主な機能
//!
//! - **語彙と埋め込みの索引**: 語彙ファイルとword2vec互換の交換ファイルの読み込み
//! - **語義スコアリング**: 局所・文・文書の3つの文脈窓による語義確率の計算
//! - **複合語の分割**: ダブル配列トライを用いた最長一致による複合語のまとめ上げ
//! - **定義文グラフの重み付け**: 関係グラフに沿って展開した定義文による語義の特徴語の抽出
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lexsense::embedding::ExchangeFormat;
//! use lexsense::{ModelLoader, Pos, Scorer};
//!
//! let vocab = "4 4 2
//! 100 10 2
//! bank|*|* 0 1 0 0 0 -1
//! bank|n|bank.n.01 1 0.5 0 0 2 -1
//! bank|n|bank.n.02 2 0.5 0 0 3 -1
//! river|*|* 3 1 1 0 1 -1";
//! let sense_in = "2 2\nriver 1 0\nbank.n.01 1 0\n";
//! let sense_out = "0 2\n";
//! let selection_weight = "1 6\nbank|n|bank.n.01 2 0 0 0 0 0\n";
//! let selection_bias = "0 1\n";
//!
//! let mut loader = ModelLoader::from_readers().format(ExchangeFormat::Text);
//! loader.load_vocabulary_from_reader(vocab.as_bytes())?;
//! loader.load_weights_from_readers(
//!     sense_in.as_bytes(),
//!     sense_out.as_bytes(),
//!     selection_weight.as_bytes(),
//!     selection_bias.as_bytes(),
//! )?;
//! let scorer = Scorer::new(loader.finish()?);
//! let mut worker = scorer.new_worker();
//!
//! let sentence = ["the", "river", "bank"];
//! let document = [sentence];
//! let dist = worker.score_senses("bank", Pos::Noun, &["river"], &sentence, &document, false)?;
//! assert_eq!(&["bank.n.01".to_string(), "bank.n.02".to_string()], dist.senses());
//! assert_eq!("bank.n.01", dist.best().unwrap().0);
//!
//! let dist = worker.score_senses("river", Pos::Noun, &["bank"], &sentence, &document, false)?;
//! assert_eq!(&[1.0], dist.probabilities());
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 分割済みコーパスの読み書き
pub mod corpus;

/// 埋め込み行列と交換形式
pub mod embedding;

/// エラー型の定義
pub mod errors;

/// 定義文グラフによる特徴語の重み付け
pub mod gloss;

/// 語彙と埋め込みをまとめたモデル
pub mod model;

/// 語義スコアラーの実装
pub mod scorer;

/// 複合語の分割
pub mod segmenter;

/// 内部ユーティリティ関数
pub mod utils;

/// 語彙と名前空間
pub mod vocabulary;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

// Re-exports
pub use corpus::{Corpus, Document, TaggedToken};
pub use model::{loader::ModelLoader, Model};
pub use scorer::{
    Annotation, ContextualSimilarity, Scorer, SenseDistribution, WordInContext, Worker,
};
pub use segmenter::CompoundDictionary;
pub use vocabulary::{LemmaKey, Pos, Vocabulary};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
