//! テスト用ユーティリティ
//!
//! テストコードで使用する小さなモデルを提供します。

use crate::embedding::{Embeddings, Matrix};
use crate::model::Model;
use crate::vocabulary::Vocabulary;

/// 3単語・6語義・6レンマの語彙
///
/// 語義行: `bank`=0, `money`=1, `river`=2, `bank.n.01`=3, `bank.n.02`=4, `bank.v.01`=5
pub(crate) const TEST_VOCAB: &str = "\
6 6 3
120 12 3
bank|*|* 0 1 0 40 0 -1
bank|n|bank.n.01 1 0.75 0 40 3 -1
bank|n|bank.n.02 2 0.25 0 40 4 -1
bank|v|bank.v.01 3 1 0 40 5 -1
money|*|* 4 1 1 30 1 -1
river|*|* 5 1 2 20 2 -1
";

/// [`TEST_VOCAB`]に2次元の埋め込みを与えたモデルを構築します。
///
/// `river`と`bank.n.01`は`[1, 0]`、`money`と`bank.n.02`は`[0, 1]`です。
/// 語義選択層は局所文脈のベクトルだけを見るように設定されています。
pub(crate) fn build_test_model() -> Model {
    let vocab = Vocabulary::from_reader(TEST_VOCAB.as_bytes()).unwrap();

    let mut sense_in = Matrix::zeros(6, 2);
    for (row, v) in [
        (0, [0.5f32, 0.5]),
        (1, [0.0, 1.0]),
        (2, [1.0, 0.0]),
        (3, [1.0, 0.0]),
        (4, [0.0, 1.0]),
        (5, [0.6, 0.8]),
    ] {
        sense_in.row_mut(row).copy_from_slice(&v);
    }
    let sense_out = sense_in.clone();

    let mut selection_weight = Matrix::zeros(6, 6);
    selection_weight
        .row_mut(1)
        .copy_from_slice(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    selection_weight
        .row_mut(2)
        .copy_from_slice(&[0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    let selection_bias = Matrix::zeros(6, 1);

    let embeddings = Embeddings::new(sense_in, sense_out, selection_weight, selection_bias).unwrap();
    Model::new(vocab, embeddings).unwrap()
}
