//! 文脈に基づく語義確率の計算
//!
//! # 主要な構造体
//!
//! - [`Scorer`]: 読み込み済みモデルを共有する語義スコアラー
//! - [`Worker`]: スコアラーのワーカー。計算用のバッファを保持し、再利用する
//! - [`WordInContext`]: 文脈付きの対象語。文脈を考慮した類似度の計算に使う
//!
//! # 例
//!
//! ```no_run
//! use lexsense::{Model, Pos, Scorer};
//!
//! let model = Model::from_dir("path/to/model")?;
//! let scorer = Scorer::new(model);
//! let mut worker = scorer.new_worker();
//!
//! let local = ["river", "water"];
//! let sentence = ["the", "river", "bank", "was", "muddy"];
//! let document = [sentence];
//! let dist = worker.score_senses("bank", Pos::Noun, &local, &sentence, &document, false)?;
//! for (sense, prob) in dist.iter() {
//!     println!("{sense}\t{prob:.4}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod worker;

use std::sync::Arc;

use crate::errors::Result;
use crate::model::Model;
use crate::vocabulary::Pos;

pub use crate::scorer::worker::{Annotation, ContextualSimilarity, WordInContext, Worker};

/// 語義スコアラー。
///
/// モデルは`Arc`で共有され、スコアリングによって変更されることはありません。
/// スレッドごとに[`Worker`]を生成して並列に使用できます。
#[derive(Clone)]
pub struct Scorer {
    model: Arc<Model>,
}

impl Scorer {
    /// 新しいスコアラーを作成します。
    pub fn new(model: Model) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    /// 共有されたモデルから新しいスコアラーを作成します。
    pub fn from_shared_model(model: Arc<Model>) -> Self {
        Self { model }
    }

    /// モデルへの参照を返します。
    #[inline(always)]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// 新しいワーカーを作成します。
    pub fn new_worker(&self) -> Worker {
        Worker::new(self.clone())
    }

    /// 一時的なワーカーを使って語義確率を計算します。
    ///
    /// 繰り返し呼び出す場合は[`Scorer::new_worker`]でワーカーを作成して
    /// 再利用してください。引数とエラーは[`Worker::score_senses`]と同じです。
    pub fn score_senses<S, D>(
        &self,
        word: &str,
        pos: Pos,
        local: &[S],
        sentence: &[S],
        document: &[D],
        use_prior: bool,
    ) -> Result<SenseDistribution>
    where
        S: AsRef<str>,
        D: AsRef<[S]>,
    {
        self.new_worker()
            .score_senses(word, pos, local, sentence, document, use_prior)
    }
}

/// 候補語義上の確率分布
#[derive(Clone, Debug, PartialEq)]
pub struct SenseDistribution {
    probabilities: Vec<f64>,
    senses: Vec<String>,
}

impl SenseDistribution {
    pub(crate) fn new(probabilities: Vec<f64>, senses: Vec<String>) -> Self {
        debug_assert_eq!(probabilities.len(), senses.len());
        Self {
            probabilities,
            senses,
        }
    }

    /// 単語自身を唯一の語義とする自明な分布を作成します。
    pub(crate) fn trivial(word: &str) -> Self {
        Self::new(vec![1.0], vec![word.to_string()])
    }

    /// 確率を語彙の品詞別グループの順で返します。
    #[inline(always)]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// 確率と同じ順序の語義名を返します。
    #[inline(always)]
    pub fn senses(&self) -> &[String] {
        &self.senses
    }

    /// 候補の数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.senses.len()
    }

    /// 候補が空かどうかを返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }

    /// (語義名, 確率) の組を返すイテレータ
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.senses
            .iter()
            .map(String::as_str)
            .zip(self.probabilities.iter().copied())
    }

    /// 確率が最大の語義を返します。同率の場合は先に現れた語義を返します。
    pub fn best(&self) -> Option<(&str, f64)> {
        self.iter()
            .fold(None, |best, (sense, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((sense, p)),
            })
    }
}

/// 数値的に安定なソフトマックスをその場で適用します。
///
/// 最大値を引いてから指数を取るため、すべての値に定数を加えても結果は変わりません。
pub fn softmax(values: &mut [f64]) {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax() {
        let mut a = vec![1.0, 2.0, 3.0];
        softmax(&mut a);
        assert!((a.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(a[0] < a[1] && a[1] < a[2]);
    }

    #[test]
    fn test_softmax_shift_invariance() {
        let mut a = vec![0.3, -1.2, 2.5, 0.0];
        let mut b: Vec<f64> = a.iter().map(|v| v + 1000.0).collect();
        softmax(&mut a);
        softmax(&mut b);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_best() {
        let dist = SenseDistribution::new(
            vec![0.2, 0.5, 0.3],
            vec!["a".into(), "b".into(), "c".into()],
        );
        assert_eq!(Some(("b", 0.5)), dist.best());
        assert_eq!(Some(("bank", 1.0)), SenseDistribution::trivial("bank").best());
    }
}
