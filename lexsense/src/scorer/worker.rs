//! 語義スコアリングのためのルーチンを提供するモジュール。
//!
//! ワーカーは文脈ベクトルやロジットのバッファを保持し、再利用することで
//! 呼び出しごとのメモリアロケーションを避けます。
use crate::corpus::Document;
use crate::embedding::{cosine, Matrix};
use crate::errors::Result;
use crate::scorer::{softmax, Scorer, SenseDistribution};
use crate::vocabulary::Pos;

/// 語義スコアリングのためのルーチンを提供する構造体。
///
/// # 例
///
/// ```ignore
/// let mut worker = scorer.new_worker();
/// let dist = worker.score_senses("bank", Pos::Noun, &local, &sentence, &document, true)?;
/// ```
pub struct Worker {
    scorer: Scorer,
    feature: Vec<f64>,
    pooled: Vec<f64>,
    logits: Vec<f64>,
}

impl Worker {
    pub(crate) fn new(scorer: Scorer) -> Self {
        let dim = scorer.model().dim();
        Self {
            scorer,
            feature: vec![0.0; 3 * dim],
            pooled: vec![0.0; dim],
            logits: vec![],
        }
    }

    /// 対象語の候補語義上の確率分布を計算します。
    ///
    /// 文脈トークンは単語名またはシンセット名として語彙から引かれ、
    /// 語彙にないトークンは黙って捨てられます。
    ///
    /// # 引数
    ///
    /// * `word` - 対象語
    /// * `pos` - 対象語の品詞
    /// * `local` - 対象語の周辺の文脈窓
    /// * `sentence` - 対象語を含む文
    /// * `document` - 文書の文のリスト
    /// * `use_prior` - レンマの事前確率で重み付けして正規化し直すかどうか
    ///
    /// # 戻り値
    ///
    /// 語彙の品詞別グループの順に並んだ確率と語義名。
    /// その品詞の語義が登録されていない場合は `([1.0], [word])` を返します。
    ///
    /// # エラー
    ///
    /// 対象語が語彙に含まれない場合は[`MissingKeyError`](crate::errors::MissingKeyError)を返します。
    pub fn score_senses<S, D>(
        &mut self,
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
        let model = self.scorer.model.as_ref();
        let vocab = model.vocabulary();
        let word_id = vocab.resolve(word)?;
        let Some(lemmas) = vocab.senses(word_id, pos) else {
            return Ok(SenseDistribution::trivial(word));
        };

        let dim = model.dim();
        let sense_in = model.embeddings().sense_in();
        let lookup = |token: &str| vocab.sense_id(token).map(|id| id.index());

        let (local_part, rest) = self.feature.split_at_mut(dim);
        let (sentence_part, document_part) = rest.split_at_mut(dim);
        mean_pool(sense_in, local.iter().map(|t| t.as_ref()).filter_map(lookup), local_part);
        mean_pool(sense_in, sentence.iter().map(|t| t.as_ref()).filter_map(lookup), sentence_part);

        document_part.fill(0.0);
        let mut num_sentences = 0usize;
        for s in document {
            let tokens = s.as_ref().iter().map(|t| t.as_ref()).filter_map(lookup);
            if mean_pool(sense_in, tokens, &mut self.pooled) {
                for (d, p) in document_part.iter_mut().zip(&self.pooled) {
                    *d += p;
                }
                num_sentences += 1;
            }
        }
        if num_sentences != 0 {
            let n = num_sentences as f64;
            document_part.iter_mut().for_each(|d| *d /= n);
        }

        let weight = model.embeddings().selection_weight();
        self.logits.clear();
        for &lemma_id in lemmas {
            let row = weight.row(lemma_id.index());
            let dot: f64 = self
                .feature
                .iter()
                .zip(row)
                .map(|(&f, &w)| f * f64::from(w))
                .sum();
            self.logits
                .push(dot + f64::from(model.embeddings().selection_bias(lemma_id.index())));
        }

        softmax(&mut self.logits);
        let mut probabilities = self.logits.clone();

        if use_prior {
            for (p, &lemma_id) in probabilities.iter_mut().zip(lemmas) {
                *p *= f64::from(vocab.lemma(lemma_id).prior());
            }
            let sum: f64 = probabilities.iter().sum();
            if sum > 0.0 {
                probabilities.iter_mut().for_each(|p| *p /= sum);
            } else {
                // All priors are zero; the softmax distribution is kept.
                probabilities.copy_from_slice(&self.logits);
            }
        }

        let senses = lemmas
            .iter()
            .map(|&l| vocab.sense_name(vocab.lemma(l).sense_id()).to_string())
            .collect();
        Ok(SenseDistribution::new(probabilities, senses))
    }

    /// それぞれの文脈で語義を推定したうえで、2語の類似度を計算します。
    ///
    /// 各語の語義分布を[`Worker::score_senses`]で求め、最も確率の高い語義どうしの
    /// コサイン類似度と、語義の組すべてについて確率で重み付けしたコサイン類似度の
    /// 和を返します。語義の登録されていない語は単語自身の語義行を使います。
    ///
    /// # 引数
    ///
    /// * `first` - 1つ目の語とその文脈
    /// * `second` - 2つ目の語とその文脈
    /// * `use_prior` - レンマの事前確率を使うかどうか
    ///
    /// # エラー
    ///
    /// どちらかの語が語彙に含まれない場合は
    /// [`MissingKeyError`](crate::errors::MissingKeyError)を返します。
    pub fn contextual_similarity<S, D>(
        &mut self,
        first: &WordInContext<'_, S, D>,
        second: &WordInContext<'_, S, D>,
        use_prior: bool,
    ) -> Result<ContextualSimilarity>
    where
        S: AsRef<str>,
        D: AsRef<[S]>,
    {
        let dist1 = self.score_senses(
            first.word,
            first.pos,
            first.local,
            first.sentence,
            first.document,
            use_prior,
        )?;
        let dist2 = self.score_senses(
            second.word,
            second.pos,
            second.local,
            second.sentence,
            second.document,
            use_prior,
        )?;

        let model = self.scorer.model();
        let vectors1 = dist1
            .senses()
            .iter()
            .map(|s| model.sense_vector(s))
            .collect::<Result<Vec<_>>>()?;
        let vectors2 = dist2
            .senses()
            .iter()
            .map(|s| model.sense_vector(s))
            .collect::<Result<Vec<_>>>()?;

        let max = match (dist1.best(), dist2.best()) {
            (Some((s1, _)), Some((s2, _))) => {
                cosine(model.sense_vector(s1)?, model.sense_vector(s2)?)
            }
            _ => 0.0,
        };
        let mut average = 0.0;
        for (v1, &p1) in vectors1.iter().zip(dist1.probabilities()) {
            for (v2, &p2) in vectors2.iter().zip(dist2.probabilities()) {
                average += p1 * p2 * cosine(v1, v2);
            }
        }
        Ok(ContextualSimilarity { max, average })
    }

    /// 文書中の品詞付きトークンに最も確率の高い語義を割り当てます。
    ///
    /// 局所文脈は対象トークンの前後`window`個ずつのトークン、文書文脈は直前の文と
    /// 対象の文です。品詞が付いていないトークン、語彙にない単語、その品詞の語義が
    /// 登録されていない単語は注釈されません。
    ///
    /// # 引数
    ///
    /// * `document` - 品詞付きの文書
    /// * `window` - 局所文脈の片側の幅
    /// * `use_prior` - レンマの事前確率を使うかどうか
    pub fn annotate(
        &mut self,
        document: &Document,
        window: usize,
        use_prior: bool,
    ) -> Result<Vec<Annotation>> {
        let words = document.sentence_words();
        let mut annotations = vec![];
        let mut local = vec![];
        for (e, sentence) in document.sentences().iter().enumerate() {
            let context = &words[e.saturating_sub(1)..=e];
            let tokens = &words[e];
            for (i, token) in sentence.iter().enumerate() {
                let Some(pos) = token.pos().filter(|&p| p != Pos::Any) else {
                    continue;
                };
                let vocab = self.scorer.model.vocabulary();
                let has_senses = vocab
                    .word_id(token.word())
                    .is_some_and(|id| vocab.senses(id, pos).is_some());
                if !has_senses {
                    continue;
                }

                local.clear();
                local.extend_from_slice(&tokens[i.saturating_sub(window)..i]);
                local.extend(tokens.iter().skip(i + 1).take(window));
                let dist = self.score_senses(
                    token.word(),
                    pos,
                    local.as_slice(),
                    tokens.as_slice(),
                    context,
                    use_prior,
                )?;
                if let Some((sense, probability)) = dist.best() {
                    annotations.push(Annotation {
                        sentence: e,
                        token: i,
                        sense: sense.to_string(),
                        probability,
                    });
                }
            }
        }
        Ok(annotations)
    }
}

/// 文脈付きの対象語
///
/// 各フィールドは[`Worker::score_senses`]の引数と同じ意味を持ちます。
#[derive(Debug)]
pub struct WordInContext<'a, S, D> {
    /// 対象語
    pub word: &'a str,
    /// 対象語の品詞
    pub pos: Pos,
    /// 対象語の周辺の文脈窓
    pub local: &'a [S],
    /// 対象語を含む文
    pub sentence: &'a [S],
    /// 文書の文のリスト
    pub document: &'a [D],
}

/// 文脈を考慮した2語の類似度
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextualSimilarity {
    /// 最も確率の高い語義どうしのコサイン類似度
    pub max: f64,
    /// 語義確率で重み付けしたコサイン類似度の和
    pub average: f64,
}

/// 文書中のトークンへの語義注釈
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// 文の位置
    pub sentence: usize,
    /// 文中のトークンの位置
    pub token: usize,
    /// 割り当てられた語義名
    pub sense: String,
    /// 語義の確率
    pub probability: f64,
}

/// トークンの語義行を平均プーリングします。
///
/// 1つ以上のトークンがあれば`true`を返します。空の場合、`out`はゼロベクトルになります。
fn mean_pool<I>(matrix: &Matrix, rows: I, out: &mut [f64]) -> bool
where
    I: Iterator<Item = usize>,
{
    out.fill(0.0);
    let mut n = 0usize;
    for i in rows {
        for (o, &v) in out.iter_mut().zip(matrix.row(i)) {
            *o += f64::from(v);
        }
        n += 1;
    }
    if n == 0 {
        return false;
    }
    let n = n as f64;
    out.iter_mut().for_each(|o| *o /= n);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::build_test_model;

    const EMPTY: &[&str] = &[];
    const NO_DOC: &[&[&str]] = &[];

    fn assert_sums_to_one(probs: &[f64]) {
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_local_context() {
        let scorer = Scorer::new(build_test_model());
        let mut worker = scorer.new_worker();

        let dist = worker
            .score_senses("bank", Pos::Noun, &["river"], EMPTY, NO_DOC, false)
            .unwrap();
        assert_eq!(&["bank.n.01".to_string(), "bank.n.02".to_string()], dist.senses());
        let e = std::f64::consts::E;
        assert!((dist.probabilities()[0] - e / (e + 1.0)).abs() < 1e-9);
        assert_sums_to_one(dist.probabilities());

        let dist = worker
            .score_senses("bank", Pos::Noun, &["money", "unknown_token"], EMPTY, NO_DOC, false)
            .unwrap();
        assert_eq!(Some(("bank.n.02", dist.probabilities()[1])), dist.best());
    }

    #[test]
    fn test_empty_context_is_uniform() {
        let scorer = Scorer::new(build_test_model());
        let dist = scorer
            .score_senses("bank", Pos::Noun, EMPTY, EMPTY, NO_DOC, false)
            .unwrap();
        assert!((dist.probabilities()[0] - 0.5).abs() < 1e-12);
        assert!((dist.probabilities()[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_prior() {
        let scorer = Scorer::new(build_test_model());
        let dist = scorer
            .score_senses("bank", Pos::Noun, EMPTY, EMPTY, NO_DOC, true)
            .unwrap();
        assert!((dist.probabilities()[0] - 0.75).abs() < 1e-6);
        assert!((dist.probabilities()[1] - 0.25).abs() < 1e-6);

        let dist = scorer
            .score_senses("bank", Pos::Noun, &["river", "bank.n.01"], &["money"], NO_DOC, true)
            .unwrap();
        assert_sums_to_one(dist.probabilities());
    }

    #[test]
    fn test_document_pooling() {
        let scorer = Scorer::new(build_test_model());
        let mut worker = scorer.new_worker();
        let document: Vec<Vec<&str>> = vec![vec!["river"], vec![], vec!["zzz"]];
        // Only the local part of the feature vector is weighted, so the document
        // must not change the distribution.
        let dist = worker
            .score_senses("bank", Pos::Noun, EMPTY, EMPTY, &document[..], false)
            .unwrap();
        assert_sums_to_one(dist.probabilities());
        assert_eq!(&[0.0, 0.0, 0.0, 0.0, 1.0, 0.0], worker.feature.as_slice());

        let document: Vec<Vec<&str>> = vec![vec!["river"], vec!["money", "money"]];
        worker
            .score_senses("bank", Pos::Noun, EMPTY, EMPTY, &document[..], false)
            .unwrap();
        assert_eq!(&[0.0, 0.0, 0.0, 0.0, 0.5, 0.5], worker.feature.as_slice());
    }

    #[test]
    fn test_missing_word() {
        let scorer = Scorer::new(build_test_model());
        let result = scorer.score_senses("zzz_not_a_word", Pos::Noun, EMPTY, EMPTY, NO_DOC, false);
        assert!(result.unwrap_err().is_missing_key());
    }

    #[test]
    fn test_no_group() {
        let scorer = Scorer::new(build_test_model());
        for (word, pos) in [("bank", Pos::Adverb), ("money", Pos::Noun), ("bank", Pos::Any)] {
            let dist = scorer
                .score_senses(word, pos, &["river"], EMPTY, NO_DOC, true)
                .unwrap();
            assert_eq!(&[1.0], dist.probabilities());
            assert_eq!(&[word.to_string()], dist.senses());
        }
    }

    #[test]
    fn test_annotate() {
        use crate::corpus::Corpus;

        let corpus = Corpus::from_reader(
            "<doc>\nriver__n bank__n\nmoney__* bank__NN\nbank__v money__n\n</doc>\n".as_bytes(),
        )
        .unwrap();
        let scorer = Scorer::new(build_test_model());
        let mut worker = scorer.new_worker();
        let annotations = worker
            .annotate(&corpus.documents()[0], 5, false)
            .unwrap();

        assert_eq!(3, annotations.len());
        assert_eq!((0, 1), (annotations[0].sentence, annotations[0].token));
        assert_eq!("bank.n.01", annotations[0].sense);
        assert_eq!((1, 1), (annotations[1].sentence, annotations[1].token));
        assert_eq!("bank.n.02", annotations[1].sense);
        assert_eq!((2, 0), (annotations[2].sentence, annotations[2].token));
        assert_eq!("bank.v.01", annotations[2].sense);
        assert!((annotations[2].probability - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_annotate_window() {
        use crate::corpus::Corpus;

        let corpus = Corpus::from_reader(
            "<doc>\nriver__* money__* money__* bank__n\n</doc>\n".as_bytes(),
        )
        .unwrap();
        let scorer = Scorer::new(build_test_model());
        let mut worker = scorer.new_worker();
        let doc = &corpus.documents()[0];
        assert_eq!("bank.n.02", worker.annotate(doc, 5, false).unwrap()[0].sense);
        // A window of 1 sees only the preceding "money".
        assert_eq!("bank.n.02", worker.annotate(doc, 1, false).unwrap()[0].sense);
        let uniform = worker.annotate(doc, 0, false).unwrap();
        assert!((uniform[0].probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_contextual_similarity() {
        let scorer = Scorer::new(build_test_model());
        let mut worker = scorer.new_worker();
        let e = std::f64::consts::E;
        let money = WordInContext {
            word: "money",
            pos: Pos::Any,
            local: EMPTY,
            sentence: EMPTY,
            document: NO_DOC,
        };

        let river_bank = WordInContext {
            word: "bank",
            pos: Pos::Noun,
            local: &["river"][..],
            sentence: EMPTY,
            document: NO_DOC,
        };
        let sim = worker
            .contextual_similarity(&river_bank, &money, false)
            .unwrap();
        assert!(sim.max.abs() < 1e-9);
        assert!((sim.average - 1.0 / (1.0 + e)).abs() < 1e-9);

        let money_bank = WordInContext {
            local: &["money"][..],
            ..river_bank
        };
        let sim = worker
            .contextual_similarity(&money_bank, &money, false)
            .unwrap();
        assert!((sim.max - 1.0).abs() < 1e-9);
        assert!((sim.average - e / (1.0 + e)).abs() < 1e-9);

        // bank.v.01 is [0.6, 0.8].
        let verb_bank = WordInContext {
            word: "bank",
            pos: Pos::Verb,
            local: EMPTY,
            sentence: EMPTY,
            document: NO_DOC,
        };
        let sim = worker
            .contextual_similarity(&river_bank, &verb_bank, false)
            .unwrap();
        assert!((sim.max - 0.6).abs() < 1e-6);
        let expected = (0.6 * e + 0.8) / (1.0 + e);
        assert!((sim.average - expected).abs() < 1e-6);
    }

    #[test]
    fn test_contextual_similarity_missing_word() {
        let scorer = Scorer::new(build_test_model());
        let mut worker = scorer.new_worker();
        let known = WordInContext {
            word: "bank",
            pos: Pos::Noun,
            local: EMPTY,
            sentence: EMPTY,
            document: NO_DOC,
        };
        let unknown = WordInContext {
            word: "zzz_not_a_word",
            ..known
        };
        let result = worker.contextual_similarity(&known, &unknown, true);
        assert!(result.unwrap_err().is_missing_key());
    }

    #[test]
    fn test_parallel_workers() {
        let scorer = Scorer::new(build_test_model());
        let expected = scorer
            .score_senses("bank", Pos::Noun, &["river"], EMPTY, NO_DOC, false)
            .unwrap();
        std::thread::scope(|s| {
            for _ in 0..4 {
                let scorer = scorer.clone();
                let expected = &expected;
                s.spawn(move || {
                    let mut worker = scorer.new_worker();
                    for _ in 0..10 {
                        let dist = worker
                            .score_senses("bank", Pos::Noun, &["river"], EMPTY, NO_DOC, false)
                            .unwrap();
                        assert_eq!(expected, &dist);
                    }
                });
            }
        });
    }
}
