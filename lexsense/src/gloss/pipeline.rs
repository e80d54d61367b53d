//! 単語のリストから語義レコードを作成するパイプライン
use std::fmt;
use std::io::Write;
use std::thread;

use hashbrown::HashSet;

use crate::errors::{LexsenseError, Result};
use crate::gloss::graph::LexicalGraph;
use crate::gloss::stopwords::WordSet;
use crate::gloss::tokenizer::TextTokenizer;
use crate::gloss::{GlossCache, GlossConfig, GlossWeighter};
use crate::vocabulary::{LemmaKey, Pos};

/// 1語義分の出力レコード
///
/// `word|pos|sense prior w1,w2,...`の形式で書き出されます。
#[derive(Clone, Debug, PartialEq)]
pub struct SenseRecord {
    key: LemmaKey,
    prior: f64,
    words: Vec<String>,
}

impl SenseRecord {
    /// レンマキーを返します。
    #[inline(always)]
    pub fn key(&self) -> &LemmaKey {
        &self.key
    }

    /// 単語・品詞グループ内での事前確率を返します。
    #[inline(always)]
    pub fn prior(&self) -> f64 {
        self.prior
    }

    /// 重みの降順に並んだ特徴語を返します。
    #[inline(always)]
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl fmt::Display for SenseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.8} {}", self.key, self.prior, self.words.join(","))
    }
}

/// レコードを1行ずつ書き出します。
pub fn write_records<W>(mut wtr: W, records: &[SenseRecord]) -> Result<()>
where
    W: Write,
{
    for record in records {
        writeln!(wtr, "{record}")?;
    }
    Ok(())
}

/// 重み付けパイプライン。
///
/// 単語ごとに語義を品詞でグループ化し、各グループの署名を構築して
/// 上位の特徴語と事前確率を持つレコードを作成します。
pub struct GlossPipeline<'a, G, T>
where
    G: LexicalGraph + Sync + ?Sized,
    T: TextTokenizer + Sync + ?Sized,
{
    graph: &'a G,
    tokenizer: &'a T,
    config: GlossConfig,
    stopwords: WordSet,
    vocabulary: WordSet,
}

impl<'a, G, T> GlossPipeline<'a, G, T>
where
    G: LexicalGraph + Sync + ?Sized,
    T: TextTokenizer + Sync + ?Sized,
{
    /// 新しいパイプラインを作成します。
    ///
    /// ストップワードは同梱の英語リストになります。
    ///
    /// # 引数
    ///
    /// * `graph` - 語彙グラフ
    /// * `tokenizer` - 定義文のトークナイザ
    /// * `config` - 設定
    /// * `vocabulary` - 出力する特徴語を制限する語彙
    pub fn new(graph: &'a G, tokenizer: &'a T, config: GlossConfig, vocabulary: WordSet) -> Self {
        Self {
            graph,
            tokenizer,
            config,
            stopwords: WordSet::english_stopwords(),
            vocabulary,
        }
    }

    /// ストップワードを置き換えます。
    pub fn stopwords(mut self, stopwords: WordSet) -> Self {
        self.stopwords = stopwords;
        self
    }

    /// 設定への参照を返します。
    pub fn config(&self) -> &GlossConfig {
        &self.config
    }

    /// すべての単語のレコードを作成します。
    ///
    /// 単語は`num_threads`個のワーカーに分割され、各ワーカーは自身の
    /// [`GlossCache`]を持ちます。出力は入力の単語順に並びます。
    ///
    /// # エラー
    ///
    /// 語彙グラフへの問い合わせが失敗した場合、またはワーカーがパニックした場合に
    /// エラーを返します。
    pub fn run<S>(&self, words: &[S]) -> Result<Vec<SenseRecord>>
    where
        S: AsRef<str> + Sync,
    {
        let num_threads = self.config.num_threads.max(1);
        if num_threads == 1 || words.len() <= 1 {
            let mut weighter = GlossWeighter::new(self.graph, self.tokenizer, &self.config);
            return self.process_chunk(&mut weighter, words);
        }

        let chunk_size = words.len().div_ceil(num_threads);
        log::info!(
            "[lexsense] Processing {} words with {} threads",
            words.len(),
            num_threads
        );
        let results: Vec<Result<Vec<SenseRecord>>> = thread::scope(|s| {
            let handles: Vec<_> = words
                .chunks(chunk_size)
                .map(|chunk| {
                    s.spawn(move || {
                        let mut weighter =
                            GlossWeighter::new(self.graph, self.tokenizer, &self.config);
                        self.process_chunk(&mut weighter, chunk)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| Err(panic_error(e))))
                .collect()
        });

        let mut records = vec![];
        for result in results {
            records.extend(result?);
        }
        Ok(records)
    }

    fn process_chunk<S>(
        &self,
        weighter: &mut GlossWeighter<'_, G, T>,
        words: &[S],
    ) -> Result<Vec<SenseRecord>>
    where
        S: AsRef<str>,
    {
        let mut records = vec![];
        for word in words {
            records.extend(self.process_word(weighter, word.as_ref())?);
        }
        let (hits, misses) = weighter.cache().stats();
        log::debug!("[lexsense] Gloss cache: {hits} hits, {misses} misses");
        Ok(records)
    }

    /// 1つの単語のレコードを作成します。
    pub fn process_word(
        &self,
        weighter: &mut GlossWeighter<'_, G, T>,
        word: &str,
    ) -> Result<Vec<SenseRecord>> {
        let mut records = vec![];
        for (pos, senses) in self.pos_groups(word)? {
            records.extend(self.process_group(weighter, word, pos, &senses)?);
        }
        Ok(records)
    }

    /// 単語の語義を、品詞が最初に現れた順にグループ化します。
    fn pos_groups(&self, word: &str) -> Result<Vec<(Pos, Vec<String>)>> {
        let mut groups: Vec<(Pos, Vec<String>)> = vec![];
        for sense in self.graph.senses_of(word)? {
            let pos = self.graph.pos(&sense)?;
            match groups.iter_mut().find(|(p, _)| *p == pos) {
                Some((_, senses)) => {
                    if !senses.contains(&sense) {
                        senses.push(sense);
                    }
                }
                None => groups.push((pos, vec![sense])),
            }
        }
        Ok(groups)
    }

    fn process_group(
        &self,
        weighter: &mut GlossWeighter<'_, G, T>,
        word: &str,
        pos: Pos,
        senses: &[String],
    ) -> Result<Vec<SenseRecord>> {
        let signatures = weighter.build_signatures(senses)?;

        let mut counts = Vec::with_capacity(senses.len());
        for sense in senses {
            counts.push(self.graph.lemma_count(sense, word)?);
        }
        let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
        let denominator = total as f64 + senses.len() as f64;

        let mut records = Vec::with_capacity(senses.len());
        for (sense, &count) in senses.iter().zip(&counts) {
            let mut excluded = HashSet::new();
            if self.config.exclude_synset_lemmas {
                excluded.extend(self.graph.lemma_names(sense)?);
                excluded.insert(word.to_string());
            }
            let words: Vec<String> = signatures
                .get(sense.as_str())
                .map(|signature| signature.ranked())
                .unwrap_or_default()
                .into_iter()
                .filter(|&(w, weight)| {
                    weight > 0.0
                        && !self.stopwords.contains(w)
                        && self.vocabulary.contains(w)
                        && !excluded.contains(w)
                })
                .take(self.config.top_k)
                .map(|(w, _)| w.to_string())
                .collect();
            records.push(SenseRecord {
                key: LemmaKey::new(word, pos, sense.as_str())?,
                prior: (f64::from(count) + 1.0) / denominator,
                words,
            });
        }

        let min_words = self.config.min_group_words;
        if records.iter().all(|r| r.words.len() < min_words) {
            // Keep the first sense so that no group is empty.
            records.truncate(1);
        } else {
            records.retain(|r| r.words.len() >= min_words);
        }
        Ok(records)
    }

    /// 既存のキャッシュを使う重み付け器を作成します。
    ///
    /// [`GlossPipeline::process_word`]を繰り返し呼ぶ場合に使います。
    pub fn weighter(&self, cache: GlossCache) -> GlossWeighter<'_, G, T> {
        GlossWeighter::with_cache(self.graph, self.tokenizer, &self.config, cache)
    }
}

fn panic_error(e: Box<dyn std::any::Any + Send>) -> LexsenseError {
    let msg = if let Some(s) = e.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = e.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    };
    LexsenseError::ThreadPanic(msg)
}
