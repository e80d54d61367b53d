//! 定義文グラフによる語義の特徴語の重み付け
//!
//! 各語義の定義文を関係グラフに沿って展開し、語義を区別する特徴語の
//! 重み付きリストを作成します。
//!
//! # 主要な構造体
//!
//! - [`GlossWeighter`]: 語義グループの署名を構築する
//! - [`GlossPipeline`]: 単語のリストから語義レコードを作成する
//! - [`LexicalGraph`]: 定義文と関係を提供するインタフェース
//!
//! # 重み
//!
//! 語義`S`の署名に含まれる単語`w`の重みは次の式で計算されます。
//!
//! ```text
//! weight(S, w) = freq(S, w) * igf(w, S) / (1 + distance(S, w))
//! igf(w, S)    = 1 + log2(|L(S)| / |{S' in L(S) : w in signature(S')}|)
//! ```
//!
//! `L(S)`は`S`と同じ単語・品詞の語義グループです。
mod cache;
mod config;
mod graph;
mod pipeline;
mod stopwords;
mod tokenizer;

use std::cmp::Ordering;

use hashbrown::{HashMap, HashSet};

use crate::errors::Result;

pub use crate::gloss::cache::GlossCache;
pub use crate::gloss::config::GlossConfig;
pub use crate::gloss::graph::{LexicalGraph, MemoryGraph, SenseEntry};
pub use crate::gloss::pipeline::{write_records, GlossPipeline, SenseRecord};
pub use crate::gloss::stopwords::{WordSet, ENGLISH_STOPWORDS};
pub use crate::gloss::tokenizer::{SimpleTokenizer, TextTokenizer};

/// 署名中の1単語の統計
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlossFeature {
    /// 出現回数
    pub freq: u32,
    /// 元の語義からのグラフ距離
    pub distance: u32,
    /// 重み
    pub weight: f64,
}

/// 1つの語義の署名
#[derive(Clone, Debug, Default)]
pub struct GlossSignature {
    features: HashMap<String, GlossFeature>,
}

impl GlossSignature {
    /// 単語を記録します。
    ///
    /// 初めて現れた単語は頻度1で登録され、既出の単語は頻度だけが増えます。
    /// 距離は記録された中で最小のものが保持されます。
    pub fn record(&mut self, word: &str, distance: u32) {
        match self.features.get_mut(word) {
            Some(f) => {
                f.freq += 1;
                f.distance = f.distance.min(distance);
            }
            None => {
                self.features.insert(
                    word.to_string(),
                    GlossFeature {
                        freq: 1,
                        distance,
                        weight: 0.0,
                    },
                );
            }
        }
    }

    /// 単語の統計を返します。
    pub fn get(&self, word: &str) -> Option<&GlossFeature> {
        self.features.get(word)
    }

    /// 単語が含まれるかどうかを返します。
    pub fn contains(&self, word: &str) -> bool {
        self.features.contains_key(word)
    }

    /// 単語の数を返します。
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// 署名が空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// 重みの降順、同じ重みでは単語の昇順に並べた (単語, 重み) のリストを返します。
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<_> = self
            .features
            .iter()
            .map(|(w, f)| (w.as_str(), f.weight))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
    }
}

/// 逆定義文頻度
///
/// # 引数
///
/// * `group_size` - 語義グループの大きさ
/// * `df` - 単語を署名に含む語義の数
#[inline(always)]
pub fn igf(group_size: usize, df: usize) -> f64 {
    1.0 + (group_size as f64 / df as f64).log2()
}

/// 頻度、逆定義文頻度、グラフ距離から重みを計算します。
#[inline(always)]
pub fn gloss_weight(freq: u32, igf: f64, distance: u32) -> f64 {
    f64::from(freq) * igf / (1.0 + f64::from(distance))
}

/// 語義グループの署名を構築する重み付け器。
///
/// 語彙グラフへの問い合わせは内部の[`GlossCache`]にメモ化されます。
pub struct GlossWeighter<'a, G, T>
where
    G: LexicalGraph + ?Sized,
    T: TextTokenizer + ?Sized,
{
    graph: &'a G,
    tokenizer: &'a T,
    config: &'a GlossConfig,
    cache: GlossCache,
}

impl<'a, G, T> GlossWeighter<'a, G, T>
where
    G: LexicalGraph + ?Sized,
    T: TextTokenizer + ?Sized,
{
    /// 新しい重み付け器を作成します。
    pub fn new(graph: &'a G, tokenizer: &'a T, config: &'a GlossConfig) -> Self {
        Self::with_cache(graph, tokenizer, config, GlossCache::new())
    }

    /// 既存のキャッシュを使う重み付け器を作成します。
    pub fn with_cache(
        graph: &'a G,
        tokenizer: &'a T,
        config: &'a GlossConfig,
        cache: GlossCache,
    ) -> Self {
        Self {
            graph,
            tokenizer,
            config,
            cache,
        }
    }

    /// キャッシュへの参照を返します。
    pub fn cache(&self) -> &GlossCache {
        &self.cache
    }

    /// 語義グループの各語義の署名を構築します。
    ///
    /// `senses`は同じ単語・品詞の語義グループ`L(S)`として扱われ、
    /// 逆定義文頻度はこのグループ内で計算されます。
    ///
    /// # 戻り値
    ///
    /// 語義名から署名へのマップ。重みは計算済みです。
    ///
    /// # エラー
    ///
    /// 語彙グラフへの問い合わせが失敗した場合にエラーを返します。
    pub fn build_signatures<S>(&mut self, senses: &[S]) -> Result<HashMap<String, GlossSignature>>
    where
        S: AsRef<str>,
    {
        let mut signatures = HashMap::with_capacity(senses.len());
        for sense in senses {
            let sense = sense.as_ref();
            if !signatures.contains_key(sense) {
                let signature = self.expand(sense)?;
                signatures.insert(sense.to_string(), signature);
            }
        }

        let mut df: HashMap<String, usize> = HashMap::new();
        for signature in signatures.values() {
            for word in signature.features.keys() {
                *df.entry_ref(word.as_str()).or_default() += 1;
            }
        }
        let group_size = signatures.len();
        for signature in signatures.values_mut() {
            for (word, f) in signature.features.iter_mut() {
                let igf = igf(group_size, df[word]);
                f.weight = gloss_weight(f.freq, igf, f.distance);
            }
        }
        Ok(signatures)
    }

    /// 1つの語義の署名を、重みを計算せずに構築します。
    fn expand(&mut self, sense: &str) -> Result<GlossSignature> {
        let mut signature = GlossSignature::default();
        let mut visited = HashSet::new();
        visited.insert(sense.to_string());
        let mut frontier = vec![sense.to_string()];

        for hop in 0..self.config.expansion_depth {
            let distance = u32::try_from(hop)?;
            for s in &frontier {
                let gloss = self.cache.gloss_words(
                    self.graph,
                    self.tokenizer,
                    s,
                    self.config.use_extended_gloss_source,
                )?;
                for word in gloss.iter() {
                    signature.record(word, distance);
                }
                let examples = self.cache.example_words(self.graph, self.tokenizer, s)?;
                for word in examples.iter() {
                    signature.record(word, distance + 1);
                }
            }

            if hop + 1 == self.config.expansion_depth {
                break;
            }
            let mut next = vec![];
            for s in &frontier {
                let related = self.cache.related_senses(
                    self.graph,
                    s,
                    self.config.use_gloss_disambiguation_relation,
                )?;
                for r in related.iter() {
                    if visited.insert(r.clone()) {
                        next.push(r.clone());
                    }
                }
            }
            frontier = next;
        }

        for lemma in self.graph.lemma_names(sense)? {
            signature.record(&lemma, 1);
        }
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::vocabulary::Pos;

    fn bank_graph() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph
            .add_sense(
                "bank.n.01",
                SenseEntry::new(Pos::Noun, "sloping land beside a body of water")
                    .example("they pulled the canoe up on the bank")
                    .relation("slope.n.01")
                    .lemma("bank", 25),
            )
            .unwrap();
        graph
            .add_sense(
                "bank.n.02",
                SenseEntry::new(Pos::Noun, "a financial institution that accepts deposits")
                    .relation("financial_institution.n.01")
                    .lemma("bank", 20)
                    .lemma("depository_financial_institution", 0),
            )
            .unwrap();
        graph
            .add_sense(
                "slope.n.01",
                SenseEntry::new(Pos::Noun, "an elevated geological formation")
                    .relation("bank.n.01")
                    .relation("hill.n.01")
                    .lemma("slope", 3),
            )
            .unwrap();
        graph
            .add_sense(
                "hill.n.01",
                SenseEntry::new(Pos::Noun, "a local and well-defined elevation of the land")
                    .lemma("hill", 9),
            )
            .unwrap();
        graph
            .add_sense(
                "financial_institution.n.01",
                SenseEntry::new(Pos::Noun, "an institution that manages money")
                    .lemma("financial_institution", 2),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_weight_monotonic() {
        let g = igf(4, 2);
        assert!((g - 2.0).abs() < 1e-12);
        assert!(gloss_weight(2, g, 1) > gloss_weight(1, g, 1));
        assert!(gloss_weight(1, g, 0) > gloss_weight(1, g, 1));
        assert!(gloss_weight(1, g, 1) > gloss_weight(1, g, 2));
        assert_eq!(1.0, igf(3, 3));
    }

    #[test]
    fn test_build_signatures() {
        let graph = bank_graph();
        let config = GlossConfig::default();
        let mut weighter = GlossWeighter::new(&graph, &SimpleTokenizer, &config);
        let signatures = weighter.build_signatures(&["bank.n.01", "bank.n.02"]).unwrap();
        assert_eq!(2, signatures.len());

        let river = &signatures["bank.n.01"];
        // Own gloss at distance 0, examples at 1.
        assert_eq!(0, river.get("sloping").unwrap().distance);
        assert_eq!(1, river.get("canoe").unwrap().distance);
        // Neighbour gloss at distance 1; the second hop is not expanded.
        assert_eq!(1, river.get("geological").unwrap().distance);
        assert!(!river.contains("well-defined"));
        // "bank" appears in the example and as a lemma name.
        assert_eq!(2, river.get("bank").unwrap().freq);

        // "bank" is in both signatures: igf = 1 + log2(2 / 2) = 1.
        let f = river.get("bank").unwrap();
        assert!((f.weight - 2.0 / 2.0).abs() < 1e-12);
        // "sloping" only in one: igf = 2.
        let f = river.get("sloping").unwrap();
        assert!((f.weight - 2.0).abs() < 1e-12);

        let money = &signatures["bank.n.02"];
        assert_eq!(1, money.get("money").unwrap().distance);
        assert_eq!(
            1,
            money.get("depository_financial_institution").unwrap().distance
        );
    }

    #[test]
    fn test_deeper_expansion() {
        let graph = bank_graph();
        let config = GlossConfig::default().expansion_depth(3);
        let mut weighter = GlossWeighter::new(&graph, &SimpleTokenizer, &config);
        let signatures = weighter.build_signatures(&["bank.n.01"]).unwrap();
        let river = &signatures["bank.n.01"];
        // "land" is in the own gloss and in hill.n.01 two hops away.
        let land = river.get("land").unwrap();
        assert_eq!(0, land.distance);
        assert_eq!(2, land.freq);
        assert_eq!(2, river.get("well-defined").unwrap().distance);
        // bank.n.01 is already visited, so its gloss is counted once.
        assert_eq!(1, river.get("sloping").unwrap().freq);
    }

    #[test]
    fn test_zero_depth() {
        let graph = bank_graph();
        let config = GlossConfig::default().expansion_depth(0);
        let mut weighter = GlossWeighter::new(&graph, &SimpleTokenizer, &config);
        let signatures = weighter.build_signatures(&["bank.n.01"]).unwrap();
        assert_eq!(1, signatures["bank.n.01"].len());
    }

    #[test]
    fn test_ranked_tie_break() {
        let mut signature = GlossSignature::default();
        for word in ["water", "land", "river", "land"] {
            signature.record(word, 0);
        }
        for f in signature.features.values_mut() {
            f.weight = gloss_weight(f.freq, 1.0, f.distance);
        }
        let words: Vec<_> = signature.ranked().into_iter().map(|(w, _)| w).collect();
        assert_eq!(vec!["land", "river", "water"], words);
    }

    #[test]
    fn test_missing_sense() {
        let graph = bank_graph();
        let config = GlossConfig::default();
        let mut weighter = GlossWeighter::new(&graph, &SimpleTokenizer, &config);
        let result = weighter.build_signatures(&["zzz.n.01"]);
        assert!(result.unwrap_err().is_missing_key());
    }
}
