//! 語彙グラフの問い合わせ結果のキャッシュ
use std::sync::Arc;

use hashbrown::HashMap;

use crate::errors::Result;
use crate::gloss::graph::LexicalGraph;
use crate::gloss::tokenizer::TextTokenizer;

/// 語義ごとの定義文トークン、用例トークン、関係を保持するキャッシュ。
///
/// スレッド間で共有されず、ワーカーごとに1つ作成されます。
/// 同じキャッシュは同じ`use_extended_gloss`と`use_gloss_relation`で使う必要があります。
#[derive(Default)]
pub struct GlossCache {
    glosses: HashMap<String, Arc<[String]>>,
    examples: HashMap<String, Arc<[String]>>,
    relations: HashMap<String, Arc<[String]>>,
    hits: usize,
    misses: usize,
}

impl GlossCache {
    /// 空のキャッシュを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 語義の定義文を小文字のトークン列として返します。
    ///
    /// `use_extended_gloss`が有効で拡張定義文が得られる場合はそちらを使います。
    pub fn gloss_words<G, T>(
        &mut self,
        graph: &G,
        tokenizer: &T,
        sense: &str,
        use_extended_gloss: bool,
    ) -> Result<Arc<[String]>>
    where
        G: LexicalGraph + ?Sized,
        T: TextTokenizer + ?Sized,
    {
        if let Some(words) = self.glosses.get(sense) {
            self.hits += 1;
            return Ok(Arc::clone(words));
        }
        self.misses += 1;
        let extended = if use_extended_gloss {
            graph.extended_gloss(sense)?
        } else {
            None
        };
        let text = match extended {
            Some(text) => text,
            None => graph.gloss(sense)?,
        };
        let words: Arc<[String]> = lowercase(tokenizer.tokenize(&text)).into();
        self.glosses.insert(sense.to_string(), Arc::clone(&words));
        Ok(words)
    }

    /// 語義の用例をすべて連結した小文字のトークン列として返します。
    pub fn example_words<G, T>(
        &mut self,
        graph: &G,
        tokenizer: &T,
        sense: &str,
    ) -> Result<Arc<[String]>>
    where
        G: LexicalGraph + ?Sized,
        T: TextTokenizer + ?Sized,
    {
        if let Some(words) = self.examples.get(sense) {
            self.hits += 1;
            return Ok(Arc::clone(words));
        }
        self.misses += 1;
        let mut words = vec![];
        for example in graph.examples(sense)? {
            words.extend(lowercase(tokenizer.tokenize(&example)));
        }
        let words: Arc<[String]> = words.into();
        self.examples.insert(sense.to_string(), Arc::clone(&words));
        Ok(words)
    }

    /// 語義と関係で結ばれた語義を、重複を除いて最初に現れた順で返します。
    pub fn related_senses<G>(
        &mut self,
        graph: &G,
        sense: &str,
        use_gloss_relation: bool,
    ) -> Result<Arc<[String]>>
    where
        G: LexicalGraph + ?Sized,
    {
        if let Some(senses) = self.relations.get(sense) {
            self.hits += 1;
            return Ok(Arc::clone(senses));
        }
        self.misses += 1;
        let mut related = graph.related_senses(sense)?;
        if use_gloss_relation {
            related.extend(graph.gloss_related_senses(sense)?);
        }
        let mut seen = hashbrown::HashSet::new();
        related.retain(|s| seen.insert(s.clone()));
        let related: Arc<[String]> = related.into();
        self.relations.insert(sense.to_string(), Arc::clone(&related));
        Ok(related)
    }

    /// キャッシュされた語義の数を返します。
    pub fn len(&self) -> usize {
        self.glosses.len() + self.examples.len() + self.relations.len()
    }

    /// キャッシュが空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (ヒット数, ミス数) を返します。
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

fn lowercase(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().map(|t| t.to_lowercase()).collect()
}
