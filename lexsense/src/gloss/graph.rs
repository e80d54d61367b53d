//! 語義の定義文と関係を提供する語彙グラフ
use hashbrown::HashMap;

use crate::errors::{LexsenseError, Result};
use crate::vocabulary::Pos;

/// 語義の定義文、用例、関係を提供するインタフェース。
///
/// 語義は`bank.n.01`のような名前で識別されます。
/// 同梱の[`MemoryGraph`]のほか、外部サービスに問い合わせる実装を差し込むことができます。
pub trait LexicalGraph {
    /// 単語の語義を、辞書の順序で返します。
    fn senses_of(&self, word: &str) -> Result<Vec<String>>;

    /// 語義の品詞を返します。
    fn pos(&self, sense: &str) -> Result<Pos>;

    /// 語義の定義文を返します。
    fn gloss(&self, sense: &str) -> Result<String>;

    /// 外部の語彙資源による拡張定義文を返します。
    fn extended_gloss(&self, _sense: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// 語義の用例を返します。
    fn examples(&self, sense: &str) -> Result<Vec<String>>;

    /// 上位語や部分語などの関係で結ばれた語義を返します。
    fn related_senses(&self, sense: &str) -> Result<Vec<String>>;

    /// 定義文の語義曖昧性解消で結ばれた語義を返します。
    fn gloss_related_senses(&self, _sense: &str) -> Result<Vec<String>> {
        Ok(vec![])
    }

    /// 語義に属するレンマ名を返します。
    fn lemma_names(&self, sense: &str) -> Result<Vec<String>>;

    /// コーパス中で`word`がこの語義で使われた回数を返します。
    fn lemma_count(&self, _sense: &str, _word: &str) -> Result<u32> {
        Ok(0)
    }
}

/// [`MemoryGraph`]の1語義分のエントリ
#[derive(Clone, Debug)]
pub struct SenseEntry {
    pos: Pos,
    gloss: String,
    extended_gloss: Option<String>,
    examples: Vec<String>,
    relations: Vec<String>,
    gloss_relations: Vec<String>,
    lemmas: Vec<(String, u32)>,
}

impl SenseEntry {
    /// 品詞と定義文から新しいエントリを作成します。
    pub fn new<S>(pos: Pos, gloss: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            pos,
            gloss: gloss.into(),
            extended_gloss: None,
            examples: vec![],
            relations: vec![],
            gloss_relations: vec![],
            lemmas: vec![],
        }
    }

    /// 拡張定義文を設定します。
    pub fn extended_gloss<S>(mut self, gloss: S) -> Self
    where
        S: Into<String>,
    {
        self.extended_gloss = Some(gloss.into());
        self
    }

    /// 用例を追加します。
    pub fn example<S>(mut self, example: S) -> Self
    where
        S: Into<String>,
    {
        self.examples.push(example.into());
        self
    }

    /// 関係で結ばれた語義を追加します。
    pub fn relation<S>(mut self, sense: S) -> Self
    where
        S: Into<String>,
    {
        self.relations.push(sense.into());
        self
    }

    /// 定義文の語義曖昧性解消で結ばれた語義を追加します。
    pub fn gloss_relation<S>(mut self, sense: S) -> Self
    where
        S: Into<String>,
    {
        self.gloss_relations.push(sense.into());
        self
    }

    /// レンマ名と使用回数を追加します。
    pub fn lemma<S>(mut self, name: S, count: u32) -> Self
    where
        S: Into<String>,
    {
        self.lemmas.push((name.into(), count));
        self
    }
}

/// メモリ上に保持される語彙グラフ
#[derive(Default)]
pub struct MemoryGraph {
    senses: HashMap<String, SenseEntry>,
    words: HashMap<String, Vec<String>>,
}

impl MemoryGraph {
    /// 空のグラフを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 語義を追加します。
    ///
    /// 語義はレンマ名の単語から、追加した順に引けるようになります。
    ///
    /// # エラー
    ///
    /// 同じ名前の語義がすでに存在する場合は
    /// [`FormatError`](crate::errors::FormatError)を返します。
    pub fn add_sense<S>(&mut self, name: S, entry: SenseEntry) -> Result<()>
    where
        S: Into<String>,
    {
        let name = name.into();
        if self.senses.contains_key(&name) {
            return Err(LexsenseError::invalid_format(
                "graph",
                format!("duplicate sense: {name}"),
            ));
        }
        for (lemma, _) in &entry.lemmas {
            self.words
                .entry(lemma.to_lowercase())
                .or_default()
                .push(name.clone());
        }
        self.senses.insert(name, entry);
        Ok(())
    }

    /// 語義の数を返します。
    pub fn num_senses(&self) -> usize {
        self.senses.len()
    }

    fn entry(&self, sense: &str) -> Result<&SenseEntry> {
        self.senses
            .get(sense)
            .ok_or_else(|| LexsenseError::missing_key("sense", sense))
    }
}

impl LexicalGraph for MemoryGraph {
    fn senses_of(&self, word: &str) -> Result<Vec<String>> {
        Ok(self.words.get(word).cloned().unwrap_or_default())
    }

    fn pos(&self, sense: &str) -> Result<Pos> {
        Ok(self.entry(sense)?.pos)
    }

    fn gloss(&self, sense: &str) -> Result<String> {
        Ok(self.entry(sense)?.gloss.clone())
    }

    fn extended_gloss(&self, sense: &str) -> Result<Option<String>> {
        Ok(self.entry(sense)?.extended_gloss.clone())
    }

    fn examples(&self, sense: &str) -> Result<Vec<String>> {
        Ok(self.entry(sense)?.examples.clone())
    }

    fn related_senses(&self, sense: &str) -> Result<Vec<String>> {
        Ok(self.entry(sense)?.relations.clone())
    }

    fn gloss_related_senses(&self, sense: &str) -> Result<Vec<String>> {
        Ok(self.entry(sense)?.gloss_relations.clone())
    }

    fn lemma_names(&self, sense: &str) -> Result<Vec<String>> {
        Ok(self
            .entry(sense)?
            .lemmas
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn lemma_count(&self, sense: &str, word: &str) -> Result<u32> {
        Ok(self
            .entry(sense)?
            .lemmas
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(word))
            .map_or(0, |&(_, count)| count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_graph() {
        let mut graph = MemoryGraph::new();
        graph
            .add_sense(
                "bank.n.01",
                SenseEntry::new(Pos::Noun, "sloping land beside a river")
                    .relation("slope.n.01")
                    .lemma("bank", 25),
            )
            .unwrap();
        graph
            .add_sense(
                "bank.n.02",
                SenseEntry::new(Pos::Noun, "a financial institution")
                    .lemma("bank", 20)
                    .lemma("depository_financial_institution", 0),
            )
            .unwrap();

        assert_eq!(vec!["bank.n.01", "bank.n.02"], graph.senses_of("bank").unwrap());
        assert!(graph.senses_of("river").unwrap().is_empty());
        assert_eq!(Pos::Noun, graph.pos("bank.n.02").unwrap());
        assert_eq!(vec!["slope.n.01"], graph.related_senses("bank.n.01").unwrap());
        assert_eq!(25, graph.lemma_count("bank.n.01", "bank").unwrap());
        assert_eq!(0, graph.lemma_count("bank.n.01", "river").unwrap());
        assert_eq!(None, graph.extended_gloss("bank.n.01").unwrap());
        assert!(graph.gloss("zzz.n.01").unwrap_err().is_missing_key());
    }

    #[test]
    fn test_duplicate_sense() {
        let mut graph = MemoryGraph::new();
        graph
            .add_sense("a.n.01", SenseEntry::new(Pos::Noun, "x"))
            .unwrap();
        let result = graph.add_sense("a.n.01", SenseEntry::new(Pos::Noun, "y"));
        assert!(matches!(result, Err(LexsenseError::Format(_))));
    }
}
