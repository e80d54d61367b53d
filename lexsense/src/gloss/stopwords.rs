//! ストップワードと語彙フィルタ
use std::io::{BufRead, BufReader, Read};

use hashbrown::HashSet;

use crate::errors::Result;

/// 同梱の英語ストップワード
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

/// 単語の集合
///
/// ストップワードのリストや、出力を制限する外部語彙として使われます。
#[derive(Clone, Debug, Default)]
pub struct WordSet {
    words: HashSet<String>,
}

impl WordSet {
    /// 単語のリストから集合を作成します。
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// 同梱の英語ストップワードの集合を返します。
    pub fn english_stopwords() -> Self {
        Self::from_words(ENGLISH_STOPWORDS.iter().copied())
    }

    /// 1行1語のリーダーから集合を作成します。
    ///
    /// 各行の最初のフィールドを単語とし、空行は無視します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut words = HashSet::new();
        for line in BufReader::new(rdr).lines() {
            let line = line?;
            if let Some(word) = line.split_whitespace().next() {
                words.insert(word.to_string());
            }
        }
        Ok(Self { words })
    }

    /// 単語を含むかどうかを返します。
    #[inline(always)]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// 単語の数を返します。
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// 集合が空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
