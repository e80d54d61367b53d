//! 品詞タグとレンマキー
//!
//! `word|pos|sense`形式の合成キーは、境界で検証されて
//! 型付きの[`LemmaKey`]に変換されます。

use std::fmt;
use std::str::FromStr;

use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::{LexsenseError, Result};

/// 合成キーの区切り文字
pub const KEY_DELIMITER: char = '|';

/// 語義を持たないことを表すセンチネル
pub const SENTINEL: &str = "*";

/// 品詞
#[derive(
    Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Archive, Serialize, Deserialize,
)]
pub enum Pos {
    /// 名詞 (`n`)
    Noun,
    /// 動詞 (`v`)
    Verb,
    /// 形容詞 (`a`、衛星形容詞`s`を含む)
    Adjective,
    /// 副詞 (`r`)
    Adverb,
    /// 品詞の指定なし (`*`)
    Any,
}

impl Pos {
    /// 語義を持ちうる品詞の一覧
    pub const CONTENT: [Self; 4] = [Self::Noun, Self::Verb, Self::Adjective, Self::Adverb];

    /// 1文字タグから品詞を取得します。
    ///
    /// 未知のタグの場合は`None`を返します。
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "n" => Some(Self::Noun),
            "v" => Some(Self::Verb),
            "a" | "s" => Some(Self::Adjective),
            "r" => Some(Self::Adverb),
            "*" => Some(Self::Any),
            _ => None,
        }
    }

    /// Penn Treebankタグを品詞に変換します。
    ///
    /// 内容語以外のタグ（固有名詞を含む）はすべて[`Pos::Any`]になります。
    pub fn from_penn_tag(tag: &str) -> Self {
        match tag {
            "JJ" | "JJR" | "JJS" => Self::Adjective,
            "NN" | "NNS" => Self::Noun,
            "RB" | "RBR" | "RBS" => Self::Adverb,
            "VB" | "VBD" | "VBG" | "VBN" | "VBP" | "VBZ" => Self::Verb,
            _ => Self::Any,
        }
    }

    /// 1文字タグを返します。
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::Noun => "n",
            Self::Verb => "v",
            Self::Adjective => "a",
            Self::Adverb => "r",
            Self::Any => "*",
        }
    }
}

impl FromStr for Pos {
    type Err = LexsenseError;

    fn from_str(tag: &str) -> Result<Self> {
        Self::from_tag(tag)
            .ok_or_else(|| LexsenseError::invalid_format("pos", format!("unknown POS tag '{tag}'")))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// (単語, 品詞, 語義) の三つ組によるレンマキー
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Archive, Serialize, Deserialize)]
pub struct LemmaKey {
    word: String,
    pos: Pos,
    sense: String,
}

impl LemmaKey {
    /// 新しいキーを作成します。
    ///
    /// # エラー
    ///
    /// 単語または語義が空の場合、あるいは区切り文字や空白を含む場合に
    /// [`FormatError`](crate::errors::FormatError)を返します。
    pub fn new<W, S>(word: W, pos: Pos, sense: S) -> Result<Self>
    where
        W: Into<String>,
        S: Into<String>,
    {
        let word = word.into();
        let sense = sense.into();
        for (name, part) in [("word", &word), ("sense", &sense)] {
            if part.is_empty() {
                return Err(LexsenseError::invalid_format(
                    "lemma key",
                    format!("{name} must not be empty"),
                ));
            }
            if part.contains(KEY_DELIMITER) || part.contains(char::is_whitespace) {
                return Err(LexsenseError::invalid_format(
                    "lemma key",
                    format!("{name} '{part}' contains a delimiter"),
                ));
            }
        }
        Ok(Self { word, pos, sense })
    }

    /// 単語自身を表す自明なキー`word|*|*`を作成します。
    pub fn trivial<W>(word: W) -> Result<Self>
    where
        W: Into<String>,
    {
        Self::new(word, Pos::Any, SENTINEL)
    }

    /// 単語を返します。
    #[inline(always)]
    pub fn word(&self) -> &str {
        &self.word
    }

    /// 品詞を返します。
    #[inline(always)]
    pub const fn pos(&self) -> Pos {
        self.pos
    }

    /// 語義名を返します。
    #[inline(always)]
    pub fn sense(&self) -> &str {
        &self.sense
    }

    /// 語義がセンチネル`*`かどうかを返します。
    #[inline(always)]
    pub fn has_sense(&self) -> bool {
        self.sense != SENTINEL
    }

    /// 品詞別グループに属するキーかどうかを返します。
    #[inline(always)]
    pub fn is_grouped(&self) -> bool {
        self.pos != Pos::Any && self.has_sense()
    }
}

impl FromStr for LemmaKey {
    type Err = LexsenseError;

    fn from_str(key: &str) -> Result<Self> {
        let parts: Vec<&str> = key.split(KEY_DELIMITER).collect();
        let &[word, pos, sense] = parts.as_slice() else {
            return Err(LexsenseError::invalid_format(
                "lemma key",
                format!("'{key}' must consist of exactly word|pos|sense"),
            ));
        };
        Self::new(word, pos.parse()?, sense)
    }
}

impl fmt::Display for LemmaKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{KEY_DELIMITER}{}{KEY_DELIMITER}{}",
            self.word, self.pos, self.sense
        )
    }
}
