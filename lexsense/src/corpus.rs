//! 分割済みコーパスの読み書き
//!
//! コーパスは`<doc>`と`</doc>`の行で文書が区切られ、文書内では1行が1文、
//! トークンは空白区切りです。トークンは`word__pos`の形で品詞を持つことができます。
//!
//! ```text
//! <doc>
//! the__* river__n bank__n was__v muddy__a
//! new__a york__n is__v big__a
//! </doc>
//! ```
use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};

use crate::errors::{LexsenseError, Result};
use crate::segmenter::{join_tokens, CompoundDictionary};
use crate::vocabulary::Pos;

/// 文書の開始行
pub const DOC_START: &str = "<doc>";
/// 文書の終了行
pub const DOC_END: &str = "</doc>";
/// 単語と品詞タグの区切り
pub const TAG_DELIMITER: &str = "__";

/// 品詞タグを持ちうるトークン
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaggedToken {
    word: String,
    pos: Option<Pos>,
}

impl TaggedToken {
    /// 新しいトークンを作成します。
    pub fn new<S>(word: S, pos: Option<Pos>) -> Self
    where
        S: Into<String>,
    {
        Self {
            word: word.into(),
            pos,
        }
    }

    /// `word`または`word__tag`形式のトークンを解析します。
    ///
    /// タグは`n`、`v`、`a`、`r`、`*`のいずれか、またはPenn Treebankタグで、
    /// Penn Treebankタグは[`Pos::from_penn_tag`]で品詞に変換されます。
    /// 最後の`__`の後ろが空の場合はトークン全体を単語とみなします。
    pub fn parse(token: &str) -> Self {
        match token.rsplit_once(TAG_DELIMITER) {
            Some((word, tag)) if !word.is_empty() && !tag.is_empty() => {
                let pos = Pos::from_tag(tag).unwrap_or_else(|| Pos::from_penn_tag(tag));
                Self::new(word, Some(pos))
            }
            _ => Self::new(token, None),
        }
    }

    /// 単語を返します。
    #[inline(always)]
    pub fn word(&self) -> &str {
        &self.word
    }

    /// 品詞を返します。
    #[inline(always)]
    pub fn pos(&self) -> Option<Pos> {
        self.pos
    }
}

impl fmt::Display for TaggedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{}{TAG_DELIMITER}{}", self.word, pos.as_tag()),
            None => write!(f, "{}", self.word),
        }
    }
}

/// 文のリストからなる文書
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Document {
    sentences: Vec<Vec<TaggedToken>>,
}

impl Document {
    /// 空の文書を作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 文を追加します。
    pub fn push_sentence(&mut self, sentence: Vec<TaggedToken>) {
        self.sentences.push(sentence);
    }

    /// 文のスライスを返します。
    #[inline(always)]
    pub fn sentences(&self) -> &[Vec<TaggedToken>] {
        &self.sentences
    }

    /// 品詞タグを除いた単語の列を文ごとに返します。
    ///
    /// 戻り値はそのまま[`Scorer::score_senses`](crate::Scorer::score_senses)の
    /// 文書文脈として渡せます。
    pub fn sentence_words(&self) -> Vec<Vec<&str>> {
        self.sentences
            .iter()
            .map(|s| s.iter().map(TaggedToken::word).collect())
            .collect()
    }

    /// 複合語辞書で各文を分割した文書を返します。
    ///
    /// まとめられたトークンは品詞タグを失い、そのままのトークンはタグを保持します。
    pub fn segment(&self, dict: &CompoundDictionary) -> Self {
        Self {
            sentences: self
                .sentences
                .iter()
                .map(|s| segment_sentence(dict, s))
                .collect(),
        }
    }
}

/// 文書のリストからなるコーパス
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// 文書のリストからコーパスを作成します。
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// 文書のスライスを返します。
    #[inline(always)]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// 文の総数を返します。
    pub fn num_sentences(&self) -> usize {
        self.documents.iter().map(|d| d.sentences.len()).sum()
    }

    /// コーパスを読み込みます。
    ///
    /// 空行は無視されます。
    ///
    /// # エラー
    ///
    /// 文書の外にある文、入れ子の`<doc>`、対応しない`</doc>`、閉じられていない文書が
    /// ある場合は[`FormatError`](crate::errors::FormatError)を返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut documents = vec![];
        let mut current: Option<Document> = None;
        for (i, line) in BufReader::new(rdr).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let line_no = i + 1;
            match line {
                "" => {}
                DOC_START => {
                    if current.is_some() {
                        return Err(corpus_error(line_no, "nested <doc>"));
                    }
                    current = Some(Document::new());
                }
                DOC_END => match current.take() {
                    Some(doc) => documents.push(doc),
                    None => return Err(corpus_error(line_no, "</doc> without <doc>")),
                },
                _ => match current.as_mut() {
                    Some(doc) => doc.push_sentence(parse_sentence(line)),
                    None => return Err(corpus_error(line_no, "sentence outside of a document")),
                },
            }
        }
        if current.is_some() {
            return Err(LexsenseError::invalid_format(
                "corpus",
                "the last document is not closed",
            ));
        }
        Ok(Self { documents })
    }

    /// コーパスを書き出します。
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        for doc in &self.documents {
            writeln!(wtr, "{DOC_START}")?;
            for sentence in &doc.sentences {
                write_sentence(&mut wtr, sentence)?;
            }
            writeln!(wtr, "{DOC_END}")?;
        }
        Ok(())
    }

    /// 複合語辞書ですべての文を分割したコーパスを返します。
    pub fn segment(&self, dict: &CompoundDictionary) -> Self {
        Self {
            documents: self.documents.iter().map(|d| d.segment(dict)).collect(),
        }
    }
}

/// ストリーム分割の統計
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SegmentStats {
    /// 文書の数
    pub documents: usize,
    /// 文の数
    pub sentences: usize,
    /// 入力トークン数
    pub tokens_in: usize,
    /// 出力トークン数
    pub tokens_out: usize,
}

/// コーパスを1行ずつ読み込み、分割して書き出します。
///
/// [`Corpus::from_reader`]と異なり文書構造を検証せず、文書の区切り行はそのまま
/// 出力されます。Penn Treebankタグは1文字の品詞タグに変換されます。
///
/// # 引数
///
/// * `dict` - 複合語辞書
/// * `rdr` - 入力
/// * `wtr` - 出力
///
/// # エラー
///
/// 入出力に失敗した場合にエラーを返します。
pub fn segment_stream<R, W>(dict: &CompoundDictionary, rdr: R, mut wtr: W) -> Result<SegmentStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = SegmentStats::default();
    for line in rdr.lines() {
        let line = line?;
        let line = line.trim();
        match line {
            "" => continue,
            DOC_START => {
                stats.documents += 1;
                writeln!(wtr, "{DOC_START}")?;
            }
            DOC_END => writeln!(wtr, "{DOC_END}")?,
            _ => {
                let sentence = parse_sentence(line);
                let segmented = segment_sentence(dict, &sentence);
                stats.sentences += 1;
                stats.tokens_in += sentence.len();
                stats.tokens_out += segmented.len();
                write_sentence(&mut wtr, &segmented)?;
            }
        }
    }
    wtr.flush()?;
    Ok(stats)
}

fn parse_sentence(line: &str) -> Vec<TaggedToken> {
    line.split_whitespace().map(TaggedToken::parse).collect()
}

fn segment_sentence(dict: &CompoundDictionary, sentence: &[TaggedToken]) -> Vec<TaggedToken> {
    let words: Vec<&str> = sentence.iter().map(TaggedToken::word).collect();
    dict.segment_spans(words.as_slice())
        .into_iter()
        .map(|span| {
            if span.len() == 1 {
                sentence[span.start].clone()
            } else {
                TaggedToken::new(join_tokens(&words[span]), None)
            }
        })
        .collect()
}

fn write_sentence<W>(wtr: &mut W, sentence: &[TaggedToken]) -> Result<()>
where
    W: Write,
{
    for (i, token) in sentence.iter().enumerate() {
        if i != 0 {
            write!(wtr, " ")?;
        }
        write!(wtr, "{token}")?;
    }
    writeln!(wtr)?;
    Ok(())
}

fn corpus_error(line_no: usize, msg: &str) -> LexsenseError {
    LexsenseError::invalid_format("corpus", format!("line {line_no}: {msg}"))
}
