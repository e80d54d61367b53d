//! 複合語の最長一致による分割
//!
//! `new_york_city`のように`_`で連結された複合語の辞書を使い、トークン列の中で
//! 連続する複数のトークンを1つの語彙項目にまとめます。
//!
//! # 例
//!
//! ```
//! use lexsense::CompoundDictionary;
//!
//! let dict = CompoundDictionary::from_entries(["new_york", "new_york_city"])?;
//! let tokens = ["new", "york", "city", "is", "big"];
//! assert_eq!(vec!["new_york_city", "is", "big"], dict.segment(&tokens));
//! # Ok::<(), lexsense::errors::LexsenseError>(())
//! ```
mod trie;

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Read};
use std::ops::Range;

use crate::errors::{LexsenseError, Result};
use crate::segmenter::trie::Trie;

/// 複合語の構成トークンを連結する区切り文字
pub const COMPOUND_DELIMITER: char = '_';

/// 複合語辞書
pub struct CompoundDictionary {
    trie: Option<Trie>,
    entries: Vec<String>,
    max_span: usize,
}

impl CompoundDictionary {
    /// 複合語のリストから辞書を構築します。
    ///
    /// 1トークンだけの項目は`max_span`の計算にのみ使われます。
    ///
    /// # 引数
    ///
    /// * `entries` - `_`で連結された複合語
    ///
    /// # エラー
    ///
    /// 空の構成トークンを含む項目（例: `new__york`）や空白を含む項目がある場合、
    /// [`FormatError`](crate::errors::FormatError)を返します。
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut max_span = 1;
        let mut compounds = BTreeSet::new();
        for entry in entries {
            let entry = entry.as_ref();
            let span = validate_entry(entry)?;
            max_span = max_span.max(span);
            if span > 1 {
                compounds.insert(entry.to_string());
            }
        }

        let entries: Vec<String> = compounds.into_iter().collect();
        let trie = if entries.is_empty() {
            None
        } else {
            let mut records = Vec::with_capacity(entries.len());
            for (i, entry) in entries.iter().enumerate() {
                records.push((entry, u32::try_from(i)?));
            }
            Some(Trie::from_records(&records)?)
        };

        Ok(Self {
            trie,
            entries,
            max_span,
        })
    }

    /// 1行1項目のリーダーから辞書を構築します。
    ///
    /// 空行は無視されます。
    ///
    /// # エラー
    ///
    /// 読み込みに失敗した場合、または[`CompoundDictionary::from_entries`]と同じ条件で
    /// エラーを返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut entries = vec![];
        for line in BufReader::new(rdr).lines() {
            let line = line?;
            let entry = line.trim();
            if !entry.is_empty() {
                entries.push(entry.to_string());
            }
        }
        let dict = Self::from_entries(&entries)?;
        log::info!(
            "[lexsense] Loaded {} compound entries (max span {})",
            dict.num_entries(),
            dict.max_span
        );
        Ok(dict)
    }

    /// 項目の最大トークン数を返します。1以上です。
    #[inline(always)]
    pub fn max_span(&self) -> usize {
        self.max_span
    }

    /// 複数トークンからなる項目の数を返します。
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// 複合語を含むかどうかを返します。
    pub fn contains(&self, entry: &str) -> bool {
        self.entries
            .binary_search_by(|e| e.as_str().cmp(entry))
            .is_ok()
    }

    /// トークン列を左から右へ1回走査し、複合語をまとめます。
    ///
    /// 各位置で最大`max_span`個のトークンを`_`で連結し、その接頭辞になっている
    /// 項目のうち最長のものを1トークンとして出力します。一致は連結文字列の
    /// トークン境界で終わる必要があります。一致がなければトークンをそのまま出力します。
    ///
    /// # 戻り値
    ///
    /// 入力より長くならないトークン列
    pub fn segment<S>(&self, tokens: &[S]) -> Vec<String>
    where
        S: AsRef<str>,
    {
        let mut output = Vec::with_capacity(tokens.len());
        let mut chars = vec![];
        let mut boundaries = vec![];
        let mut i = 0;
        while i < tokens.len() {
            match self.longest_match(&tokens[i..], &mut chars, &mut boundaries) {
                Some((len, entry)) => {
                    output.push(entry.to_string());
                    i += len;
                }
                None => {
                    output.push(tokens[i].as_ref().to_string());
                    i += 1;
                }
            }
        }
        output
    }

    /// [`CompoundDictionary::segment`]と同じ走査を行い、出力トークンごとに
    /// 消費した入力トークンの範囲を返します。
    ///
    /// 範囲は重なりなく入力全体を順に覆います。
    pub fn segment_spans<S>(&self, tokens: &[S]) -> Vec<Range<usize>>
    where
        S: AsRef<str>,
    {
        let mut spans = Vec::with_capacity(tokens.len());
        let mut chars = vec![];
        let mut boundaries = vec![];
        let mut i = 0;
        while i < tokens.len() {
            let len = self
                .longest_match(&tokens[i..], &mut chars, &mut boundaries)
                .map_or(1, |(len, _)| len);
            spans.push(i..i + len);
            i += len;
        }
        spans
    }

    /// `tokens`の先頭で一致する最長の項目と、それが消費するトークン数を返します。
    fn longest_match<S>(
        &self,
        tokens: &[S],
        chars: &mut Vec<char>,
        boundaries: &mut Vec<usize>,
    ) -> Option<(usize, &str)>
    where
        S: AsRef<str>,
    {
        let trie = self.trie.as_ref()?;

        chars.clear();
        boundaries.clear();
        for (k, token) in tokens.iter().take(self.max_span).enumerate() {
            if k != 0 {
                chars.push(COMPOUND_DELIMITER);
            }
            chars.extend(token.as_ref().chars());
            boundaries.push(chars.len());
        }

        let mut best = None;
        for m in trie.common_prefix_iterator(chars.as_slice()) {
            // Partial tokens never match.
            if let Ok(k) = boundaries.binary_search(&m.end_char) {
                best = best.max(Some((k + 1, m.value)));
            }
        }
        best.map(|(len, value)| (len, self.entries[value as usize].as_str()))
    }
}

/// トークンを`_`で連結します。
pub fn join_tokens<S>(tokens: &[S]) -> String
where
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (k, token) in tokens.iter().enumerate() {
        if k != 0 {
            joined.push(COMPOUND_DELIMITER);
        }
        joined.push_str(token.as_ref());
    }
    joined
}

fn validate_entry(entry: &str) -> Result<usize> {
    if entry.is_empty() || entry.contains(char::is_whitespace) {
        return Err(LexsenseError::invalid_format(
            "compound",
            format!("invalid compound entry: {entry:?}"),
        ));
    }
    let mut span = 0;
    for part in entry.split(COMPOUND_DELIMITER) {
        if part.is_empty() {
            return Err(LexsenseError::invalid_format(
                "compound",
                format!("empty token in compound entry: {entry}"),
            ));
        }
        span += 1;
    }
    Ok(span)
}
