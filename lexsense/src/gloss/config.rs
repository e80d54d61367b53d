//! 定義文グラフの重み付けパイプラインの設定
use std::io::{BufRead, BufReader, Read};
use std::str::FromStr;

use crate::errors::{LexsenseError, Result};
use crate::utils::parse_field;

/// 重み付けパイプラインの設定。
///
/// 各項目は同名のセッターで変更できます。
///
/// ```
/// use lexsense::gloss::GlossConfig;
///
/// let config = GlossConfig::new()
///     .expansion_depth(3)
///     .use_gloss_disambiguation_relation(false);
/// assert_eq!(3, config.get_expansion_depth());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GlossConfig {
    pub(crate) use_extended_gloss_source: bool,
    pub(crate) use_gloss_disambiguation_relation: bool,
    pub(crate) exclude_synset_lemmas: bool,
    pub(crate) use_prior_in_scoring: bool,
    pub(crate) expansion_depth: usize,
    pub(crate) top_k: usize,
    pub(crate) min_group_words: usize,
    pub(crate) num_threads: usize,
}

impl Default for GlossConfig {
    fn default() -> Self {
        Self {
            use_extended_gloss_source: false,
            use_gloss_disambiguation_relation: true,
            exclude_synset_lemmas: true,
            use_prior_in_scoring: false,
            expansion_depth: 2,
            top_k: 25,
            min_group_words: 3,
            num_threads: 1,
        }
    }
}

impl GlossConfig {
    /// デフォルトの設定を作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 拡張定義文が得られる場合に、通常の定義文の代わりに使うかどうか。
    pub fn use_extended_gloss_source(mut self, yes: bool) -> Self {
        self.use_extended_gloss_source = yes;
        self
    }

    /// 定義文の語義曖昧性解消による関係を展開に含めるかどうか。
    pub fn use_gloss_disambiguation_relation(mut self, yes: bool) -> Self {
        self.use_gloss_disambiguation_relation = yes;
        self
    }

    /// 語義自身のレンマ名と対象語を出力から除くかどうか。
    pub fn exclude_synset_lemmas(mut self, yes: bool) -> Self {
        self.exclude_synset_lemmas = yes;
        self
    }

    /// 出力された語義を使うスコアリングで事前確率を使うかどうか。
    pub fn use_prior_in_scoring(mut self, yes: bool) -> Self {
        self.use_prior_in_scoring = yes;
        self
    }

    /// 関係グラフを展開するホップ数。
    pub fn expansion_depth(mut self, depth: usize) -> Self {
        self.expansion_depth = depth;
        self
    }

    /// 語義ごとに出力する単語の最大数。
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    /// 語義を出力するために必要な単語の最小数。
    pub fn min_group_words(mut self, n: usize) -> Self {
        self.min_group_words = n;
        self
    }

    /// ワーカースレッドの数。0は1とみなします。
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = n;
        self
    }

    /// 関係グラフを展開するホップ数を返します。
    pub fn get_expansion_depth(&self) -> usize {
        self.expansion_depth
    }

    /// スコアリングで事前確率を使うかどうかを返します。
    pub fn get_use_prior_in_scoring(&self) -> bool {
        self.use_prior_in_scoring
    }

    /// `key value`形式の設定ファイルを読み込みます。
    ///
    /// `#`で始まる行と空行は無視され、書かれていない項目はデフォルト値になります。
    ///
    /// ```text
    /// # gloss.def
    /// use_extended_gloss_source true
    /// expansion_depth 2
    /// ```
    ///
    /// # エラー
    ///
    /// 未知のキーや不正な値がある場合は
    /// [`FormatError`](crate::errors::FormatError)を返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut config = Self::default();
        for (i, line) in BufReader::new(rdr).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line_no = i + 1;

            let mut spl = line.split_ascii_whitespace();
            let (Some(key), Some(value), None) = (spl.next(), spl.next(), spl.next()) else {
                return Err(LexsenseError::invalid_format(
                    "gloss.def",
                    format!("line {line_no}: expected `key value`"),
                ));
            };
            match key {
                "use_extended_gloss_source" => {
                    config.use_extended_gloss_source = parse_value(key, value, line_no)?;
                }
                "use_gloss_disambiguation_relation" => {
                    config.use_gloss_disambiguation_relation = parse_value(key, value, line_no)?;
                }
                "exclude_synset_lemmas" => {
                    config.exclude_synset_lemmas = parse_value(key, value, line_no)?;
                }
                "use_prior_in_scoring" => {
                    config.use_prior_in_scoring = parse_value(key, value, line_no)?;
                }
                "expansion_depth" => config.expansion_depth = parse_value(key, value, line_no)?,
                "top_k" => config.top_k = parse_value(key, value, line_no)?,
                "min_group_words" => config.min_group_words = parse_value(key, value, line_no)?,
                "num_threads" => config.num_threads = parse_value(key, value, line_no)?,
                _ => {
                    return Err(LexsenseError::invalid_format(
                        "gloss.def",
                        format!("line {line_no}: unknown key {key}"),
                    ));
                }
            }
        }
        Ok(config)
    }
}

fn parse_value<T>(key: &str, value: &str, line_no: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_field("gloss.def", key, value, line_no)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = GlossConfig::default();
        assert_eq!(2, config.expansion_depth);
        assert_eq!(25, config.top_k);
        assert_eq!(3, config.min_group_words);
        assert!(config.use_gloss_disambiguation_relation);
        assert!(!config.use_prior_in_scoring);
    }

    #[test]
    fn test_from_reader() {
        let def = "\
# comment
use_extended_gloss_source true

exclude_synset_lemmas false
expansion_depth 3
num_threads 4
";
        let config = GlossConfig::from_reader(def.as_bytes()).unwrap();
        assert_eq!(
            GlossConfig::new()
                .use_extended_gloss_source(true)
                .exclude_synset_lemmas(false)
                .expansion_depth(3)
                .num_threads(4),
            config
        );
    }

    #[test]
    fn test_from_reader_invalid() {
        for def in [
            "unknown_key 1\n",
            "expansion_depth two\n",
            "use_prior_in_scoring\n",
            "top_k 5 6\n",
        ] {
            let result = GlossConfig::from_reader(def.as_bytes());
            assert!(matches!(result, Err(LexsenseError::Format(_))), "{def}");
        }
    }
}
