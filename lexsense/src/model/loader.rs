//! 学習済みモデルディレクトリの読み込み
//!
//! モデルディレクトリには以下のファイルが含まれます。
//!
//! | ファイル | 内容 | 索引 |
//! |---------|------|------|
//! | `vocab.txt` | 語彙ファイル | - |
//! | `embedding_in_weight` | 語義の入力ベクトル (`d`次元) | 語義名 |
//! | `embedding_out_weight` | 語義の出力ベクトル (`d`次元) | 語義名 |
//! | `sense_selection_out_weight` | 語義選択層の重み (`3d`次元) | レンマキー |
//! | `sense_selection_out_bias` | 語義選択層のバイアス (1次元) | レンマキー |

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::embedding::{read_exchange, Embeddings, ExchangeFormat, ExchangeStats, Matrix};
use crate::errors::{LexsenseError, Result};
use crate::model::Model;
use crate::vocabulary::Vocabulary;

/// 語彙ファイル名
pub const VOCAB_FILE: &str = "vocab.txt";
/// 語義の入力ベクトルのファイル名
pub const SENSE_IN_FILE: &str = "embedding_in_weight";
/// 語義の出力ベクトルのファイル名
pub const SENSE_OUT_FILE: &str = "embedding_out_weight";
/// 語義選択層の重みのファイル名
pub const SELECTION_WEIGHT_FILE: &str = "sense_selection_out_weight";
/// 語義選択層のバイアスのファイル名
pub const SELECTION_BIAS_FILE: &str = "sense_selection_out_bias";

/// モデルディレクトリのローダー。
///
/// 語彙を先に読み込む必要があります。語彙を読み込む前に重みを読み込もうとすると
/// [`ResourceError`](crate::errors::ResourceError)になります。
///
/// # 例
///
/// ```no_run
/// use lexsense::{ModelLoader, embedding::ExchangeFormat};
///
/// let mut loader = ModelLoader::new("path/to/model")?.format(ExchangeFormat::Text);
/// loader.load_vocabulary()?;
/// loader.load_weights()?;
/// let model = loader.finish()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ModelLoader {
    dir: PathBuf,
    format: ExchangeFormat,
    vocabulary: Option<Vocabulary>,
    embeddings: Option<Embeddings>,
}

impl ModelLoader {
    /// モデルディレクトリを指定してローダーを作成します。
    ///
    /// # エラー
    ///
    /// ディレクトリが存在しない場合は[`ResourceError`](crate::errors::ResourceError)を返します。
    pub fn new<P>(dir: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(LexsenseError::resource(
                "model directory is not found",
                dir.display().to_string(),
            ));
        }
        Ok(Self::detached(dir.to_path_buf()))
    }

    /// ディレクトリを持たないローダーを作成します。
    ///
    /// リーダーから直接読み込む場合に使用します。
    pub fn from_readers() -> Self {
        Self::detached(PathBuf::new())
    }

    fn detached(dir: PathBuf) -> Self {
        Self {
            dir,
            format: ExchangeFormat::default(),
            vocabulary: None,
            embeddings: None,
        }
    }

    /// 交換ファイルの形式を設定します。デフォルトはバイナリ形式です。
    pub fn format(mut self, format: ExchangeFormat) -> Self {
        self.format = format;
        self
    }

    /// ディレクトリから`vocab.txt`を読み込みます。
    pub fn load_vocabulary(&mut self) -> Result<()> {
        let file = self.open(VOCAB_FILE)?;
        self.load_vocabulary_from_reader(file)
    }

    /// リーダーから語彙を読み込みます。
    ///
    /// # エラー
    ///
    /// [`Vocabulary::from_reader`]と同じ条件でエラーを返します。
    pub fn load_vocabulary_from_reader<R>(&mut self, rdr: R) -> Result<()>
    where
        R: Read,
    {
        self.vocabulary = Some(Vocabulary::from_reader(rdr)?);
        self.embeddings = None;
        Ok(())
    }

    /// ディレクトリから4つの重みファイルを読み込みます。
    ///
    /// # エラー
    ///
    /// 語彙が読み込まれていない場合は[`ResourceError`](crate::errors::ResourceError)を、
    /// ファイルが不正な場合や次元が一致しない場合は
    /// [`FormatError`](crate::errors::FormatError)を返します。
    pub fn load_weights(&mut self) -> Result<()> {
        self.require_vocabulary()?;
        let sense_in = self.open(SENSE_IN_FILE)?;
        let sense_out = self.open(SENSE_OUT_FILE)?;
        let selection_weight = self.open(SELECTION_WEIGHT_FILE)?;
        let selection_bias = self.open(SELECTION_BIAS_FILE)?;
        self.load_weights_from_readers(sense_in, sense_out, selection_weight, selection_bias)
    }

    /// リーダーから4つの重みを読み込みます。
    ///
    /// # エラー
    ///
    /// [`ModelLoader::load_weights`]と同じ条件でエラーを返します。
    pub fn load_weights_from_readers<R1, R2, R3, R4>(
        &mut self,
        sense_in: R1,
        sense_out: R2,
        selection_weight: R3,
        selection_bias: R4,
    ) -> Result<()>
    where
        R1: Read,
        R2: Read,
        R3: Read,
        R4: Read,
    {
        let vocab = self.require_vocabulary()?;
        let format = self.format;

        let by_sense = |token: &str| vocab.sense_id(token).map(|id| id.index());
        let by_lemma = |token: &str| vocab.lemma_id_by_name(token).map(|id| id.index());

        let sense_in = load_matrix(SENSE_IN_FILE, sense_in, format, vocab.num_senses(), by_sense)?;
        let sense_out = load_matrix(SENSE_OUT_FILE, sense_out, format, vocab.num_senses(), by_sense)?;
        let selection_weight = load_matrix(
            SELECTION_WEIGHT_FILE,
            selection_weight,
            format,
            vocab.num_lemmas(),
            by_lemma,
        )?;
        let selection_bias = load_matrix(
            SELECTION_BIAS_FILE,
            selection_bias,
            format,
            vocab.num_lemmas(),
            by_lemma,
        )?;

        self.embeddings = Some(Embeddings::new(
            sense_in,
            sense_out,
            selection_weight,
            selection_bias,
        )?);
        Ok(())
    }

    /// 読み込みを完了してモデルを返します。
    ///
    /// # エラー
    ///
    /// 語彙または重みが読み込まれていない場合は
    /// [`ResourceError`](crate::errors::ResourceError)を返します。
    pub fn finish(self) -> Result<Model> {
        let Some(vocabulary) = self.vocabulary else {
            return Err(LexsenseError::resource(
                "the model is not loaded",
                "load_vocabulary must be called first",
            ));
        };
        let Some(embeddings) = self.embeddings else {
            return Err(LexsenseError::resource(
                "the model is not loaded",
                "load_weights must be called before finish",
            ));
        };
        Model::new(vocabulary, embeddings)
    }

    fn require_vocabulary(&self) -> Result<&Vocabulary> {
        self.vocabulary.as_ref().ok_or_else(|| {
            LexsenseError::resource(
                "the vocabulary is not loaded",
                "load_vocabulary must be called before load_weights",
            )
        })
    }

    fn open(&self, name: &str) -> Result<File> {
        let path = self.dir.join(name);
        File::open(&path).map_err(|e| {
            LexsenseError::resource(format!("Failed to open {}", path.display()), e.to_string())
        })
    }
}

fn load_matrix<R, F>(
    name: &str,
    rdr: R,
    format: ExchangeFormat,
    rows: usize,
    lookup: F,
) -> Result<Matrix>
where
    R: Read,
    F: FnMut(&str) -> Option<usize>,
{
    let (matrix, stats) = read_exchange(rdr, format, rows, lookup)?;
    let ExchangeStats {
        entries,
        assigned,
        skipped,
    } = stats;
    log::info!(
        "[lexsense] Loaded {name}: {entries} entries, {assigned} assigned, {skipped} skipped, {} zero rows",
        rows.saturating_sub(assigned)
    );
    Ok(matrix)
}
