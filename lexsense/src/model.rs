//! 語義埋め込みモデル
//!
//! このモジュールは、語彙インデックスと埋め込み行列を束ねた読み取り専用の
//! [`Model`]を提供します。
//!
//! # モデルの読み込み方法
//!
//! - [`ModelLoader`]: 学習済みのモデルディレクトリ（`vocab.txt`と4つの交換ファイル）から読み込む
//! - [`Model::from_path`]: コンパイル済みのモデルファイルをメモリマップして読み込む
//! - [`Model::read`]: リーダーからコンパイル済みのモデルを読み込む
//! - [`Model::from_zstd`]: Zstandard圧縮されたモデルファイルを読み込む
pub mod loader;

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use memmap2::Mmap;
use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{
    access, api::serialize_using, ser::allocator::Arena, ser::sharing::Share,
    ser::writer::IoWriter, ser::Serializer, util::with_arena, Archive, Deserialize, Serialize,
};

use crate::embedding::{cosine, Embeddings};
use crate::errors::{LexsenseError, Result};
use crate::vocabulary::{Pos, SenseId, Vocabulary};

pub use crate::model::loader::ModelLoader;

/// コンパイル済みモデルを識別するマジックバイト。
///
/// バージョンはモデルフォーマットのバージョンであり、
/// クレートのセマンティックバージョンからは切り離されています。
pub const MODEL_MAGIC: &[u8] = b"LexsenseModelRkyv 0.1\n";

const MODEL_MAGIC_LEN: usize = MODEL_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize = (RKYV_ALIGNMENT - (MODEL_MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;
const DATA_START: usize = MODEL_MAGIC_LEN + PADDING_LEN;

/// 語義埋め込みモデル。
///
/// 読み込み後は不変で、`Arc`で共有して複数スレッドから同時に参照できます。
#[derive(Archive, Serialize, Deserialize)]
pub struct Model {
    vocabulary: Vocabulary,
    embeddings: Embeddings,
}

impl Model {
    /// 語彙と埋め込み行列から新しいモデルを作成します。
    ///
    /// # エラー
    ///
    /// 行列の行数が名前空間のサイズと一致しない場合に
    /// [`FormatError`](crate::errors::FormatError)を返します。
    pub fn new(vocabulary: Vocabulary, embeddings: Embeddings) -> Result<Self> {
        if embeddings.sense_in().rows() != vocabulary.num_senses() {
            return Err(LexsenseError::invalid_format(
                "embeddings",
                format!(
                    "{} sense rows, but the vocabulary has {} senses",
                    embeddings.sense_in().rows(),
                    vocabulary.num_senses()
                ),
            ));
        }
        if embeddings.selection_weight().rows() != vocabulary.num_lemmas() {
            return Err(LexsenseError::invalid_format(
                "embeddings",
                format!(
                    "{} lemma rows, but the vocabulary has {} lemmas",
                    embeddings.selection_weight().rows(),
                    vocabulary.num_lemmas()
                ),
            ));
        }
        Ok(Self {
            vocabulary,
            embeddings,
        })
    }

    /// 学習済みのモデルディレクトリから読み込みます。
    ///
    /// [`ModelLoader`]で語彙、重みの順に読み込むのと同じです。
    pub fn from_dir<P>(dir: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let mut loader = ModelLoader::new(dir)?;
        loader.load_vocabulary()?;
        loader.load_weights()?;
        loader.finish()
    }

    /// 語彙インデックスを返します。
    #[inline(always)]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// 埋め込み行列を返します。
    #[inline(always)]
    pub fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }

    /// 語義ベクトルの次元を返します。
    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.embeddings.dim()
    }

    /// 語義名または単語名の入力ベクトルを返します。
    ///
    /// # エラー
    ///
    /// 名前が語彙に含まれない場合は[`MissingKeyError`](crate::errors::MissingKeyError)を返します。
    pub fn sense_vector(&self, name: &str) -> Result<&[f32]> {
        let sense_id = self.vocabulary.resolve_sense(name)?;
        Ok(self.embeddings.sense_in().row(sense_id.index()))
    }

    /// 入力ベクトルのコサイン類似度が高い順に、上位`k`個の語義を返します。
    ///
    /// 問い合わせ自身と名前のない行は除外されます。類似度が等しい場合は名前の
    /// 辞書順で並びます。
    ///
    /// # エラー
    ///
    /// 名前が語彙に含まれない場合は[`MissingKeyError`](crate::errors::MissingKeyError)を返します。
    pub fn nearest_senses(&self, name: &str, k: usize) -> Result<Vec<(&str, f64)>> {
        let query_id = self.vocabulary.resolve_sense(name)?;
        let sense_in = self.embeddings.sense_in();
        let query = sense_in.row(query_id.index());

        let mut scored: Vec<(&str, f64)> = (0..self.vocabulary.num_senses())
            .filter(|&i| i != query_id.index())
            .filter_map(|i| {
                let name = self.vocabulary.sense_name(SenseId(i as u32));
                (!name.is_empty()).then(|| (name, cosine(query, sense_in.row(i))))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    /// 2つの単語の候補語義間の最大コサイン類似度を返します。
    ///
    /// 品詞が[`Pos::Any`]の場合は全品詞の語義を候補とします。候補となる語義を
    /// 持たない単語は、単語自身の語義行を候補とします。
    ///
    /// # エラー
    ///
    /// どちらかの単語が語彙に含まれない場合は
    /// [`MissingKeyError`](crate::errors::MissingKeyError)を返します。
    pub fn max_sense_similarity(
        &self,
        word1: &str,
        pos1: Pos,
        word2: &str,
        pos2: Pos,
    ) -> Result<f64> {
        let senses1 = self.candidate_senses(word1, pos1)?;
        let senses2 = self.candidate_senses(word2, pos2)?;
        let sense_in = self.embeddings.sense_in();

        let mut best = f64::NEG_INFINITY;
        for &s1 in &senses1 {
            for &s2 in &senses2 {
                best = best.max(cosine(sense_in.row(s1.index()), sense_in.row(s2.index())));
            }
        }
        Ok(best)
    }

    fn candidate_senses(&self, word: &str, pos: Pos) -> Result<Vec<SenseId>> {
        let word_id = self.vocabulary.resolve(word)?;
        let senses: Vec<SenseId> = self
            .vocabulary
            .pos_groups(word_id)
            .iter()
            .filter(|g| pos == Pos::Any || g.pos() == pos)
            .flat_map(|g| g.lemmas())
            .map(|&l| self.vocabulary.lemma(l).sense_id())
            .collect();
        if senses.is_empty() {
            return Ok(vec![word_id.as_sense()]);
        }
        Ok(senses)
    }

    /// モデルを書き出します。
    ///
    /// この関数の出力は[`Model::read`]、[`Model::from_path`]が期待する形式です。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - 基礎となる`writer`への書き込みに失敗した場合(例: I/Oエラー)。
    /// - `rkyv`シリアライゼーションプロセスでエラーが発生した場合。
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(MODEL_MAGIC)?;

        let padding_bytes = vec![0xFF; PADDING_LEN];
        wtr.write_all(&padding_bytes)?;

        with_arena(|arena: &mut Arena| {
            let writer = IoWriter::new(&mut wtr);
            let mut serializer = Serializer::new(writer, arena.acquire(), Share::new());
            serialize_using::<_, Error>(self, &mut serializer)
        })
        .map_err(|e| LexsenseError::resource("rkyv serialization failed", e.to_string()))?;

        Ok(())
    }

    /// リーダーからモデルを読み込みます。
    ///
    /// すべてのコンテンツをメモリに読み込むため、[`Model::from_path`]よりも
    /// メモリ効率は低くなります。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - データを読み込めない場合。
    /// - マジックナンバーが一致しない、またはコンテンツが無効な場合。
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let mut magic = [0; MODEL_MAGIC_LEN];
        rdr.read_exact(&mut magic)?;
        if &magic[..] != MODEL_MAGIC {
            return Err(LexsenseError::invalid_format(
                "model",
                "The magic number of the input model mismatches.",
            ));
        }

        let mut padding_buf = vec![0; PADDING_LEN];
        rdr.read_exact(&mut padding_buf)?;

        let mut buffer = Vec::new();
        rdr.read_to_end(&mut buffer)?;

        let mut aligned_bytes = AlignedVec::<RKYV_ALIGNMENT>::with_capacity(buffer.len());
        aligned_bytes.extend_from_slice(&buffer);
        Self::from_archive_bytes(&aligned_bytes)
    }

    /// メモリマッピングを使用してファイルパスからモデルを読み込みます。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - ファイルを開けない、または読み込めない場合。
    /// - ファイルが破損している、またはマジックナンバーが一致しない場合。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            LexsenseError::resource(
                format!("Failed to open model file {}", path.display()),
                e.to_string(),
            )
        })?;
        let mmap = unsafe { Mmap::map(&file)? };

        if !mmap.starts_with(MODEL_MAGIC) {
            return Err(LexsenseError::invalid_format(
                "model",
                "The magic number of the input model mismatches.",
            ));
        }
        let Some(data_bytes) = mmap.get(DATA_START..) else {
            return Err(LexsenseError::invalid_format(
                "model",
                "Model file too small or corrupted.",
            ));
        };

        match access::<ArchivedModel, Error>(data_bytes) {
            Ok(archived) => Self::from_archived(archived),
            Err(_) => {
                let mut aligned_bytes = AlignedVec::<RKYV_ALIGNMENT>::with_capacity(data_bytes.len());
                aligned_bytes.extend_from_slice(data_bytes);
                Self::from_archive_bytes(&aligned_bytes)
            }
        }
    }

    /// Zstandard圧縮されたモデルファイルを読み込みます。
    ///
    /// # エラー
    ///
    /// 展開に失敗した場合、および[`Model::read`]と同じ条件でエラーを返します。
    pub fn from_zstd<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            LexsenseError::resource(
                format!("Failed to open model file {}", path.display()),
                e.to_string(),
            )
        })?;
        let decoder = zstd::Decoder::new(file)?;
        Self::read(decoder)
    }

    fn from_archive_bytes(bytes: &[u8]) -> Result<Self> {
        let archived = access::<ArchivedModel, Error>(bytes).map_err(|e| {
            LexsenseError::resource(
                "rkyv validation failed. The model file may be corrupted or incompatible.",
                e.to_string(),
            )
        })?;
        Self::from_archived(archived)
    }

    fn from_archived(archived: &ArchivedModel) -> Result<Self> {
        let mut model: Self = rkyv::deserialize::<Self, Error>(archived)?;
        model.vocabulary.rebuild_indexes();
        let Self {
            vocabulary,
            embeddings,
        } = model;
        let embeddings = embeddings.validated()?;
        Self::new(vocabulary, embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::build_test_model;

    #[test]
    fn test_sense_vector() {
        let model = build_test_model();
        assert_eq!(&[1.0f32, 0.0], model.sense_vector("bank.n.01").unwrap());
        assert_eq!(&[0.0f32, 1.0], model.sense_vector("money").unwrap());
        assert!(model.sense_vector("zzz").unwrap_err().is_missing_key());
    }

    #[test]
    fn test_nearest_senses() {
        let model = build_test_model();
        let nearest = model.nearest_senses("bank.n.02", 2).unwrap();
        assert_eq!(2, nearest.len());
        assert_eq!("money", nearest[0].0);
        assert!((nearest[0].1 - 1.0).abs() < 1e-9);
        assert!(nearest.iter().all(|(name, _)| *name != "bank.n.02"));
    }

    #[test]
    fn test_max_sense_similarity() {
        let model = build_test_model();
        let sim = model
            .max_sense_similarity("bank", Pos::Noun, "money", Pos::Noun)
            .unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
        let sim = model
            .max_sense_similarity("river", Pos::Any, "money", Pos::Any)
            .unwrap();
        assert!(sim.abs() < 1e-9);
        // Any takes every sense of "bank", so bank.n.01 matches river.
        let sim = model
            .max_sense_similarity("bank", Pos::Any, "river", Pos::Any)
            .unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
        let sim = model
            .max_sense_similarity("bank", Pos::Verb, "money", Pos::Any)
            .unwrap();
        assert!((sim - 0.8).abs() < 1e-6);
        // No adverb senses, so the word's own row [0.5, 0.5] is used.
        let sim = model
            .max_sense_similarity("bank", Pos::Adverb, "river", Pos::Noun)
            .unwrap();
        assert!((sim - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(model
            .max_sense_similarity("zzz", Pos::Noun, "money", Pos::Noun)
            .is_err());
    }

    #[test]
    fn test_write_read() {
        let model = build_test_model();
        let mut buf = vec![];
        model.write(&mut buf).unwrap();
        assert!(buf.starts_with(MODEL_MAGIC));

        let reloaded = Model::read(buf.as_slice()).unwrap();
        assert_eq!(model.vocabulary().num_lemmas(), reloaded.vocabulary().num_lemmas());
        assert_eq!(
            model.sense_vector("bank.n.02").unwrap(),
            reloaded.sense_vector("bank.n.02").unwrap()
        );
        let bank = reloaded.vocabulary().resolve("bank").unwrap();
        assert_eq!(
            model.vocabulary().senses(bank, Pos::Noun),
            reloaded.vocabulary().senses(bank, Pos::Noun)
        );
    }

    #[test]
    fn test_read_bad_magic() {
        let data = b"NotALexsenseModel 0.0\n\0\0\0\0\0\0\0\0\0\0";
        let result = Model::read(&data[..]);
        assert!(matches!(result, Err(LexsenseError::Format(_))));
    }

    #[test]
    fn test_from_path_and_zstd() {
        let model = build_test_model();
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("model.lxs");
        model.write(File::create(&path).unwrap()).unwrap();
        let reloaded = Model::from_path(&path).unwrap();
        assert_eq!(
            model.sense_vector("money").unwrap(),
            reloaded.sense_vector("money").unwrap()
        );

        let zstd_path = dir.path().join("model.lxs.zst");
        let mut encoder = zstd::Encoder::new(File::create(&zstd_path).unwrap(), 3).unwrap();
        model.write(&mut encoder).unwrap();
        encoder.finish().unwrap();
        let reloaded = Model::from_zstd(&zstd_path).unwrap();
        assert_eq!(model.vocabulary().num_senses(), reloaded.vocabulary().num_senses());
    }

    #[test]
    fn test_from_path_missing() {
        let result = Model::from_path("/nonexistent/model.lxs");
        assert!(matches!(result, Err(LexsenseError::Resource(_))));
    }
}
