//! 単語・語義・レンマの語彙インデックス
//!
//! このモジュールは、3つの並行する数値名前空間（単語、語義、レンマ）と、
//! 単語から品詞別のレンマリストへのグルーピングを管理します。
//!
//! 語義の名前空間の先頭`[0, 単語数)`は単語自身が占めます。すなわち単語の
//! 語義行はWord IDと一致し、文脈トークンは単語名とシンセット名のどちらでも
//! 同じ埋め込み行列から引くことができます。
//!
//! # 語彙ファイルの形式
//!
//! ```text
//! <lemmaVocabSize> <senseVocabSize> <wordVocabSize>
//! <totalWords> <totalSentences> <totalDocuments>
//! <word>|<pos>|<sense> <lemmaID> <priorProb> <wordID> <placeholder> <senseID> <placeholder>
//! ...
//! ```
pub mod ids;
pub mod key;

use std::io::{BufRead, BufReader, BufWriter, Read, Write};

use hashbrown::HashMap;
use rkyv::with::Skip;
use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::{LexsenseError, Result};
use crate::utils::{parse_field, FromU32};

pub use crate::vocabulary::ids::{LemmaId, SenseId, WordId};
pub use crate::vocabulary::key::{LemmaKey, Pos};

const FORMAT_NAME: &str = "vocab.txt";
const NUM_RECORD_FIELDS: usize = 7;

/// コーパス全体の統計量
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct CorpusTotals {
    /// 総単語数
    pub words: u64,
    /// 総文数
    pub sentences: u64,
    /// 総文書数
    pub documents: u64,
}

/// 1つのレンマのエントリ
#[derive(Clone, Debug, Archive, Serialize, Deserialize)]
pub struct Lemma {
    key: LemmaKey,
    word_id: WordId,
    sense_id: SenseId,
    prior: f32,
}

impl Lemma {
    /// レンマキーを返します。
    #[inline(always)]
    pub fn key(&self) -> &LemmaKey {
        &self.key
    }

    /// 単語のIDを返します。
    #[inline(always)]
    pub const fn word_id(&self) -> WordId {
        self.word_id
    }

    /// 語義のIDを返します。
    ///
    /// 語義がセンチネル`*`の場合は単語自身の語義行を指します。
    #[inline(always)]
    pub const fn sense_id(&self) -> SenseId {
        self.sense_id
    }

    /// 事前確率を返します。
    #[inline(always)]
    pub const fn prior(&self) -> f32 {
        self.prior
    }
}

/// 単語の品詞別レンマリスト
#[derive(Clone, Debug, Archive, Serialize, Deserialize)]
pub struct PosGroup {
    pos: Pos,
    lemmas: Vec<LemmaId>,
}

impl PosGroup {
    /// 品詞を返します。
    #[inline(always)]
    pub const fn pos(&self) -> Pos {
        self.pos
    }

    /// 語彙ファイルでの出現順に並んだレンマIDを返します。
    #[inline(always)]
    pub fn lemmas(&self) -> &[LemmaId] {
        &self.lemmas
    }
}

/// 語彙インデックス
///
/// 読み込み後は不変です。名前からIDへのハッシュ索引はシリアライズされず、
/// モデルの読み込み時に[`Vocabulary::rebuild_indexes`]で再構築されます。
#[derive(Archive, Serialize, Deserialize)]
pub struct Vocabulary {
    totals: CorpusTotals,
    num_words: u32,

    // Indexed by LemmaId.
    lemmas: Vec<Lemma>,

    // Lemma IDs in the order of the source records.
    order: Vec<LemmaId>,

    // Indexed by SenseId. Words fill [0, num_words); vacant rows are empty.
    sense_names: Vec<String>,

    // Indexed by WordId.
    groups: Vec<Vec<PosGroup>>,

    #[rkyv(with = Skip)]
    word_index: HashMap<String, WordId>,
    #[rkyv(with = Skip)]
    sense_index: HashMap<String, SenseId>,
    #[rkyv(with = Skip)]
    lemma_index: HashMap<LemmaKey, LemmaId>,
}

impl Vocabulary {
    /// 語彙ファイルを読み込みます。
    ///
    /// # 引数
    ///
    /// * `rdr` - 語彙ファイルのリーダー
    ///
    /// # エラー
    ///
    /// 以下の場合に[`FormatError`](crate::errors::FormatError)を返します。
    ///
    /// - ヘッダ行またはレコードが不正な場合
    /// - レンマキーが (単語, 品詞, 語義) に分解できない場合
    /// - IDが宣言された名前空間のサイズを超える場合
    /// - レンマIDまたはレンマキーが重複している場合
    /// - 同じ単語や語義に異なるIDが割り当てられている場合
    /// - レンマ数や単語数がヘッダと一致しない場合
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut lines = BufReader::new(rdr).lines().enumerate();

        let mut next_header = |name: &str| -> Result<(usize, String)> {
            match lines.next() {
                Some((i, line)) => Ok((i + 1, line?)),
                None => Err(LexsenseError::invalid_format(
                    FORMAT_NAME,
                    format!("missing {name} line"),
                )),
            }
        };

        let (line_no, line) = next_header("size header")?;
        let [num_lemmas, num_senses, num_words] =
            parse_header::<u32>(&line, line_no, ["lemmaVocabSize", "senseVocabSize", "wordVocabSize"])?;
        if num_words > num_senses {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!(
                    "wordVocabSize {num_words} must not exceed senseVocabSize {num_senses}"
                ),
            ));
        }

        let (line_no, line) = next_header("totals")?;
        let [words, sentences, documents] =
            parse_header::<u64>(&line, line_no, ["totalWords", "totalSentences", "totalDocuments"])?;

        let mut builder = VocabularyBuilder::new(num_lemmas, num_senses, num_words);
        builder.totals = CorpusTotals {
            words,
            sentences,
            documents,
        };

        for (i, line) in lines {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            builder.push_record(line, i + 1)?;
        }

        let vocab = builder.build()?;
        log::info!(
            "[lexsense] Loaded vocabulary: {} lemmas, {} senses, {} words",
            vocab.num_lemmas(),
            vocab.num_senses(),
            vocab.num_words()
        );
        Ok(vocab)
    }

    /// 語彙を[`Vocabulary::from_reader`]が読み込める形式で書き出します。
    ///
    /// レコードは元の出現順で書き出されるため、読み直したときの
    /// 品詞別グループの順序は保存されます。予約フィールドには`0`と`-1`が
    /// 書き込まれます。
    pub fn write<W>(&self, wtr: W) -> Result<()>
    where
        W: Write,
    {
        let mut wtr = BufWriter::new(wtr);
        writeln!(
            &mut wtr,
            "{} {} {}",
            self.num_lemmas(),
            self.num_senses(),
            self.num_words()
        )?;
        writeln!(
            &mut wtr,
            "{} {} {}",
            self.totals.words, self.totals.sentences, self.totals.documents
        )?;
        for &lemma_id in &self.order {
            let lemma = self.lemma(lemma_id);
            writeln!(
                &mut wtr,
                "{} {} {} {} 0 {} -1",
                lemma.key, lemma_id, lemma.prior, lemma.word_id, lemma.sense_id
            )?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// 名前からIDへの索引を再構築します。
    pub(crate) fn rebuild_indexes(&mut self) {
        self.word_index = self
            .sense_names
            .iter()
            .take(usize::from_u32(self.num_words))
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(i, name)| (name.clone(), WordId(i as u32)))
            .collect();
        self.sense_index = self
            .sense_names
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(i, name)| (name.clone(), SenseId(i as u32)))
            .collect();
        self.lemma_index = self
            .lemmas
            .iter()
            .enumerate()
            .map(|(i, lemma)| (lemma.key.clone(), LemmaId(i as u32)))
            .collect();
    }

    /// 単語をWord IDに解決します。
    ///
    /// # エラー
    ///
    /// 単語が語彙に含まれない場合は[`MissingKeyError`](crate::errors::MissingKeyError)を返します。
    pub fn resolve(&self, word: &str) -> Result<WordId> {
        self.word_id(word)
            .ok_or_else(|| LexsenseError::missing_key("word", word))
    }

    /// 語義名（単語名を含む）を語義IDに解決します。
    ///
    /// # エラー
    ///
    /// 名前が語彙に含まれない場合は[`MissingKeyError`](crate::errors::MissingKeyError)を返します。
    pub fn resolve_sense(&self, name: &str) -> Result<SenseId> {
        self.sense_id(name)
            .ok_or_else(|| LexsenseError::missing_key("sense", name))
    }

    /// 単語のIDを返します。
    #[inline(always)]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_index.get(word).copied()
    }

    /// 語義名または単語名に対応する語義行を返します。
    #[inline(always)]
    pub fn sense_id(&self, name: &str) -> Option<SenseId> {
        self.sense_index.get(name).copied()
    }

    /// レンマキーのIDを返します。
    #[inline(always)]
    pub fn lemma_id(&self, key: &LemmaKey) -> Option<LemmaId> {
        self.lemma_index.get(key).copied()
    }

    /// `word|pos|sense`形式の文字列のレンマIDを返します。
    ///
    /// 文字列がキーとして不正な場合も`None`を返します。
    pub fn lemma_id_by_name(&self, name: &str) -> Option<LemmaId> {
        name.parse::<LemmaKey>()
            .ok()
            .and_then(|key| self.lemma_id(&key))
    }

    /// レンマを返します。
    ///
    /// # パニック
    ///
    /// IDが範囲外の場合にパニックします。
    #[inline(always)]
    pub fn lemma(&self, lemma_id: LemmaId) -> &Lemma {
        &self.lemmas[lemma_id.index()]
    }

    /// 語義行の名前を返します。空の行の場合は空文字列を返します。
    #[inline(always)]
    pub fn sense_name(&self, sense_id: SenseId) -> &str {
        &self.sense_names[sense_id.index()]
    }

    /// 単語の表層形を返します。
    #[inline(always)]
    pub fn word(&self, word_id: WordId) -> &str {
        self.sense_name(word_id.as_sense())
    }

    /// 単語の品詞別グループを返します。
    #[inline(always)]
    pub fn pos_groups(&self, word_id: WordId) -> &[PosGroup] {
        &self.groups[word_id.index()]
    }

    /// 単語と品詞に対応するレンマIDのリストを返します。
    ///
    /// 品詞が[`Pos::Any`]の場合、またはその品詞の語義が登録されていない場合は
    /// `None`を返します。
    pub fn senses(&self, word_id: WordId, pos: Pos) -> Option<&[LemmaId]> {
        self.pos_groups(word_id)
            .iter()
            .find(|g| g.pos == pos)
            .map(|g| g.lemmas.as_slice())
    }

    /// レンマIDを元の出現順で返します。
    pub fn lemma_ids(&self) -> impl Iterator<Item = LemmaId> + '_ {
        self.order.iter().copied()
    }

    /// レンマの名前空間のサイズを返します。
    #[inline(always)]
    pub fn num_lemmas(&self) -> usize {
        self.lemmas.len()
    }

    /// 語義の名前空間のサイズを返します。
    #[inline(always)]
    pub fn num_senses(&self) -> usize {
        self.sense_names.len()
    }

    /// 単語の名前空間のサイズを返します。
    #[inline(always)]
    pub fn num_words(&self) -> usize {
        usize::from_u32(self.num_words)
    }

    /// コーパス統計量を返します。
    #[inline(always)]
    pub const fn totals(&self) -> CorpusTotals {
        self.totals
    }
}

fn parse_header<T>(line: &str, line_no: usize, names: [&str; 3]) -> Result<[T; 3]>
where
    T: std::str::FromStr + Copy + Default,
    T::Err: std::fmt::Display,
{
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != names.len() {
        return Err(LexsenseError::invalid_format(
            FORMAT_NAME,
            format!(
                "line {line_no}: expected {} fields, got {}",
                names.len(),
                fields.len()
            ),
        ));
    }
    let mut values = [T::default(); 3];
    for ((value, name), field) in values.iter_mut().zip(names).zip(fields) {
        *value = parse_field(FORMAT_NAME, name, field, line_no)?;
    }
    Ok(values)
}

/// レコードを1行ずつ検証しながら語彙を構築するビルダー
///
/// ヘッダのサイズは検証が終わるまで信用せず、行は実際に現れたレコードの分だけ保持します。
struct VocabularyBuilder {
    totals: CorpusTotals,
    num_lemmas: u32,
    num_senses: u32,
    num_words: u32,
    lemmas: HashMap<LemmaId, Lemma>,
    order: Vec<LemmaId>,
    sense_rows: HashMap<SenseId, String>,
    groups: HashMap<WordId, Vec<PosGroup>>,
    word_index: HashMap<String, WordId>,
    sense_index: HashMap<String, SenseId>,
    lemma_index: HashMap<LemmaKey, LemmaId>,
}

impl VocabularyBuilder {
    fn new(num_lemmas: u32, num_senses: u32, num_words: u32) -> Self {
        Self {
            totals: CorpusTotals::default(),
            num_lemmas,
            num_senses,
            num_words,
            lemmas: HashMap::new(),
            order: vec![],
            sense_rows: HashMap::new(),
            groups: HashMap::new(),
            word_index: HashMap::new(),
            sense_index: HashMap::new(),
            lemma_index: HashMap::new(),
        }
    }

    fn push_record(&mut self, line: &str, line_no: usize) -> Result<()> {
        let fields: Vec<&str> = line.split(' ').filter(|f| !f.is_empty()).collect();
        if fields.len() != NUM_RECORD_FIELDS {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!(
                    "line {line_no}: expected {NUM_RECORD_FIELDS} fields, got {}",
                    fields.len()
                ),
            ));
        }

        let key: LemmaKey = fields[0].parse().map_err(|e| {
            LexsenseError::invalid_format(FORMAT_NAME, format!("line {line_no}: {e}"))
        })?;
        let lemma_id = LemmaId(parse_field(FORMAT_NAME, "lemmaID", fields[1], line_no)?);
        let prior: f32 = parse_field(FORMAT_NAME, "priorProb", fields[2], line_no)?;
        let word_id = WordId(parse_field(FORMAT_NAME, "wordID", fields[3], line_no)?);
        // fields[4] and fields[6] are reserved.
        let raw_sense_id: i64 = parse_field(FORMAT_NAME, "senseID", fields[5], line_no)?;

        if !prior.is_finite() || prior < 0.0 {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!("line {line_no}: invalid prior probability {prior}"),
            ));
        }
        if lemma_id.0 >= self.num_lemmas {
            return Err(out_of_range(line_no, "lemmaID", lemma_id.0, self.num_lemmas));
        }
        if self.lemmas.contains_key(&lemma_id) {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!("line {line_no}: duplicate lemmaID {lemma_id}"),
            ));
        }
        if self.lemma_index.contains_key(&key) {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!("line {line_no}: duplicate lemma key {key}"),
            ));
        }

        let word_id = self.register_word(key.word(), word_id, line_no)?;
        let sense_id = if key.has_sense() {
            let sense_id = u32::try_from(raw_sense_id)
                .map_err(|_| out_of_range(line_no, "senseID", raw_sense_id, self.num_senses))?;
            self.register_sense(key.sense(), SenseId(sense_id), line_no)?
        } else {
            word_id.as_sense()
        };

        if key.is_grouped() {
            let groups = self.groups.entry(word_id).or_default();
            match groups.iter_mut().find(|g| g.pos == key.pos()) {
                Some(group) => group.lemmas.push(lemma_id),
                None => groups.push(PosGroup {
                    pos: key.pos(),
                    lemmas: vec![lemma_id],
                }),
            }
        }

        self.lemma_index.insert(key.clone(), lemma_id);
        self.order.push(lemma_id);
        self.lemmas.insert(
            lemma_id,
            Lemma {
                key,
                word_id,
                sense_id,
                prior,
            },
        );
        Ok(())
    }

    fn register_word(&mut self, word: &str, word_id: WordId, line_no: usize) -> Result<WordId> {
        if let Some(&known) = self.word_index.get(word) {
            if known != word_id {
                return Err(LexsenseError::invalid_format(
                    FORMAT_NAME,
                    format!("line {line_no}: word '{word}' has IDs {known} and {word_id}"),
                ));
            }
            return Ok(known);
        }
        if word_id.0 >= self.num_words {
            return Err(out_of_range(line_no, "wordID", word_id.0, self.num_words));
        }
        self.claim_row(word, word_id.as_sense(), line_no)?;
        self.word_index.insert(word.to_string(), word_id);
        Ok(word_id)
    }

    fn register_sense(&mut self, name: &str, sense_id: SenseId, line_no: usize) -> Result<SenseId> {
        if let Some(&known) = self.sense_index.get(name) {
            if known != sense_id {
                return Err(LexsenseError::invalid_format(
                    FORMAT_NAME,
                    format!("line {line_no}: sense '{name}' has IDs {known} and {sense_id}"),
                ));
            }
            return Ok(known);
        }
        if sense_id.0 >= self.num_senses {
            return Err(out_of_range(line_no, "senseID", sense_id.0, self.num_senses));
        }
        self.claim_row(name, sense_id, line_no)?;
        Ok(sense_id)
    }

    fn claim_row(&mut self, name: &str, sense_id: SenseId, line_no: usize) -> Result<()> {
        if let Some(slot) = self.sense_rows.get(&sense_id) {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!(
                    "line {line_no}: sense row {sense_id} is claimed by both '{slot}' and '{name}'"
                ),
            ));
        }
        if self.sense_index.contains_key(name) {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!("line {line_no}: '{name}' is used both as a word and as a sense"),
            ));
        }
        self.sense_rows.insert(sense_id, name.to_string());
        self.sense_index.insert(name.to_string(), sense_id);
        Ok(())
    }

    fn build(self) -> Result<Vocabulary> {
        if self.lemmas.len() != usize::from_u32(self.num_lemmas) {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!(
                    "lemmaVocabSize is {}, but {} lemma records are given",
                    self.num_lemmas,
                    self.lemmas.len()
                ),
            ));
        }
        if self.word_index.len() != usize::from_u32(self.num_words) {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!(
                    "wordVocabSize is {}, but {} distinct words are given",
                    self.num_words,
                    self.word_index.len()
                ),
            ));
        }
        // A record claims at most a word row and a sense row.
        if u64::from(self.num_senses) > 2 * u64::from(self.num_lemmas) {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!(
                    "senseVocabSize {} cannot be covered by {} lemma records",
                    self.num_senses, self.num_lemmas
                ),
            ));
        }
        let vacant = usize::from_u32(self.num_senses) - self.sense_rows.len();
        if vacant != 0 {
            log::warn!("[lexsense] {vacant} sense rows have no name in the vocabulary");
        }

        let mut lemmas: Vec<(LemmaId, Lemma)> = self.lemmas.into_iter().collect();
        lemmas.sort_unstable_by_key(|&(lemma_id, _)| lemma_id);
        let lemmas = lemmas.into_iter().map(|(_, lemma)| lemma).collect();

        let mut sense_names = vec![String::new(); usize::from_u32(self.num_senses)];
        for (sense_id, name) in self.sense_rows {
            sense_names[sense_id.index()] = name;
        }
        let mut groups = vec![vec![]; usize::from_u32(self.num_words)];
        for (word_id, word_groups) in self.groups {
            groups[word_id.index()] = word_groups;
        }

        Ok(Vocabulary {
            totals: self.totals,
            num_words: self.num_words,
            lemmas,
            order: self.order,
            sense_names,
            groups,
            word_index: self.word_index,
            sense_index: self.sense_index,
            lemma_index: self.lemma_index,
        })
    }
}

fn out_of_range<T>(line_no: usize, name: &str, id: T, size: u32) -> LexsenseError
where
    T: std::fmt::Display,
{
    LexsenseError::invalid_format(
        FORMAT_NAME,
        format!("line {line_no}: {name} {id} is out of range (size {size})"),
    )
}
