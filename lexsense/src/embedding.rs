//! 密な埋め込み行列
//!
//! 語義の入力・出力ベクトル（語義の名前空間で索引）と、語義選択層の
//! 重み・バイアス（レンマの名前空間で索引）の4つの行列を保持します。
pub mod exchange;

use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::{LexsenseError, Result};

pub use crate::embedding::exchange::{read_exchange, write_exchange, ExchangeFormat, ExchangeStats};

/// 行優先の密行列
#[derive(Clone, Debug, PartialEq, Archive, Serialize, Deserialize)]
pub struct Matrix {
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// ゼロで初期化された行列を作成します。
    ///
    /// # パニック
    ///
    /// `cols`が0の場合にパニックします。
    pub fn zeros(rows: usize, cols: usize) -> Self {
        assert!(cols != 0, "cols must be positive");
        Self {
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// 要素数を検証してゼロで初期化された行列を作成します。
    ///
    /// 行数や列数が外部の入力に由来する場合に使用します。
    ///
    /// # エラー
    ///
    /// `cols`が0の場合、または要素数のバイト長がアドレス空間を超える場合に
    /// [`FormatError`](crate::errors::FormatError)を返します。
    pub fn try_zeros(rows: usize, cols: usize) -> Result<Self> {
        if cols == 0 {
            return Err(LexsenseError::invalid_format("matrix", "cols must be positive"));
        }
        let len = rows
            .checked_mul(cols)
            .filter(|&len| len <= isize::MAX as usize / std::mem::size_of::<f32>())
            .ok_or_else(|| {
                LexsenseError::invalid_format(
                    "matrix",
                    format!("{rows} x {cols} elements exceed the address space"),
                )
            })?;
        Ok(Self {
            cols,
            data: vec![0.0; len],
        })
    }

    /// 行数を返します。
    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.data.len() / self.cols()
    }

    /// 列数を返します。
    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// 行を返します。
    #[inline(always)]
    pub fn row(&self, i: usize) -> &[f32] {
        let cols = self.cols();
        &self.data[i * cols..(i + 1) * cols]
    }

    /// 行を可変参照で返します。
    #[inline(always)]
    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let cols = self.cols();
        &mut self.data[i * cols..(i + 1) * cols]
    }
}

/// モデルの4つの埋め込み行列
#[derive(Clone, Debug, Archive, Serialize, Deserialize)]
pub struct Embeddings {
    sense_in: Matrix,
    sense_out: Matrix,
    selection_weight: Matrix,
    selection_bias: Matrix,
}

impl Embeddings {
    /// 次元を検証して新しいインスタンスを作成します。
    ///
    /// # エラー
    ///
    /// 入力・出力ベクトルの次元`d`が一致しない場合、選択層の重みの列数が`3d`でない場合、
    /// バイアスの列数が1でない場合、または行数が互いに一致しない場合に
    /// [`FormatError`](crate::errors::FormatError)を返します。
    pub fn new(
        sense_in: Matrix,
        sense_out: Matrix,
        selection_weight: Matrix,
        selection_bias: Matrix,
    ) -> Result<Self> {
        let dim = sense_in.cols();
        if sense_out.cols() != dim {
            return Err(LexsenseError::invalid_format(
                "embedding_out_weight",
                format!("dimension {} differs from {dim}", sense_out.cols()),
            ));
        }
        if selection_weight.cols() != 3 * dim {
            return Err(LexsenseError::invalid_format(
                "sense_selection_out_weight",
                format!("dimension {} must be {}", selection_weight.cols(), 3 * dim),
            ));
        }
        if selection_bias.cols() != 1 {
            return Err(LexsenseError::invalid_format(
                "sense_selection_out_bias",
                format!("dimension {} must be 1", selection_bias.cols()),
            ));
        }
        if sense_in.rows() != sense_out.rows() || selection_weight.rows() != selection_bias.rows() {
            return Err(LexsenseError::invalid_format(
                "embeddings",
                "row counts of the matrices are inconsistent",
            ));
        }
        Ok(Self {
            sense_in,
            sense_out,
            selection_weight,
            selection_bias,
        })
    }

    /// アーカイブから復元した行列の形状を検証します。
    pub(crate) fn validated(self) -> Result<Self> {
        for m in [&self.sense_in, &self.sense_out, &self.selection_weight, &self.selection_bias] {
            if m.cols == 0 || m.data.len() % m.cols != 0 {
                return Err(LexsenseError::invalid_format(
                    "embeddings",
                    "matrix shape is corrupted",
                ));
            }
        }
        Self::new(
            self.sense_in,
            self.sense_out,
            self.selection_weight,
            self.selection_bias,
        )
    }

    /// 語義ベクトルの次元を返します。
    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.sense_in.cols()
    }

    /// 語義の入力ベクトルを返します。
    #[inline(always)]
    pub fn sense_in(&self) -> &Matrix {
        &self.sense_in
    }

    /// 語義の出力ベクトルを返します。
    #[inline(always)]
    pub fn sense_out(&self) -> &Matrix {
        &self.sense_out
    }

    /// 語義選択層の重みを返します。
    #[inline(always)]
    pub fn selection_weight(&self) -> &Matrix {
        &self.selection_weight
    }

    /// 語義選択層のバイアスを返します。
    #[inline(always)]
    pub fn selection_bias(&self, lemma: usize) -> f32 {
        self.selection_bias.row(lemma)[0]
    }
}

/// 内積を計算します。
#[inline(always)]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

/// コサイン類似度を計算します。
///
/// どちらかがゼロベクトルの場合は0を返します。
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let norm = dot(a, a).sqrt() * dot(b, b).sqrt();
    if norm == 0.0 {
        0.0
    } else {
        dot(a, b) / norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_zeros() {
        assert_eq!(Matrix::zeros(2, 3), Matrix::try_zeros(2, 3).unwrap());
        assert!(matches!(
            Matrix::try_zeros(2, 0),
            Err(LexsenseError::Format(_))
        ));
        assert!(matches!(
            Matrix::try_zeros(3, usize::MAX / 2),
            Err(LexsenseError::Format(_))
        ));
        assert!(matches!(
            Matrix::try_zeros(1, isize::MAX as usize),
            Err(LexsenseError::Format(_))
        ));
    }

    #[test]
    fn test_matrix_rows() {
        let mut m = Matrix::zeros(3, 2);
        m.row_mut(1).copy_from_slice(&[1.0, 2.0]);
        assert_eq!(3, m.rows());
        assert_eq!(&[0.0f32, 0.0], m.row(0));
        assert_eq!(&[1.0f32, 2.0], m.row(1));
    }

    #[test]
    fn test_dimension_check() {
        let ok = Embeddings::new(
            Matrix::zeros(4, 2),
            Matrix::zeros(4, 2),
            Matrix::zeros(3, 6),
            Matrix::zeros(3, 1),
        );
        assert_eq!(2, ok.unwrap().dim());

        let bad = Embeddings::new(
            Matrix::zeros(4, 2),
            Matrix::zeros(4, 2),
            Matrix::zeros(3, 4),
            Matrix::zeros(3, 1),
        );
        assert!(matches!(bad, Err(LexsenseError::Format(_))));

        let bad = Embeddings::new(
            Matrix::zeros(4, 2),
            Matrix::zeros(4, 3),
            Matrix::zeros(3, 6),
            Matrix::zeros(3, 1),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_cosine() {
        assert!((cosine(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-12);
        assert_eq!(0.0, cosine(&[0.0, 0.0], &[1.0, 1.0]));
    }
}
