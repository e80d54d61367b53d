//! ユーティリティ関数と型変換トレイトを提供するモジュール
//!
//! 主に以下の機能を提供します：
//!
//! - `FromU32`: u32からの型変換トレイト
//! - テキストレコードの数値フィールドの解析

use std::str::FromStr;

use crate::errors::{LexsenseError, Result};

/// u32から他の型への変換を提供するトレイト
///
/// 標準ライブラリのFromトレイトとは異なり、特定の最適化や
/// プラットフォーム固有の仮定を行うことができます。
pub trait FromU32 {
    /// u32値から実装型を生成する
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

/// レコードの1フィールドを数値として解析する
///
/// 解析に失敗した場合は、フィールド名と行番号を含む
/// [`FormatError`](crate::errors::FormatError)を返します。
///
/// # 引数
///
/// * `arg` - フォーマット名（エラーメッセージ用）
/// * `name` - フィールド名
/// * `field` - 解析する文字列
/// * `line_no` - 1始まりの行番号
pub(crate) fn parse_field<T>(arg: &'static str, name: &str, field: &str, line_no: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    field.parse().map_err(|e: T::Err| {
        LexsenseError::invalid_format(
            arg,
            format!("line {line_no}: invalid {name} '{field}': {e}"),
        )
    })
}
