//! 名前空間ごとの識別子
//!
//! 単語、語義、レンマの3つの名前空間はそれぞれ独立した密なID空間を持ちます。
//! 取り違えを防ぐため、各IDは個別の型として表現されます。

use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};

use crate::utils::FromU32;

/// 単語の識別子
#[derive(
    Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Archive, Serialize, Deserialize,
)]
pub struct WordId(pub u32);

impl WordId {
    /// 行インデックスとして返します。
    #[inline(always)]
    pub fn index(self) -> usize {
        usize::from_u32(self.0)
    }

    /// 単語自身を表す自明な語義のIDを返します。
    ///
    /// 語義の名前空間の先頭は単語が占めるため、単語の語義行はWord IDと一致します。
    #[inline(always)]
    pub const fn as_sense(self) -> SenseId {
        SenseId(self.0)
    }
}

/// 語義（シンセット）の識別子
#[derive(
    Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Archive, Serialize, Deserialize,
)]
pub struct SenseId(pub u32);

impl SenseId {
    /// 行インデックスとして返します。
    #[inline(always)]
    pub fn index(self) -> usize {
        usize::from_u32(self.0)
    }
}

/// レンマの識別子
#[derive(
    Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Archive, Serialize, Deserialize,
)]
pub struct LemmaId(pub u32);

impl LemmaId {
    /// 行インデックスとして返します。
    #[inline(always)]
    pub fn index(self) -> usize {
        usize::from_u32(self.0)
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SenseId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LemmaId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
