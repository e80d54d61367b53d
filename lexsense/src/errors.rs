//! エラー型の定義
//!
//! このモジュールは、lexsenseライブラリで使用されるすべてのエラー型を定義します。

use std::error::Error;
use std::fmt;

/// lexsense専用のResult型
///
/// エラー型としてデフォルトで[`LexsenseError`]を使用します。
pub type Result<T, E = LexsenseError> = std::result::Result<T, E>;

/// lexsenseのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// 各バリアントは特定のエラー条件に対応しています。
#[derive(Debug, thiserror::Error)]
pub enum LexsenseError {
    /// 無効なフォーマットエラー
    ///
    /// [`FormatError`]のエラーバリアント。語彙ファイルや重みファイルの
    /// レコードが不正な場合に発生します。
    #[error(transparent)]
    Format(FormatError),

    /// キー欠落エラー
    ///
    /// [`MissingKeyError`]のエラーバリアント。存在が必須の単語、語義、
    /// レンマが語彙に含まれていない場合に発生します。
    #[error(transparent)]
    MissingKey(MissingKeyError),

    /// リソースエラー
    ///
    /// [`ResourceError`]のエラーバリアント。必要な順序に反して操作が
    /// 呼び出された場合や、モデルディレクトリが存在しない場合に発生します。
    #[error(transparent)]
    Resource(ResourceError),

    /// 整数変換エラー
    ///
    /// [`TryFromIntError`](std::num::TryFromIntError)のエラーバリアント。
    #[error(transparent)]
    TryFromInt(std::num::TryFromIntError),

    /// UTF-8エンコーディングエラー
    ///
    /// [`std::str::Utf8Error`]のエラーバリアント。
    #[error(transparent)]
    Utf8(std::str::Utf8Error),

    /// バックグラウンドスレッドパニックエラー
    ///
    /// ワーカースレッドがパニックした場合に発生します。
    #[error("Worker thread panicked: {0}")]
    ThreadPanic(String),

    /// I/Oエラー
    ///
    /// [`std::io::Error`]のエラーバリアント。
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// rkyvシリアライゼーションエラー
    ///
    /// [`rkyv::rancor::Error`]のエラーバリアント。
    #[error(transparent)]
    RkyvError(#[from] rkyv::rancor::Error),
}

impl LexsenseError {
    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Format(FormatError {
            arg,
            msg: msg.into(),
        })
    }

    /// キー欠落エラーを生成します
    ///
    /// # 引数
    ///
    /// * `namespace` - 検索した名前空間の名前
    /// * `key` - 見つからなかったキー
    pub(crate) fn missing_key<S>(namespace: &'static str, key: S) -> Self
    where
        S: Into<String>,
    {
        Self::MissingKey(MissingKeyError {
            namespace,
            key: key.into(),
        })
    }

    /// リソースエラーを生成します
    ///
    /// # 引数
    ///
    /// * `msg` - エラーメッセージ
    /// * `cause` - エラーの原因
    pub(crate) fn resource<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::Resource(ResourceError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }

    /// このエラーが[`MissingKeyError`]かどうかを返します。
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey(_))
    }
}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct FormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for FormatError {}

/// 必須のキーが見つからない場合に使用されるエラー
#[derive(Debug)]
pub struct MissingKeyError {
    /// 名前空間の名前
    pub(crate) namespace: &'static str,

    /// 見つからなかったキー
    pub(crate) key: String,
}

impl MissingKeyError {
    /// 見つからなかったキーを返します。
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for MissingKeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MissingKeyError: {} is not found in the {} namespace",
            self.key, self.namespace
        )
    }
}

impl Error for MissingKeyError {}

/// リソースの状態が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct ResourceError {
    /// エラーメッセージ
    pub(crate) msg: String,

    /// エラーの根本原因
    pub(crate) cause: String,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ResourceError: {}: {}", self.msg, self.cause)
    }
}

impl Error for ResourceError {}

impl From<std::num::TryFromIntError> for LexsenseError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::TryFromInt(error)
    }
}

impl From<std::str::Utf8Error> for LexsenseError {
    fn from(error: std::str::Utf8Error) -> Self {
        Self::Utf8(error)
    }
}
