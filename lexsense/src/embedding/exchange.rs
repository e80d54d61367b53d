//! 単語ベクトル交換形式の読み書き
//!
//! word2vec互換のテーブルを扱います。先頭行は`<tokenCount> <dimension>`で、
//! 以降の各行がトークンとそのベクトルです。
//!
//! - テキスト形式: `<token> <f32> ... <f32>\n`
//! - バイナリ形式: `<token> ` に続いてリトルエンディアンの`f32`が`dimension`個、最後に`\n`

use std::io::{BufRead, BufReader, BufWriter, Read, Write};

use crate::embedding::Matrix;
use crate::errors::{LexsenseError, Result};
use crate::utils::parse_field;

const FORMAT_NAME: &str = "exchange";

/// 受け付けるベクトルの最大次元
pub const MAX_DIMENSION: usize = 1 << 16;

/// 交換ファイルの形式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExchangeFormat {
    /// 空白区切りのテキスト形式
    Text,
    /// word2vecのバイナリ形式
    #[default]
    Binary,
}

/// 交換テーブルを読み込んだ結果の統計
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExchangeStats {
    /// ファイルに含まれるトークン数
    pub entries: usize,
    /// 名前空間に割り当てられた行数
    pub assigned: usize,
    /// 名前空間に存在せずスキップされたトークン数
    pub skipped: usize,
}

/// 交換テーブルを読み込み、名前空間のサイズに合わせた密行列に展開します。
///
/// ファイルに含まれない行はゼロベクトルのままです。名前空間に存在しない
/// トークンはスキップされます。どちらもエラーにはなりません。
///
/// # 引数
///
/// * `rdr` - 交換ファイルのリーダー
/// * `format` - ファイル形式
/// * `rows` - 名前空間のサイズ
/// * `lookup` - トークンを行インデックスに変換する関数
///
/// # エラー
///
/// ヘッダやエントリが不正な場合、次元が[`MAX_DIMENSION`]を超える場合、
/// ベクトルの次元が一致しない場合、エントリ数がヘッダより少ない場合に
/// [`FormatError`](crate::errors::FormatError)を返します。
pub fn read_exchange<R, F>(
    rdr: R,
    format: ExchangeFormat,
    rows: usize,
    mut lookup: F,
) -> Result<(Matrix, ExchangeStats)>
where
    R: Read,
    F: FnMut(&str) -> Option<usize>,
{
    let mut rdr = BufReader::new(rdr);

    let mut header = String::new();
    rdr.read_line(&mut header)?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    let &[count, dim] = fields.as_slice() else {
        return Err(LexsenseError::invalid_format(
            FORMAT_NAME,
            format!("invalid header '{}'", header.trim_end()),
        ));
    };
    let count: usize = parse_field(FORMAT_NAME, "tokenCount", count, 1)?;
    let dim: usize = parse_field(FORMAT_NAME, "dimension", dim, 1)?;
    if dim == 0 {
        return Err(LexsenseError::invalid_format(
            FORMAT_NAME,
            "dimension must be positive",
        ));
    }
    if dim > MAX_DIMENSION {
        return Err(LexsenseError::invalid_format(
            FORMAT_NAME,
            format!("dimension {dim} exceeds {MAX_DIMENSION}"),
        ));
    }

    let mut matrix = Matrix::try_zeros(rows, dim)?;
    let mut stats = ExchangeStats {
        entries: count,
        ..Default::default()
    };
    let mut token = String::new();
    let mut vector = vec![0f32; dim];

    for i in 0..count {
        let line_no = i + 2;
        match format {
            ExchangeFormat::Text => read_text_entry(&mut rdr, &mut token, &mut vector, line_no)?,
            ExchangeFormat::Binary => read_binary_entry(&mut rdr, &mut token, &mut vector, line_no)?,
        }
        match lookup(&token) {
            Some(row) if row < rows => {
                matrix.row_mut(row).copy_from_slice(&vector);
                stats.assigned += 1;
            }
            _ => stats.skipped += 1,
        }
    }

    Ok((matrix, stats))
}

fn read_text_entry<R>(
    rdr: &mut R,
    token: &mut String,
    vector: &mut [f32],
    line_no: usize,
) -> Result<()>
where
    R: BufRead,
{
    let mut line = String::new();
    loop {
        line.clear();
        if rdr.read_line(&mut line)? == 0 {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!("line {line_no}: unexpected end of file"),
            ));
        }
        if !line.trim().is_empty() {
            break;
        }
    }

    let mut fields = line.split_whitespace();
    token.clear();
    token.push_str(fields.next().unwrap_or_default());
    let mut n = 0;
    for field in fields {
        if n == vector.len() {
            n += 1;
            break;
        }
        vector[n] = parse_field(FORMAT_NAME, "vector element", field, line_no)?;
        n += 1;
    }
    if n != vector.len() {
        return Err(LexsenseError::invalid_format(
            FORMAT_NAME,
            format!(
                "line {line_no}: token '{token}' does not have {} elements",
                vector.len()
            ),
        ));
    }
    Ok(())
}

fn read_binary_entry<R>(
    rdr: &mut R,
    token: &mut String,
    vector: &mut [f32],
    line_no: usize,
) -> Result<()>
where
    R: BufRead,
{
    let mut bytes = vec![];
    rdr.read_until(b' ', &mut bytes)?;
    if bytes.last() != Some(&b' ') {
        return Err(LexsenseError::invalid_format(
            FORMAT_NAME,
            format!("entry {}: unexpected end of file", line_no - 1),
        ));
    }
    bytes.pop();
    // The separator of the previous vector.
    let start = bytes.iter().position(|&b| b != b'\n').unwrap_or(bytes.len());
    token.clear();
    token.push_str(std::str::from_utf8(&bytes[start..])?);

    let mut buf = [0u8; 4];
    for v in vector.iter_mut() {
        rdr.read_exact(&mut buf).map_err(|_| {
            LexsenseError::invalid_format(
                FORMAT_NAME,
                format!("entry {}: truncated vector of '{token}'", line_no - 1),
            )
        })?;
        *v = f32::from_le_bytes(buf);
    }
    Ok(())
}

/// 交換テーブルを書き出します。
///
/// # 引数
///
/// * `wtr` - 書き込み先
/// * `format` - ファイル形式
/// * `dim` - ベクトルの次元
/// * `entries` - トークンとベクトルの組
///
/// # エラー
///
/// ベクトルの長さが`dim`と一致しない場合に
/// [`FormatError`](crate::errors::FormatError)を返します。
pub fn write_exchange<'a, W, I>(wtr: W, format: ExchangeFormat, dim: usize, entries: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let entries: Vec<_> = entries.into_iter().collect();
    let mut wtr = BufWriter::new(wtr);
    writeln!(&mut wtr, "{} {}", entries.len(), dim)?;
    for (token, vector) in entries {
        if vector.len() != dim {
            return Err(LexsenseError::invalid_format(
                FORMAT_NAME,
                format!("'{token}' has {} elements, expected {dim}", vector.len()),
            ));
        }
        match format {
            ExchangeFormat::Text => {
                write!(&mut wtr, "{token}")?;
                for v in vector {
                    write!(&mut wtr, " {v}")?;
                }
                writeln!(&mut wtr)?;
            }
            ExchangeFormat::Binary => {
                write!(&mut wtr, "{token} ")?;
                for v in vector {
                    wtr.write_all(&v.to_le_bytes())?;
                }
                writeln!(&mut wtr)?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(token: &str) -> Option<usize> {
        match token {
            "a" => Some(0),
            "b" => Some(1),
            "c" => Some(2),
            _ => None,
        }
    }

    #[test]
    fn test_read_text() {
        let data = "3 2\nb 1.5 -2\nzzz 9 9\nc 0.25 1\n";
        let (matrix, stats) =
            read_exchange(data.as_bytes(), ExchangeFormat::Text, 4, lookup).unwrap();
        assert_eq!(4, matrix.rows());
        assert_eq!(2, matrix.cols());
        assert_eq!(&[0.0f32, 0.0], matrix.row(0));
        assert_eq!(&[1.5f32, -2.0], matrix.row(1));
        assert_eq!(&[0.25f32, 1.0], matrix.row(2));
        assert_eq!(&[0.0f32, 0.0], matrix.row(3));
        assert_eq!(
            ExchangeStats {
                entries: 3,
                assigned: 2,
                skipped: 1
            },
            stats
        );
    }

    #[test]
    fn test_read_binary() {
        let a = [0.5f32, -1.0, 2.0];
        let c = [3.0f32, 0.0, -0.125];
        let mut buf = vec![];
        write_exchange(
            &mut buf,
            ExchangeFormat::Binary,
            3,
            [("a", &a[..]), ("c", &c[..])],
        )
        .unwrap();

        let (matrix, stats) =
            read_exchange(buf.as_slice(), ExchangeFormat::Binary, 3, lookup).unwrap();
        assert_eq!(&a, matrix.row(0));
        assert_eq!(&[0.0f32; 3], matrix.row(1));
        assert_eq!(&c, matrix.row(2));
        assert_eq!(2, stats.assigned);
    }

    #[test]
    fn test_read_text_wrong_dimension() {
        let data = "1 3\na 1 2\n";
        let result = read_exchange(data.as_bytes(), ExchangeFormat::Text, 1, lookup);
        assert!(matches!(result, Err(LexsenseError::Format(_))));

        let data = "1 1\na 1 2\n";
        let result = read_exchange(data.as_bytes(), ExchangeFormat::Text, 1, lookup);
        assert!(matches!(result, Err(LexsenseError::Format(_))));
    }

    #[test]
    fn test_read_truncated() {
        let data = "2 1\na 1\n";
        let result = read_exchange(data.as_bytes(), ExchangeFormat::Text, 1, lookup);
        assert!(matches!(result, Err(LexsenseError::Format(_))));

        let mut buf = b"1 2\na ".to_vec();
        buf.extend_from_slice(&1f32.to_le_bytes());
        let result = read_exchange(buf.as_slice(), ExchangeFormat::Binary, 1, lookup);
        assert!(matches!(result, Err(LexsenseError::Format(_))));
    }

    #[test]
    fn test_invalid_header() {
        let result = read_exchange("3\n".as_bytes(), ExchangeFormat::Text, 1, lookup);
        assert!(matches!(result, Err(LexsenseError::Format(_))));
        let result = read_exchange("3 0\n".as_bytes(), ExchangeFormat::Text, 1, lookup);
        assert!(matches!(result, Err(LexsenseError::Format(_))));
    }

    #[test]
    fn test_oversized_dimension() {
        for data in ["1 4611686018427387904\na 1\n", "1 65537\na 1\n"] {
            let result = read_exchange(data.as_bytes(), ExchangeFormat::Text, 2, lookup);
            assert!(matches!(result, Err(LexsenseError::Format(_))));
        }
        let result = read_exchange(
            "0 65536\n".as_bytes(),
            ExchangeFormat::Binary,
            usize::MAX / 2,
            lookup,
        );
        assert!(matches!(result, Err(LexsenseError::Format(_))));
    }
}
