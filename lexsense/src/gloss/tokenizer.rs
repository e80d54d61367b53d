//! 定義文のトークナイザ

/// 定義文や用例をトークンに分割するインタフェース
pub trait TextTokenizer {
    /// テキストをトークン列に分割します。
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// 空白と句読点で分割する小文字化トークナイザ
///
/// 英数字の並びを1トークンとし、語中のアポストロフィとハイフンは語の一部として
/// 扱います。それ以外の記号は1文字ずつのトークンになります。
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleTokenizer;

impl TextTokenizer for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = vec![];
        let mut current = String::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c.is_alphanumeric() {
                current.extend(c.to_lowercase());
                continue;
            }
            let joins = (c == '\'' || c == '-')
                && !current.is_empty()
                && chars.peek().is_some_and(|n| n.is_alphanumeric());
            if joins {
                current.push(c);
                continue;
            }
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }
}

impl<T> TextTokenizer for &T
where
    T: TextTokenizer + ?Sized,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        (**self).tokenize(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let tokens = SimpleTokenizer.tokenize("Sloping land (especially the slope beside a body of water)");
        assert_eq!(
            vec![
                "sloping", "land", "(", "especially", "the", "slope", "beside", "a", "body", "of",
                "water", ")"
            ],
            tokens
        );
    }

    #[test]
    fn test_inner_punctuation() {
        let tokens = SimpleTokenizer.tokenize("a well-known bank's  vault; 'quoted' -x");
        assert_eq!(
            vec!["a", "well-known", "bank's", "vault", ";", "'", "quoted", "'", "-", "x"],
            tokens
        );
    }

    #[test]
    fn test_empty() {
        assert!(SimpleTokenizer.tokenize("   ").is_empty());
    }
}
