//! Extension list files
//!
//! One identifier per line. Blank lines and lines starting with `#` are
//! ignored; surrounding whitespace is dropped.

use camino::Utf8Path;
use vsix_core::error::VsixError;

use crate::ConfigResult;

/// Extract identifier tokens from list file contents
pub fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read identifier tokens from a list file
pub async fn read_list_file(path: &Utf8Path) -> ConfigResult<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| VsixError::io(format!("Failed to read extension list {}", path), e))?;
    Ok(parse_list(&content))
}

/// Work queue order: list file entries first, then command line arguments
pub fn combine(list_tokens: Vec<String>, cli_tokens: Vec<String>) -> Vec<String> {
    let mut queue = list_tokens;
    queue.extend(cli_tokens);
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use proptest::prelude::*;

    #[test]
    fn test_parse_list_skips_blanks_and_comments() {
        let content = "# editor basics\nacme.tool@1.0.0\n\n   \nms-python.python@2024.2.0  \r\n# trailing\n";
        assert_eq!(
            parse_list(content),
            vec!["acme.tool@1.0.0", "ms-python.python@2024.2.0"]
        );
    }

    #[test]
    fn test_combine_puts_list_first() {
        let queue = combine(
            vec!["a.from-list@1".to_string()],
            vec!["b.from-cli@2".to_string(), "c.from-cli@3".to_string()],
        );
        assert_eq!(queue, vec!["a.from-list@1", "b.from-cli@2", "c.from-cli@3"]);
    }

    #[tokio::test]
    async fn test_read_list_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().join("extensions.txt")).unwrap();
        tokio::fs::write(&path, "acme.tool@1.0.0\nacme.other@2.0\n").await.unwrap();

        let tokens = read_list_file(&path).await.unwrap();
        assert_eq!(tokens, vec!["acme.tool@1.0.0", "acme.other@2.0"]);
    }

    #[tokio::test]
    async fn test_read_missing_list_file() {
        let result = read_list_file(Utf8Path::new("/nonexistent/extensions.txt")).await;
        assert!(matches!(result, Err(VsixError::Io { .. })));
    }

    proptest! {
        #[test]
        fn prop_parse_list_keeps_order(tokens in proptest::collection::vec("[a-z]{1,8}\\.[a-z]{1,8}@[0-9]{1,3}", 0..20)) {
            let content = tokens.join("\n\n");
            prop_assert_eq!(parse_list(&content), tokens);
        }
    }
}
