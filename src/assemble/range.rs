use std::collections::BTreeSet;

/// ページ範囲文字列を0-indexedのページインデックスに変換する。
///
/// 形式:
/// - 単一ページ: `"5"`
/// - 範囲: `"5-10"` (前後の空白可)
/// - 混合（カンマ区切り）: `"1, 3, 5-10, 15"`
///
/// 1..=max_pages の外にあるページや解釈できないトークンは黙って捨てる。
/// `"1-3-5"` のようにトークン全体が範囲として読めないものも捨てる。
/// 逆順の範囲 (`"5-3"`) は何も選択しない。結果はソート済み・重複なし。
pub fn parse_page_range(s: &str, max_pages: u32) -> Vec<u32> {
    let mut pages = BTreeSet::new();

    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start_str, end_str)) = part.split_once('-') {
            let (Ok(start), Ok(end)) = (start_str.trim().parse::<u32>(), end_str.trim().parse::<u32>())
            else {
                continue;
            };
            // 範囲外の終端はmax_pagesで打ち切る（巨大な範囲でも反復回数は有界）
            for page in start.max(1)..=end.min(max_pages) {
                pages.insert(page - 1);
            }
        } else if let Ok(page) = part.parse::<u32>()
            && (1..=max_pages).contains(&page)
        {
            pages.insert(page - 1);
        }
    }

    pages.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_ranges() {
        assert_eq!(parse_page_range("1-3, 5, 7-10", 10), vec![0, 1, 2, 4, 6, 7, 8, 9]);
    }

    #[test]
    fn test_out_of_range_dropped() {
        assert_eq!(parse_page_range("1, 100", 10), vec![0]);
    }

    #[test]
    fn test_malformed_tokens_dropped() {
        assert_eq!(parse_page_range("1, abc, 3", 10), vec![0, 2]);
        assert_eq!(parse_page_range("-5, 2-x", 10), Vec::<u32>::new());
    }

    #[test]
    fn test_token_must_be_a_whole_range() {
        // 末尾に余計な文字がある範囲は接頭辞だけを読まずにトークンごと捨てる
        assert!(parse_page_range("1-3-5", 10).is_empty());
        assert!(parse_page_range("2-4x", 10).is_empty());
        assert_eq!(parse_page_range("2-4x, 6", 10), vec![5]);
    }

    #[test]
    fn test_empty_string() {
        assert!(parse_page_range("", 10).is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(parse_page_range("1,1,1-2", 10), vec![0, 1]);
    }

    #[test]
    fn test_reversed_range_selects_nothing() {
        assert!(parse_page_range("5-3", 10).is_empty());
    }

    #[test]
    fn test_spaces_around_dash_and_clipped_end() {
        assert_eq!(parse_page_range("8 - 4000000000", 10), vec![7, 8, 9]);
        assert!(parse_page_range("0", 10).is_empty());
    }
}
