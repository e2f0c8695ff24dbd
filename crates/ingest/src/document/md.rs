use super::{empty_page, PageContent, PageOutcome};

pub fn extract_md(bytes: &[u8]) -> Vec<PageOutcome> {
    let text = String::from_utf8(bytes.to_vec())
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());

    if text.trim().is_empty() {
        return vec![empty_page(1)];
    }

    // Extract headings (lines starting with #)
    let headings: Vec<String> = text
        .lines()
        .filter(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|heading| !heading.is_empty())
        .collect();

    vec![PageOutcome::Extracted(PageContent {
        page_number: 1,
        text: text.trim().to_string(),
        headings,
    })]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_page(outcomes: Vec<PageOutcome>) -> PageContent {
        match outcomes.into_iter().next() {
            Some(PageOutcome::Extracted(page)) => page,
            other => panic!("expected an extracted page, got {other:?}"),
        }
    }

    #[test]
    fn extract_headings() {
        let content = b"# Title\n\nSome text.\n\n## Section 1\n\nMore text.\n\n### Subsection\n";
        let page = only_page(extract_md(content));
        assert_eq!(page.headings, vec!["Title", "Section 1", "Subsection"]);
    }

    #[test]
    fn preserves_full_content() {
        let page = only_page(extract_md(b"# Hello\n\nParagraph one.\n\n## World\n\nParagraph two."));
        assert!(page.text.contains("Paragraph one."));
        assert!(page.text.contains("Paragraph two."));
    }

    #[test]
    fn no_headings() {
        let page = only_page(extract_md(b"Just plain text without any headings."));
        assert!(page.headings.is_empty());
        assert_eq!(page.text, "Just plain text without any headings.");
    }

    #[test]
    fn empty_markdown_is_skipped() {
        assert!(matches!(extract_md(b"").as_slice(), [PageOutcome::Skipped(_)]));
    }
}
