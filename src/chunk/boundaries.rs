//! Break point detection for chunking

/// Priority levels for break points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BreakPriority {
    /// Word boundary (lowest)
    Word = 1,
    /// Sentence boundary
    Sentence = 2,
    /// Paragraph boundary (highest)
    Paragraph = 3,
}

/// A potential break point in text
#[derive(Debug, Clone)]
pub struct BreakPoint {
    /// Byte position (always on a char boundary)
    pub position: usize,
    /// Priority of this break point
    pub priority: BreakPriority,
}

/// Find paragraph and sentence break points in the text, sorted by position
pub fn find_break_points(text: &str) -> Vec<BreakPoint> {
    let mut points = Vec::new();

    // Paragraph breaks (double newlines); break after the blank line
    for (i, _) in text.match_indices("\n\n") {
        let pos = i + 2;
        if text.is_char_boundary(pos) {
            points.push(BreakPoint {
                position: pos,
                priority: BreakPriority::Paragraph,
            });
        }
    }

    // Sentence boundaries
    for pat in [". ", ".\n", "? ", "?\n", "! ", "!\n"] {
        for (i, _) in text.match_indices(pat) {
            let pos = i + 2;
            if text.is_char_boundary(pos) {
                points.push(BreakPoint {
                    position: pos,
                    priority: BreakPriority::Sentence,
                });
            }
        }
    }

    points.sort_by_key(|p| (p.position, std::cmp::Reverse(p.priority as u8)));
    points.dedup_by_key(|p| p.position);

    points
}

/// Ensure a position is on a valid UTF-8 character boundary
pub fn ensure_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut adjusted = pos;
    while adjusted > 0 && !text.is_char_boundary(adjusted) {
        adjusted -= 1;
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_priority_ordering() {
        assert!(BreakPriority::Paragraph > BreakPriority::Sentence);
        assert!(BreakPriority::Sentence > BreakPriority::Word);
    }

    #[test]
    fn test_find_paragraph_breaks() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let points = find_break_points(text);

        assert!(points
            .iter()
            .any(|p| p.priority == BreakPriority::Paragraph && p.position == 18));
    }

    #[test]
    fn test_find_sentence_breaks() {
        let text = "One. Two? Three! Four";
        let points = find_break_points(text);

        let positions: Vec<usize> = points
            .iter()
            .filter(|p| p.priority == BreakPriority::Sentence)
            .map(|p| p.position)
            .collect();
        assert_eq!(positions, vec![5, 10, 17]);
    }

    #[test]
    fn test_break_points_sorted_and_unique() {
        let text = "A. B.\n\nC? D!\n\nE.";
        let points = find_break_points(text);

        for pair in points.windows(2) {
            assert!(pair[0].position < pair[1].position);
        }
    }

    #[test]
    fn test_ensure_char_boundary() {
        let text = "héllo";
        // byte 2 is inside the two-byte 'é'
        assert_eq!(ensure_char_boundary(text, 2), 1);
        assert_eq!(ensure_char_boundary(text, 100), text.len());
        assert_eq!(ensure_char_boundary(text, 0), 0);
    }
}
