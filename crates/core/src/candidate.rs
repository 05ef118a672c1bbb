use crate::Result;
use regex::Regex;

/// Decides whether a line may be offered to the verifier for removal.
///
/// Implementations must be pure: the same text always yields the same answer.
pub trait CandidatePredicate: Send + Sync {
    fn eligible(&self, text: &str) -> bool;
}

/// Default rule: a line comment carrying an annotation whose body starts with
/// an assert-family keyword, e.g. `//@ assert x > 0`.
#[derive(Debug, Clone)]
pub struct AssertAnnotation {
    comment_prefix: String,
    sigil: char,
    keyword: String,
}

impl Default for AssertAnnotation {
    fn default() -> Self {
        Self {
            comment_prefix: "//".to_string(),
            sigil: crate::chop::ANNOTATION_SIGIL,
            keyword: "assert".to_string(),
        }
    }
}

impl AssertAnnotation {
    /// Strip the comment prefix and the annotation sigil, returning the
    /// annotation body. `None` if either is missing.
    pub fn annotation_body<'a>(&self, text: &'a str) -> Option<&'a str> {
        let rest = text.trim().strip_prefix(self.comment_prefix.as_str())?;
        let rest = rest.trim().strip_prefix(self.sigil)?;
        Some(rest.trim())
    }
}

impl CandidatePredicate for AssertAnnotation {
    fn eligible(&self, text: &str) -> bool {
        self.annotation_body(text)
            .is_some_and(|body| body.starts_with(self.keyword.as_str()))
    }
}

/// User-supplied override matched against the raw line text.
#[derive(Debug, Clone)]
pub struct PatternPredicate {
    regex: Regex,
}

impl PatternPredicate {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }
}

impl CandidatePredicate for PatternPredicate {
    fn eligible(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// A line snapshot. `index` is the 0-based position in the original content
/// and stays valid because chopping never changes the line count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub index: usize,
    pub text: String,
}

/// Ordered lines still under consideration for removal in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePool {
    lines: Vec<Line>,
}

impl CandidatePool {
    /// Snapshot every line of `content` that `predicate` accepts, in file order.
    pub fn build(content: &str, predicate: &dyn CandidatePredicate) -> Self {
        let lines = content
            .split('\n')
            .enumerate()
            .filter(|(_, text)| predicate.eligible(text))
            .map(|(index, text)| Line {
                index,
                text: text.to_string(),
            })
            .collect();
        Self { lines }
    }

    pub fn from_lines(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    /// Current position of the entry for line `index`.
    pub fn position(&self, index: usize) -> Option<usize> {
        self.lines.iter().position(|line| line.index == index)
    }

    pub fn indices(&self) -> Vec<usize> {
        self.lines.iter().map(|line| line.index).collect()
    }

    /// Drop the entry for `index`; entries after it move to the front and the
    /// entries before it follow. Returns `false` (pool untouched) when no entry
    /// has that index.
    pub fn rotate_and_drop(&mut self, index: usize) -> bool {
        let Some(cut) = self.position(index) else {
            log::warn!("line {index} is not in the candidate pool");
            return false;
        };
        self.lines.remove(cut);
        self.lines.rotate_left(cut);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pool_of(indices: &[usize]) -> CandidatePool {
        CandidatePool::from_lines(
            indices
                .iter()
                .map(|&index| Line {
                    index,
                    text: format!("//@ assert l{index}"),
                })
                .collect(),
        )
    }

    #[test]
    fn assert_annotation_cases() {
        let predicate = AssertAnnotation::default();
        let cases = [
            ("//@assert true", true),
            ("       //@assert true", true),
            ("       //    @assert true", true),
            ("   // @assert true", true),
            (" // @ assert true", true),
            ("\t\t//@ assert x > 0", true),
            ("// // @assert true", false),
            ("// // #assert true", false),
            ("// #assert true", false),
            ("//#assert true", false),
            ("assert", false),
            ("//@ invariant x > 0", false),
            ("//chop! //@assert true", false),
            ("//chop! //#assert true", false),
            ("", false),
        ];

        for (input, expected) in cases {
            assert_eq!(predicate.eligible(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn predicate_is_pure() {
        let predicate = AssertAnnotation::default();
        for input in ["//@assert true", "// // @assert true", "x := 1"] {
            let first = predicate.eligible(input);
            for _ in 0..3 {
                assert_eq!(predicate.eligible(input), first);
            }
        }
    }

    #[test]
    fn pattern_replaces_default_rule() {
        let predicate = PatternPredicate::new(r"^\s*//@\s*(assert|assume)").unwrap();
        assert!(predicate.eligible("  //@ assume x"));
        assert!(predicate.eligible("//@assert true"));
        assert!(!predicate.eligible("//@ invariant x"));

        let anything = PatternPredicate::new("fold").unwrap();
        assert!(anything.eligible("x := 1 // unfold later"));
    }

    #[test]
    fn malformed_pattern_is_rejected() {
        assert!(PatternPredicate::new("(unclosed").is_err());
    }

    #[test]
    fn build_keeps_eligible_lines_in_order() {
        let content = "package p\n//@ assert a\nx := 1\n\t//@assert b\n";
        let pool = CandidatePool::build(content, &AssertAnnotation::default());
        assert_eq!(pool.indices(), vec![1, 3]);
        assert_eq!(pool.iter().nth(1).unwrap().text, "\t//@assert b");
    }

    #[test]
    fn rotate_and_drop_wraps_around() {
        let mut pool = pool_of(&[0, 2, 5, 9]);
        assert!(pool.rotate_and_drop(5));
        assert_eq!(pool.indices(), vec![9, 0, 2]);
    }

    #[test]
    fn rotate_and_drop_at_edges() {
        let mut pool = pool_of(&[0, 2, 5, 9]);
        assert!(pool.rotate_and_drop(0));
        assert_eq!(pool.indices(), vec![2, 5, 9]);

        let mut pool = pool_of(&[0, 2, 5, 9]);
        assert!(pool.rotate_and_drop(9));
        assert_eq!(pool.indices(), vec![0, 2, 5]);
    }

    #[test]
    fn rotate_and_drop_shrinks_by_one() {
        let mut pool = pool_of(&[1, 3, 4, 7, 8]);
        for index in [4, 1, 8, 3, 7] {
            let before = pool.len();
            assert!(pool.rotate_and_drop(index));
            assert_eq!(pool.len(), before - 1);
        }
        assert!(pool.is_empty());
    }

    #[test]
    fn rotate_and_drop_ignores_unknown_index() {
        let mut pool = pool_of(&[0, 2]);
        assert!(!pool.rotate_and_drop(1));
        assert_eq!(pool.indices(), vec![0, 2]);
    }
}
