pub mod report;
pub mod rules;
pub mod validator;

pub use report::{ValidationError, ValidationReport};
pub use rules::ValidationRule;
pub use validator::{CustomRule, Validator};

use crate::model::Document;

/// Validate with the built-in rules only.
pub fn validate_wtf_document(doc: &Document) -> (bool, Vec<String>) {
    Validator::new().validate(doc).into_parts()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Segment, Transcript, Word};

    #[test]
    fn test_document_violating_every_invariant() {
        let doc = Document::new(Transcript::new("bad", "not a tag!", 2.0, 1.5))
            .with_segments(vec![
                Segment::new(1.5, 3.0, "b", 0.9).with_speaker(7),
                Segment::new(0.0, 0.5, "a", 0.9),
            ])
            .with_words(vec![Word::new("lost", 0.6, 0.9, 0.9)]);
        let (valid, errors) = validate_wtf_document(&doc);
        assert!(!valid);
        // confidence, timing, order, speaker, containment, language
        assert!(errors.len() >= 6, "{errors:?}");
    }

    #[test]
    fn test_word_outside_segments_fails() {
        let seg = vec![Segment::new(0.0, 3.5, "hello there", 0.9)];
        let inside = Document::new(Transcript::new("hello there", "en-US", 5.0, 0.9))
            .with_segments(seg.clone())
            .with_words(vec![Word::new("hello", 0.0, 0.5, 0.9)]);
        let outside = Document::new(Transcript::new("hello there", "en-US", 5.0, 0.9))
            .with_segments(seg)
            .with_words(vec![Word::new("late", 4.0, 4.5, 0.9)]);

        assert!(validate_wtf_document(&inside).0);
        let (valid, errors) = validate_wtf_document(&outside);
        assert!(!valid);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not contained"));
    }
}
