//! Redaction of record messages before delivery.

use crate::record::LogRecord;
use regex::Regex;

/// Removes every occurrence of `pattern` from each record's message.
///
/// No-op when no pattern is configured. Runs after attribution, which may
/// depend on the unredacted content, and before delivery.
pub fn scrub(records: &mut [LogRecord], pattern: Option<&Regex>) {
    let Some(pattern) = pattern else {
        return;
    };
    for record in records.iter_mut() {
        if pattern.is_match(&record.message) {
            record.message = pattern.replace_all(&record.message, "").into_owned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{timestamp_from_millis, ResourceId};

    fn records(messages: &[&str]) -> Vec<LogRecord> {
        messages
            .iter()
            .map(|message| {
                LogRecord::new(
                    *message,
                    timestamp_from_millis(0),
                    ResourceId::from_arn("arn:aws:s3:::bucket"),
                )
            })
            .collect()
    }

    #[test]
    fn test_scrub_removes_all_matches() {
        let mut batch = records(&["card 4111-1111-1111-1111 used", "no numbers here"]);
        let pattern = Regex::new(r"\d{4}-\d{4}-\d{4}-\d{4}").expect("pattern");
        scrub(&mut batch, Some(&pattern));
        assert_eq!(batch[0].message, "card  used");
        assert_eq!(batch[1].message, "no numbers here");
    }

    #[test]
    fn test_scrub_without_pattern_is_a_noop() {
        let mut batch = records(&["untouched"]);
        scrub(&mut batch, None);
        assert_eq!(batch[0].message, "untouched");
    }

    #[test]
    fn test_scrub_leaves_resource_identity_alone() {
        let mut batch = records(&["arn:aws:s3:::bucket leaked"]);
        let pattern = Regex::new(r"arn:\S+").expect("pattern");
        scrub(&mut batch, Some(&pattern));
        assert_eq!(batch[0].message, " leaked");
        assert_eq!(
            batch[0].resource_id.get("system.aws.arn"),
            Some("arn:aws:s3:::bucket")
        );
    }
}
