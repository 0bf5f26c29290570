use std::mem;

use crate::model::BusinessRecord;

use super::field_patterns::FieldPatterns;

/// Record boundary state of the business listing parser.
#[derive(Debug, Default)]
pub(super) enum ParserState {
    #[default]
    Idle,
    Open(BusinessRecord),
}

/// Line-driven parser for `PL` listings. A license-number line opens a new
/// record and flushes the previous one; any other non-blank line extends the
/// open record, or is dropped when no record is open. While a record is open,
/// indented lines always extend it.
pub(super) struct BusinessListingParser<'a> {
    patterns: &'a FieldPatterns,
    state: ParserState,
    records: Vec<BusinessRecord>,
}

impl<'a> BusinessListingParser<'a> {
    pub(super) fn new(patterns: &'a FieldPatterns) -> Self {
        Self {
            patterns,
            state: ParserState::Idle,
            records: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(super) fn state(&self) -> &ParserState {
        &self.state
    }

    pub(super) fn feed_line(&mut self, line_number: usize, raw_line: &str) {
        let line = raw_line.trim();
        if line.is_empty() || self.patterns.is_page_furniture(line) {
            return;
        }

        // Indented lines under an open record are continuation columns, even
        // when they begin with digits.
        let indented_continuation = matches!(self.state, ParserState::Open(_))
            && raw_line.starts_with(char::is_whitespace);

        if let Some(captures) = self
            .patterns
            .record_start
            .captures(line)
            .filter(|_| !indented_continuation)
        {
            let mut record = BusinessRecord {
                license_number: captures[1].to_string(),
                line_number,
                raw_text: line.to_string(),
                ..BusinessRecord::default()
            };
            let remainder = self.patterns.scan_business_segment(&captures[2], &mut record);
            if !remainder.is_empty() {
                record.business_name = Some(remainder);
            }

            if let ParserState::Open(previous) =
                mem::replace(&mut self.state, ParserState::Open(record))
            {
                self.records.push(previous);
            }
            return;
        }

        if let ParserState::Open(record) = &mut self.state {
            record.raw_text.push('\n');
            record.raw_text.push_str(line);
            // Leftover text on continuation lines is not a business name.
            let _ = self.patterns.scan_business_segment(line, record);
        }
    }

    pub(super) fn finish(mut self) -> Vec<BusinessRecord> {
        if let ParserState::Open(record) = mem::take(&mut self.state) {
            self.records.push(record);
        }
        self.records
    }
}

pub(super) fn parse_business_listing(patterns: &FieldPatterns, text: &str) -> Vec<BusinessRecord> {
    let mut parser = BusinessListingParser::new(patterns);
    for (index, line) in text.lines().enumerate() {
        parser.feed_line(index + 1, line);
    }
    parser.finish()
}
