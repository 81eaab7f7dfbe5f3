// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record scanner for the DATA section
//!
//! Walks instance records (`#id = TYPE(...);`) one at a time without decoding
//! their attributes.

use memchr::{memchr, memchr3, memmem};
use step_lite_model::{Error, Result};

/// Location of one instance record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityRecord<'a> {
    /// Instance name (`#id`)
    pub id: u32,
    /// Type name as written
    pub type_name: &'a str,
    /// Byte offset of the leading `#`
    pub start: usize,
    /// Byte offset just past the terminating `;`
    pub end: usize,
}

/// Sequential scanner over the DATA section
///
/// Stops at `ENDSEC;` or the end of input. The first malformed record yields
/// an [`Error::Syntax`] and ends the scan.
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> EntityScanner<'a> {
    /// Create a new scanner for the given content
    pub fn new(content: &'a str) -> Self {
        let pos = find_keyword(content, "DATA;", 0)
            .map(|p| p + 5)
            .unwrap_or(0);

        Self {
            content,
            pos,
            done: false,
        }
    }

    /// Scan the next record
    pub fn next_entity(&mut self) -> Option<Result<EntityRecord<'a>>> {
        if self.done {
            return None;
        }

        if let Err(e) = self.skip_trivia() {
            return Some(Err(e));
        }

        let bytes = self.content.as_bytes();
        if self.pos >= bytes.len() || self.content[self.pos..].starts_with("ENDSEC") {
            self.done = true;
            return None;
        }

        let start = self.pos;
        if bytes[self.pos] != b'#' {
            return Some(Err(self.fail(start, "expected instance name or ENDSEC")));
        }
        self.pos += 1;

        let id_start = self.pos;
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos == id_start {
            return Some(Err(self.fail(start, "expected digits after #")));
        }
        let id: u32 = match self.content[id_start..self.pos].parse() {
            Ok(id) => id,
            Err(_) => return Some(Err(self.fail(start, "instance name out of range"))),
        };

        if let Err(e) = self.skip_trivia() {
            return Some(Err(e));
        }
        if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
            return Some(Err(self.fail(self.pos, "expected = after instance name")));
        }
        self.pos += 1;
        if let Err(e) = self.skip_trivia() {
            return Some(Err(e));
        }

        let type_start = self.pos;
        while self.pos < bytes.len()
            && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        if self.pos == type_start {
            return Some(Err(self.fail(type_start, "expected entity type name")));
        }
        let type_name = &self.content[type_start..self.pos];

        match self.find_entity_end() {
            Some(end) => Some(Ok(EntityRecord {
                id,
                type_name,
                start,
                end,
            })),
            None => Some(Err(self.fail(start, "unterminated instance"))),
        }
    }

    /// Find the end of a record, skipping quoted strings and comments
    fn find_entity_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            self.pos += memchr3(b'\'', b';', b'/', &bytes[self.pos..])?;
            match bytes[self.pos] {
                b';' => {
                    self.pos += 1;
                    return Some(self.pos);
                }
                b'\'' => self.pos = string_end(bytes, self.pos)?,
                _ if bytes[self.pos..].starts_with(b"/*") => {
                    self.pos = comment_end(bytes, self.pos)?
                }
                _ => self.pos += 1,
            }
        }

        None
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Skip whitespace and `/* */` comments
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            self.skip_whitespace();
            if !self.content[self.pos..].starts_with("/*") {
                return Ok(());
            }
            match comment_end(self.content.as_bytes(), self.pos) {
                Some(end) => self.pos = end,
                None => return Err(self.fail(self.pos, "unterminated comment")),
            }
        }
    }

    fn fail(&mut self, offset: usize, message: &str) -> Error {
        self.done = true;
        Error::syntax(offset, message)
    }
}

impl<'a> Iterator for EntityScanner<'a> {
    type Item = Result<EntityRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entity()
    }
}

impl std::iter::FusedIterator for EntityScanner<'_> {}

/// Offset just past the string whose opening quote is at `open`
fn string_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut pos = open + 1;
    loop {
        pos += memchr(b'\'', &bytes[pos..])?;
        if bytes.get(pos + 1) == Some(&b'\'') {
            pos += 2;
        } else {
            return Some(pos + 1);
        }
    }
}

/// Offset just past the comment opened at `open`
fn comment_end(bytes: &[u8], open: usize) -> Option<usize> {
    memmem::find(&bytes[open + 2..], b"*/").map(|close| open + close + 4)
}

/// Offset of `keyword` outside strings and comments, at or after `from`
///
/// The keyword must start a token: `METADATA;` does not match `DATA;`.
fn find_keyword(content: &str, keyword: &str, from: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    let keyword = keyword.as_bytes();
    let mut pos = from;

    while pos < bytes.len() {
        pos += memchr3(b'\'', b'/', keyword[0], &bytes[pos..])?;
        if bytes[pos] == b'\'' {
            pos = string_end(bytes, pos)?;
        } else if bytes[pos..].starts_with(b"/*") {
            pos = comment_end(bytes, pos)?;
        } else if bytes[pos..].starts_with(keyword)
            && (pos == 0 || !is_name_byte(bytes[pos - 1]))
        {
            return Some(pos);
        } else {
            pos += 1;
        }
    }

    None
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Header information extracted from a Part21 file
#[derive(Clone, Debug, Default)]
pub struct HeaderInfo {
    /// Identifiers listed in FILE_SCHEMA
    pub schema_identifiers: Vec<String>,
    /// First argument of FILE_NAME
    pub file_name: Option<String>,
}

/// Parse the header section to extract metadata
pub fn parse_header(content: &str) -> HeaderInfo {
    let mut info = HeaderInfo::default();

    let header_start = find_keyword(content, "HEADER;", 0).unwrap_or(0);
    let header_end = find_keyword(content, "ENDSEC;", header_start).unwrap_or(content.len());
    let header = &content[header_start..header_end];

    if let Some(schema_start) = find_keyword(header, "FILE_SCHEMA", 0) {
        if let Some(paren_start) = header[schema_start..].find('(') {
            let start = schema_start + paren_start + 1;
            if let Some((identifiers, _)) = parse_header_list(&header[start..]) {
                info.schema_identifiers = identifiers;
            }
        }
    }

    if let Some(name_start) = find_keyword(header, "FILE_NAME", 0) {
        if let Some(paren_start) = header[name_start..].find('(') {
            let start = name_start + paren_start + 1;
            if let Some((file_name, _)) = parse_header_string(&header[start..]) {
                if !file_name.is_empty() {
                    info.file_name = Some(file_name);
                }
            }
        }
    }

    info
}

/// Parse a string from header ('value')
fn parse_header_string(s: &str) -> Option<(String, &str)> {
    let s = s.trim_start();
    if !s.starts_with('\'') {
        // Check for empty value
        if let Some(rest) = s.strip_prefix('$') {
            return Some((String::new(), rest));
        }
        return None;
    }

    let mut end = 1;
    let bytes = s.as_bytes();
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if end + 1 < bytes.len() && bytes[end + 1] == b'\'' {
                end += 2;
                continue;
            }
            break;
        }
        end += 1;
    }
    if end >= bytes.len() {
        return None;
    }

    let value = s[1..end].replace("''", "'");
    Some((value, &s[end + 1..]))
}

/// Parse a list from header (('value1', 'value2'))
fn parse_header_list(s: &str) -> Option<(Vec<String>, &str)> {
    let s = s.trim_start();
    let mut current = s.strip_prefix('(')?;
    let mut items = Vec::new();

    loop {
        current = current.trim_start();
        if let Some(rest) = current.strip_prefix(')') {
            return Some((items, rest));
        }

        let (item, rest) = parse_header_string(current)?;
        if !item.is_empty() {
            items.push(item);
        }
        current = rest.trim_start();
        if let Some(rest) = current.strip_prefix(',') {
            current = rest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_STEP: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('walls.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCWALL('g1',$,'Wall; north',$);
/* a comment with #99=NOTHING(); inside */
#2 = IFCWALL('it''s;here',$,$,$);
  #3=IFCCURTAINWALL('g3',(#1,#2),.T.);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_finds_records() {
        let records: Vec<_> = EntityScanner::new(TEST_STEP)
            .map(|r| r.unwrap())
            .map(|r| (r.id, r.type_name))
            .collect();

        assert_eq!(
            records,
            [(1, "IFCWALL"), (2, "IFCWALL"), (3, "IFCCURTAINWALL")]
        );
    }

    #[test]
    fn test_record_spans_skip_quoted_semicolons() {
        let record = EntityScanner::new(TEST_STEP).next().unwrap().unwrap();
        assert_eq!(
            &TEST_STEP[record.start..record.end],
            "#1=IFCWALL('g1',$,'Wall; north',$);"
        );
    }

    #[test]
    fn test_data_keyword_inside_header_string() {
        let content = "ISO-10303-21;\nHEADER;\n\
            FILE_DESCRIPTION(('METADATA;v1'),'2;1');\n\
            FILE_NAME('DATA;.ifc','',(''),(''),'','','');\n\
            /* DATA; */\n\
            ENDSEC;\nDATA;\n#1=WALL('a');\n#2=WALL('b');\nENDSEC;";
        let ids: Vec<u32> = EntityScanner::new(content).map(|r| r.unwrap().id).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(parse_header(content).file_name, Some("DATA;.ifc".to_string()));
    }

    #[test]
    fn test_comments_inside_records() {
        let content = "DATA;\n#1 /* it's */ = WALL('a' /* ; */, $);\n#2=WALL(/*'*/'b');\nENDSEC;";
        let records: Vec<_> = EntityScanner::new(content).map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].type_name, "WALL");
        assert!(content[records[0].start..records[0].end].ends_with("$);"));
        assert_eq!(&content[records[1].start..records[1].end], "#2=WALL(/*'*/'b');");
    }

    #[test]
    fn test_unterminated_comment_in_record() {
        let mut scanner = EntityScanner::new("DATA;\n#1=WALL('a' /* open;");
        assert!(matches!(scanner.next(), Some(Err(Error::Syntax { .. }))));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_malformed_record_stops_scan() {
        let content = "DATA;\n#1=A();\n#2=B();\n#3 IFCWALL();\n#4=C();\nENDSEC;";
        let mut scanner = EntityScanner::new(content);

        assert!(scanner.next().unwrap().is_ok());
        assert!(scanner.next().unwrap().is_ok());
        match scanner.next() {
            Some(Err(Error::Syntax { message, .. })) => {
                assert!(message.contains("expected ="))
            }
            other => panic!("Expected syntax error, got {:?}", other),
        }
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_unterminated_record() {
        let mut scanner = EntityScanner::new("DATA;\n#1=A('open;");
        assert!(matches!(scanner.next(), Some(Err(Error::Syntax { offset: 6, .. }))));
    }

    #[test]
    fn test_parse_header() {
        let info = parse_header(TEST_STEP);
        assert_eq!(info.schema_identifiers, ["IFC2X3"]);
        assert_eq!(info.file_name, Some("walls.ifc".to_string()));
    }

    #[test]
    fn test_parse_header_without_header() {
        let info = parse_header("DATA;\n#1=A();\nENDSEC;");
        assert!(info.schema_identifiers.is_empty());
        assert!(info.file_name.is_none());
    }
}
