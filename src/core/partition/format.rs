//! core::partition::format
//!
//! Textual forms of a partition.
//!
//! | Print type       | Example for `{{0,1},{2},{3}}` |
//! |------------------|-------------------------------|
//! | `internal`       | `[-2,0,-1,-1]` (raw array)    |
//! | `ewk`            | `\|0,1\|2\|3\|`               |
//! | `block`          | `\|0 1\|2\|3\|`               |
//! | `human`          | `{{0,1},{2},{3}}`             |
//! | `sq_brace_block` | `[[0 1][2][3]]`               |
//!
//! Every form except `internal` lists canonical blocks ordered by their
//! smallest element. Parsing accepts all five; within a block, elements
//! may be separated by commas, whitespace, or both.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Partition, PartitionError};

/// Output format for [`Partition::to_string_as`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintType {
    Internal,
    Ewk,
    Block,
    Human,
    SqBraceBlock,
}

impl PrintType {
    /// All print types.
    pub const ALL: [PrintType; 5] = [
        PrintType::Internal,
        PrintType::Ewk,
        PrintType::Block,
        PrintType::Human,
        PrintType::SqBraceBlock,
    ];

    /// The name accepted by [`PrintType::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintType::Internal => "internal",
            PrintType::Ewk => "ewk",
            PrintType::Block => "block",
            PrintType::Human => "human",
            PrintType::SqBraceBlock => "sq_brace_block",
        }
    }
}

impl FromStr for PrintType {
    type Err = PartitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace('-', "_");
        PrintType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| PartitionError::InvalidPrintType(s.to_string()))
    }
}

impl std::fmt::Display for PrintType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn join_elements(block: &[usize], sep: &str) -> String {
    block
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn canonical_blocks(partition: &Partition) -> Vec<Vec<usize>> {
    let mut canonical = partition.clone();
    canonical.normalize();
    canonical.get_blocks()
}

pub(super) fn render(partition: &Partition, print_type: PrintType) -> String {
    match print_type {
        PrintType::Internal => {
            let entries: Vec<String> = partition.as_slice().iter().map(|v| v.to_string()).collect();
            format!("[{}]", entries.join(","))
        }
        PrintType::Ewk | PrintType::Block => {
            let sep = if print_type == PrintType::Ewk { "," } else { " " };
            let mut out = String::from("|");
            for block in canonical_blocks(partition) {
                out.push_str(&join_elements(&block, sep));
                out.push('|');
            }
            out
        }
        PrintType::Human => {
            let inner: Vec<String> = canonical_blocks(partition)
                .iter()
                .map(|b| format!("{{{}}}", join_elements(b, ",")))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        PrintType::SqBraceBlock => {
            let inner: String = canonical_blocks(partition)
                .iter()
                .map(|b| format!("[{}]", join_elements(b, " ")))
                .collect();
            format!("[{}]", inner)
        }
    }
}

fn is_separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

fn parse_numbers<T: FromStr>(text: &str) -> Result<Vec<T>, String> {
    text.split(is_separator)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<T>().map_err(|_| format!("'{t}' is not a valid number")))
        .collect()
}

/// Split `text` into the contents of `open ... close` groups, allowing
/// separators between groups.
fn split_groups(text: &str, open: char, close: char) -> Result<Vec<&str>, String> {
    let mut groups = Vec::new();
    let mut rest = text.trim_start_matches(is_separator);
    while !rest.is_empty() {
        let Some(after_open) = rest.strip_prefix(open) else {
            return Err(format!("expected '{open}' at '{rest}'"));
        };
        let Some(end) = after_open.find(close) else {
            return Err(format!("missing '{close}'"));
        };
        let content = &after_open[..end];
        if content.contains(open) {
            return Err(format!("nested '{open}'"));
        }
        groups.push(content);
        rest = after_open[end + close.len_utf8()..].trim_start_matches(is_separator);
    }
    Ok(groups)
}

fn parse_blocks(groups: &[&str]) -> Result<Vec<Vec<usize>>, String> {
    groups
        .iter()
        .map(|g| {
            let block = parse_numbers::<usize>(g)?;
            if block.is_empty() {
                Err("empty block".to_string())
            } else {
                Ok(block)
            }
        })
        .collect()
}

fn strip_outer(text: &str, open: char, close: char) -> Result<&str, String> {
    text.strip_prefix(open)
        .and_then(|t| t.strip_suffix(close))
        .ok_or_else(|| format!("expected outer '{open}...{close}'"))
}

fn parse_inner(text: &str) -> Result<Partition, String> {
    let blocks = if text.starts_with("[[") || text.starts_with("[ [") {
        let inner = strip_outer(text, '[', ']')?;
        parse_blocks(&split_groups(inner, '[', ']')?)?
    } else if text.starts_with('[') {
        let array = parse_numbers::<isize>(strip_outer(text, '[', ']')?)?;
        return Partition::from_array(array).map_err(|e| e.to_string());
    } else if text.starts_with('{') {
        let inner = strip_outer(text, '{', '}')?;
        parse_blocks(&split_groups(inner, '{', '}')?)?
    } else if text.contains('|') {
        let inner = text.strip_prefix('|').unwrap_or(text);
        let inner = inner.strip_suffix('|').unwrap_or(inner);
        let groups: Vec<&str> = inner.split('|').collect();
        parse_blocks(&groups)?
    } else {
        return Err("unrecognized partition notation".to_string());
    };

    let n = blocks.iter().map(Vec::len).sum();
    Partition::from_blocks(n, &blocks).map_err(|e| e.to_string())
}

pub(super) fn parse(text: &str) -> Result<Partition, PartitionError> {
    parse_inner(text.trim()).map_err(|reason| PartitionError::Parse {
        input: text.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Partition {
        Partition::from_array(vec![-2, 0, -1, -1]).unwrap()
    }

    #[test]
    fn render_all_forms() {
        let p = sample();
        assert_eq!(p.to_string_as(PrintType::Internal), "[-2,0,-1,-1]");
        assert_eq!(p.to_string_as(PrintType::Ewk), "|0,1|2|3|");
        assert_eq!(p.to_string_as(PrintType::Block), "|0 1|2|3|");
        assert_eq!(p.to_string_as(PrintType::Human), "{{0,1},{2},{3}}");
        assert_eq!(p.to_string_as(PrintType::SqBraceBlock), "[[0 1][2][3]]");
        assert_eq!(p.to_string(), "|0,1|2|3|");
    }

    #[test]
    fn every_form_parses_back() {
        let p = Partition::from_string("|0,3|1|2,4|").unwrap();
        for t in PrintType::ALL {
            let text = p.to_string_as(t);
            assert_eq!(Partition::from_string(&text).unwrap(), p, "form {t}: {text}");
        }
    }

    #[test]
    fn render_uses_canonical_blocks() {
        let p = Partition::from_array(vec![2, 2, -3, -1]).unwrap();
        assert_eq!(p.to_string_as(PrintType::Ewk), "|0,1,2|3|");
        assert_eq!(p.to_string_as(PrintType::Internal), "[2,2,-3,-1]");
    }

    #[test]
    fn parse_whitespace_and_commas() {
        let a = Partition::from_string("|0 1|2 3|").unwrap();
        let b = Partition::from_string(" | 0, 1 | 2,3 | ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get_blocks(), vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn parse_errors_echo_input() {
        for bad in ["", "hello", "|0,x|", "|0||1|", "|0,2|", "{{0},{1}", "[[0 1]2]"] {
            let err = Partition::from_string(bad).unwrap_err();
            assert!(matches!(err, PartitionError::Parse { .. }), "{bad}");
            assert!(err.to_string().contains(bad), "{bad}");
        }
    }

    #[test]
    fn print_type_names() {
        assert_eq!("ewk".parse::<PrintType>().unwrap(), PrintType::Ewk);
        assert_eq!(
            "SQ_BRACE_BLOCK".parse::<PrintType>().unwrap(),
            PrintType::SqBraceBlock
        );
        assert!(matches!(
            "fancy".parse::<PrintType>(),
            Err(PartitionError::InvalidPrintType(_))
        ));
        assert_eq!(sample().to_string_named("human").unwrap(), "{{0,1},{2},{3}}");
        assert!(sample().to_string_named("xml").is_err());
    }
}
