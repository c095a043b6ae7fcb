//! Process partial credit for wrong-but-attempted answers.
//!
//! When a solvable task gets a wrong `ok` answer, a small, strictly
//! capped credit rewards demonstrably correct *use* of the parsing
//! library. Tiers are gated: a later tier is granted only if every
//! earlier one held, so decorative or disconnected code cannot claim
//! late-tier behavior.
//!
//! The analysis works on the executable portion of the submission only:
//! comments and string literal contents are stripped first, suites under
//! constant-false branches are dropped, and functions that are never
//! referenced are excluded. A parser constructed from a hard-coded
//! literal standing in for the input earns no live-input credit.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::config::ProcessCreditTiers;

/// Variable name the sandbox binds the artifact to. The "parsed the live
/// input" tier requires the parse to be built from this binding (directly
/// or through assignment aliases).
pub const LIVE_INPUT_BINDING: &str = "document";

/// Query methods that count as actually interrogating the parsed
/// document.
const QUERY_METHODS: &str = "find|find_all|select|select_one|get_text";

/// The gated tiers, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreditTier {
    /// No demonstrated library use.
    #[default]
    None,
    /// The library is imported in executed code.
    ImportedLibrary,
    /// A parse was constructed from the live input binding.
    ParsedLiveInput,
    /// The parsed document was queried.
    QueriedDocument,
}

impl CreditTier {
    /// Numeric rank for metrics (0 = none).
    pub fn rank(&self) -> u32 {
        match self {
            CreditTier::None => 0,
            CreditTier::ImportedLibrary => 1,
            CreditTier::ParsedLiveInput => 2,
            CreditTier::QueriedDocument => 3,
        }
    }
}

/// Outcome of the analysis: the highest gated tier reached and the
/// cumulative credit it grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessCreditReport {
    /// Highest tier whose full gate chain held.
    pub tier: CreditTier,
    /// Cumulative credit; capped by construction at the tier total.
    pub credit: f64,
}

impl ProcessCreditReport {
    fn none() -> Self {
        Self {
            tier: CreditTier::None,
            credit: 0.0,
        }
    }
}

/// Analyzes a submission and returns the gated credit it earned.
pub fn assess(code: &str, tiers: &ProcessCreditTiers) -> ProcessCreditReport {
    let executable = executable_source(code);

    if !imports_library(&executable) {
        return ProcessCreditReport::none();
    }
    let mut tier = CreditTier::ImportedLibrary;
    let mut credit = tiers.imported_library;

    let aliases = live_aliases(&executable);
    let constructions = constructions(&executable, &aliases);
    let live_vars: Vec<&str> = constructions
        .iter()
        .filter(|c| c.live)
        .filter_map(|c| c.var.as_deref())
        .collect();
    let any_live = constructions.iter().any(|c| c.live);

    if !any_live {
        return ProcessCreditReport { tier, credit };
    }
    tier = CreditTier::ParsedLiveInput;
    credit += tiers.parsed_live_input;

    if queried(&executable, &live_vars) || chained_live_query(&executable, &aliases) {
        tier = CreditTier::QueriedDocument;
        credit += tiers.queried_document;
    }

    ProcessCreditReport { tier, credit }
}

/// Reduces a submission to its executable portion.
fn executable_source(code: &str) -> String {
    let stripped = strip_comments_and_strings(code);
    let live = drop_dead_branches(&stripped);
    drop_unreferenced_functions(&live)
}

/// Removes comments entirely and empties string literal contents while
/// keeping the quote characters, so positions of real code are preserved
/// and nothing inside a literal can be mistaken for an API call.
fn strip_comments_and_strings(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut out = String::with_capacity(code.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        if c == '\'' || c == '"' {
            let quote = c;
            let triple = i + 2 < chars.len() && chars[i + 1] == quote && chars[i + 2] == quote;
            out.push(quote);
            if triple {
                out.push(quote);
                out.push(quote);
                i += 3;
                while i < chars.len() {
                    if chars[i] == '\\' {
                        i += 2;
                        continue;
                    }
                    if chars[i] == quote
                        && i + 2 < chars.len()
                        && chars[i + 1] == quote
                        && chars[i + 2] == quote
                    {
                        out.push(quote);
                        out.push(quote);
                        out.push(quote);
                        i += 3;
                        break;
                    }
                    i += 1;
                }
            } else {
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' {
                        i += 2;
                        continue;
                    }
                    if chars[i] == quote {
                        out.push(quote);
                        i += 1;
                        break;
                    }
                    // An unterminated single-quoted string ends at the
                    // line break.
                    if chars[i] == '\n' {
                        out.push(quote);
                        break;
                    }
                    i += 1;
                }
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Drops suites guarded by constant-false conditions (`if False:`,
/// `if 0:`, `while False:`). An `else:` at the same indentation is
/// reachable and kept.
fn drop_dead_branches(source: &str) -> String {
    let dead = Regex::new(r"^\s*(?:if|while)\s+(?:False|0)\s*:").expect("static pattern");
    let lines: Vec<&str> = source.lines().collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if dead.is_match(line) {
            let base = indent_of(line);
            i += 1;
            while i < lines.len() {
                let next = lines[i];
                if next.trim().is_empty() || indent_of(next) > base {
                    i += 1;
                } else {
                    break;
                }
            }
            continue;
        }
        out.push(line);
        i += 1;
    }

    out.join("\n")
}

/// Drops `def` blocks whose name never appears outside their own body.
/// Code that only lives in a function nobody calls is not executed.
fn drop_unreferenced_functions(source: &str) -> String {
    let def_re = Regex::new(r"^(\s*)def\s+([A-Za-z_][A-Za-z0-9_]*)").expect("static pattern");
    let lines: Vec<&str> = source.lines().collect();

    // Block extents per function definition.
    let mut blocks: Vec<(usize, usize, String)> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if let Some(caps) = def_re.captures(lines[i]) {
            let base = caps[1].chars().count();
            let name = caps[2].to_string();
            let start = i;
            i += 1;
            while i < lines.len() {
                let line = lines[i];
                if line.trim().is_empty() || indent_of(line) > base {
                    i += 1;
                } else {
                    break;
                }
            }
            blocks.push((start, i, name));
            continue;
        }
        i += 1;
    }

    let mut dropped = vec![false; lines.len()];
    for (start, end, name) in &blocks {
        let name_re =
            Regex::new(&format!(r"\b{}\b", regex::escape(name))).expect("escaped identifier");
        let referenced = lines
            .iter()
            .enumerate()
            .filter(|(idx, _)| idx < start || idx >= end)
            .any(|(_, line)| name_re.is_match(line));
        if !referenced {
            for flag in dropped.iter_mut().take(*end).skip(*start) {
                *flag = true;
            }
        }
    }

    lines
        .iter()
        .enumerate()
        .filter(|(idx, _)| !dropped[*idx])
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// True if the parsing library is imported in executed code.
fn imports_library(source: &str) -> bool {
    Regex::new(r"(?m)^\s*(?:import\s+bs4\b|from\s+bs4(?:\.\w+)*\s+import\b)")
        .expect("static pattern")
        .is_match(source)
}

/// Names the parser constructor is visible under: `BeautifulSoup` plus
/// any `from bs4 import BeautifulSoup as X` alias.
fn constructor_names(source: &str) -> Vec<String> {
    let mut names = vec!["BeautifulSoup".to_string()];
    let alias_re =
        Regex::new(r"(?m)^\s*from\s+bs4\s+import\s+BeautifulSoup\s+as\s+([A-Za-z_]\w*)")
            .expect("static pattern");
    for caps in alias_re.captures_iter(source) {
        names.push(caps[1].to_string());
    }
    names
}

/// Identifiers that carry the live input: the binding itself plus the
/// transitive closure of plain assignments (`page = document`).
fn live_aliases(source: &str) -> Vec<String> {
    let assign_re =
        Regex::new(r"(?m)^\s*([A-Za-z_]\w*)\s*=\s*([A-Za-z_]\w*)\s*$").expect("static pattern");
    let mut aliases = vec![LIVE_INPUT_BINDING.to_string()];
    loop {
        let mut changed = false;
        for caps in assign_re.captures_iter(source) {
            let (lhs, rhs) = (caps[1].to_string(), caps[2].to_string());
            if aliases.contains(&rhs) && !aliases.contains(&lhs) {
                aliases.push(lhs);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    aliases
}

/// One detected constructor call.
struct Construction {
    /// Assigned variable, when the call is the rhs of an assignment.
    var: Option<String>,
    /// True if the first argument is the live input (or an alias of it),
    /// not a literal or an unrelated variable.
    live: bool,
}

/// True if `arg` begins with a live-input identifier (allowing slices
/// like `document[:500]` but rejecting literals and unrelated names).
fn arg_is_live(arg: &str, aliases: &[String]) -> bool {
    let arg = arg.trim();
    let ident: String = arg
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if ident.is_empty() {
        return false;
    }
    aliases.iter().any(|a| a == &ident)
}

/// Finds every constructor call and classifies its first argument.
fn constructions(source: &str, aliases: &[String]) -> Vec<Construction> {
    let ctor_alt = constructor_names(source)
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    let call_re = Regex::new(&format!(
        r"(?:([A-Za-z_]\w*)\s*=\s*)?(?:bs4\s*\.\s*)?\b(?:{})\s*\(\s*([^,()\n]*)",
        ctor_alt
    ))
    .expect("constructor pattern");

    call_re
        .captures_iter(source)
        .map(|caps| Construction {
            var: caps.get(1).map(|m| m.as_str().to_string()),
            live: arg_is_live(caps.get(2).map(|m| m.as_str()).unwrap_or(""), aliases),
        })
        .collect()
}

/// True if any live-parse variable is interrogated with a query method.
fn queried(source: &str, live_vars: &[&str]) -> bool {
    live_vars.iter().any(|var| {
        let re = Regex::new(&format!(
            r"\b{}\s*\.\s*(?:{})\b",
            regex::escape(var),
            QUERY_METHODS
        ))
        .expect("query pattern");
        re.is_match(source)
    })
}

/// Catches the chained form `BeautifulSoup(document, ...).find(...)`
/// where no variable is ever bound.
fn chained_live_query(source: &str, aliases: &[String]) -> bool {
    let ctor_alt = constructor_names(source)
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    let re = Regex::new(&format!(
        r"(?:bs4\s*\.\s*)?\b(?:{})\s*\(\s*([^()\n]*)\)\s*\.\s*(?:{})\b",
        ctor_alt, QUERY_METHODS
    ))
    .expect("chained pattern");
    let found = re.captures_iter(source).any(|caps| {
        let args = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let first = args.split(',').next().unwrap_or("");
        arg_is_live(first, aliases)
    });
    found
}
