// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Module for reading violation witnesses in the GraphML exchange format, checking that they
//! describe a single execution, and extracting the values the verifier recorded along it.

use crate::util;
use anyhow::{Context, Result, bail};
use polywit_metadata::{Assumption, Position, SourceLanguage};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, warn};

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

/// Graph-level keys.
const WITNESS_TYPE: &str = "witness-type";
const SOURCE_CODE_LANG: &str = "sourcecodelang";
const PRODUCER: &str = "producer";
const VIOLATION_WITNESS: &str = "violation_witness";

/// Node keys.
const IS_ENTRY_NODE: &str = "isEntryNode";
const IS_VIOLATION_NODE: &str = "isViolationNode";

/// Edge keys.
const ASSUMPTION: &str = "assumption";
const ASSUMPTION_SCOPE: &str = "assumption.scope";
const ORIGIN_FILE_NAME: &str = "originFileName";
const START_LINE: &str = "startline";

/// GDart writes numbers as plain literals and strings through `equals`/`parseX` calls.
const GDART_ASSUMPTION_RE: &str = r#"=\s?(-?\d*\.?\d+|false|true)|\w+\.equals\("(.*)"\)|\w+\.parseDouble\("(.*)"\)|\w+\.parseFloat\("(.*)"\)"#;
const JAVA_ASSUMPTION_RE: &str =
    r#"=\s?(\S+)|\w+\.equals\("(.*)"\)|(-?\d*\.?\d+[L]?)|(false|true|null)"#;
const KOTLIN_ASSUMPTION_RE: &str = r#"= ((-?\d*\.?\d+[L]?)|(\S+)|(false|true|null))"#;

/// The producer whose assumptions follow [`GDART_ASSUMPTION_RE`].
const GDART: &str = "GDart";

/// `("...<...>...")` string literals in assumptions are not escaped by some producers.
static UNESCAPED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\("(.*)<(.*)>(.*)"\)"#).unwrap());
static LONG_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+[lL]$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessNode {
    pub id: String,
    pub data: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessEdge {
    pub source: String,
    pub target: String,
    pub data: HashMap<String, String>,
}

/// A witness graph. Data values are keyed by the `attr.name` of their `<key>` declaration,
/// falling back to the key id for undeclared keys.
#[derive(Debug, Clone, Default)]
pub struct Witness {
    pub graph_data: HashMap<String, String>,
    pub nodes: Vec<WitnessNode>,
    /// Edges in document order.
    pub edges: Vec<WitnessEdge>,
}

/// Escape the angle brackets of string literals so that the witness is well-formed XML.
pub fn preprocess(raw: &str) -> String {
    UNESCAPED_LITERAL.replace_all(raw, r#"("${1}&lt;${2}&gt;${3}")"#).into_owned()
}

impl Witness {
    /// Read, preprocess and parse a witness file.
    pub fn read(path: &Path) -> Result<Witness> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read witness `{}`", path.display()))?;
        Witness::parse(&preprocess(&raw)).context("Witness file is not formatted correctly")
    }

    pub fn parse(xml: &str) -> Result<Witness> {
        let document = roxmltree::Document::parse(xml)?;
        let root = document.root_element();
        if root.tag_name().name() != "graphml" {
            bail!("Expected a `graphml` document, found `{}`", root.tag_name().name());
        }

        let key_names: HashMap<&str, &str> = root
            .children()
            .filter(|n| is_element(n, "key"))
            .filter_map(|n| {
                let id = n.attribute("id")?;
                Some((id, n.attribute("attr.name").unwrap_or(id)))
            })
            .collect();

        let Some(graph) = root.children().find(|n| is_element(n, "graph")) else {
            bail!("Witness does not contain a graph");
        };

        let mut witness = Witness { graph_data: read_data(&graph, &key_names), ..Witness::default() };
        for child in graph.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "node" => {
                    let Some(id) = child.attribute("id") else { bail!("Witness node without an id") };
                    witness
                        .nodes
                        .push(WitnessNode { id: id.to_string(), data: read_data(&child, &key_names) });
                }
                "edge" => {
                    let (Some(source), Some(target)) =
                        (child.attribute("source"), child.attribute("target"))
                    else {
                        bail!("Witness edge without a source or a target");
                    };
                    witness.edges.push(WitnessEdge {
                        source: source.to_string(),
                        target: target.to_string(),
                        data: read_data(&child, &key_names),
                    });
                }
                _ => {}
            }
        }
        debug!(nodes = witness.nodes.len(), edges = witness.edges.len(), "parse_witness");
        Ok(witness)
    }

    pub fn graph_value(&self, key: &str) -> Option<&str> {
        self.graph_data.get(key).map(String::as_str)
    }

    pub fn producer(&self) -> Option<&str> {
        self.graph_value(PRODUCER)
    }

    /// The language the witness declares, if it declares one.
    pub fn language(&self) -> Result<Option<SourceLanguage>> {
        match self.graph_value(SOURCE_CODE_LANG) {
            None => Ok(None),
            Some(lang) => SourceLanguage::from_str(lang)
                .map(Some)
                .map_err(|_| anyhow::anyhow!("No support for language {lang}")),
        }
    }

    /// Check the witness is a linear violation witness for a supported language.
    pub fn check(&self) -> Result<()> {
        match self.graph_value(WITNESS_TYPE) {
            Some(VIOLATION_WITNESS) => {}
            Some(other) => bail!("No support for {other}"),
            None => {
                warn!("witness has no witness-type");
                util::warning("violation_witness not in witness, potentially unsupported");
            }
        }
        if self.language()?.is_none() {
            warn!("witness has no sourcecodelang");
            util::warning("sourcecodelang not in witness, potentially unsupported");
        }
        self.check_linearity()
    }

    /// A witness is linear if exactly one path leads from its entry node to its violation node.
    pub fn check_linearity(&self) -> Result<()> {
        let entries = self.flagged_nodes(IS_ENTRY_NODE);
        let [entry] = entries.as_slice() else {
            bail!("Witness does not have a single entry node");
        };
        let violations = self.flagged_nodes(IS_VIOLATION_NODE);
        let violation = match violations.as_slice() {
            [] => bail!("No support for non violation-witnesses"),
            [violation] => *violation,
            _ => bail!("Witness does not have a single violation node"),
        };
        if self.count_simple_paths(entry, violation, 2) > 1 {
            bail!("Witness has multiple execution paths from source to sink");
        }
        Ok(())
    }

    /// Nodes whose boolean `key` is set. GraphML booleans may be written `true`, `True` or `1`.
    fn flagged_nodes(&self, key: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| {
                node.data.get(key).is_some_and(|v| {
                    let v = v.trim();
                    v.eq_ignore_ascii_case("true") || v == "1"
                })
            })
            .map(|node| node.id.as_str())
            .collect()
    }

    /// Count the simple paths from `source` to `target`, stopping once `limit` are found.
    ///
    /// The walk keeps its own stack of `(node, next successor)` frames, so the length of a path
    /// is bounded by memory and not by the thread stack.
    fn count_simple_paths(&self, source: &str, target: &str, limit: usize) -> usize {
        let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            successors.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        }
        if source == target {
            return 1;
        }

        let mut found = 0;
        let mut on_path: HashSet<&str> = HashSet::from([source]);
        let mut stack: Vec<(&str, usize)> = vec![(source, 0)];
        while let Some((node, next)) = stack.last_mut() {
            let Some(&succ) = successors.get(*node).and_then(|succs| succs.get(*next)) else {
                on_path.remove(*node);
                stack.pop();
                continue;
            };
            *next += 1;
            if succ == target {
                found += 1;
                if found >= limit {
                    break;
                }
            } else if on_path.insert(succ) {
                stack.push((succ, 0));
            }
        }
        found
    }

    /// Extract the values recorded on the edges of the witness, in document order.
    pub fn extract_assumptions(&self, language: SourceLanguage) -> Result<Vec<Assumption>> {
        let producer = self.producer();
        let extractor = ValueExtractor::get(language, producer);
        let mut assumptions = vec![];
        for edge in self.edges.iter().filter(|e| e.data.contains_key(ASSUMPTION_SCOPE)) {
            let (Some(origin), Some(line), Some(assumption)) = (
                edge.data.get(ORIGIN_FILE_NAME),
                edge.data.get(START_LINE),
                edge.data.get(ASSUMPTION),
            ) else {
                bail!("Assumption edge {} -> {} is missing its location", edge.source, edge.target);
            };
            let Some(file) = util::file_stem(Path::new(origin)) else {
                bail!("Invalid origin file name `{origin}`");
            };
            if language == SourceLanguage::Kotlin && !edge.data[ASSUMPTION_SCOPE].contains(&file) {
                continue;
            }
            let line: u64 = line
                .trim()
                .parse()
                .with_context(|| format!("Invalid start line `{line}` in witness"))?;
            match extractor.extract(assumption) {
                Some(value) => assumptions.push(Assumption { position: Position::new(file, line), value }),
                None => debug!(%assumption, "no_value"),
            }
        }
        Ok(assumptions)
    }
}

fn is_element(node: &roxmltree::Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace().is_none_or(|ns| ns == GRAPHML_NS)
}

fn read_data(node: &roxmltree::Node, key_names: &HashMap<&str, &str>) -> HashMap<String, String> {
    node.children()
        .filter(|n| is_element(n, "data"))
        .filter_map(|n| {
            let key = n.attribute("key")?;
            let name = key_names.get(key).copied().unwrap_or(key);
            Some((name.to_string(), n.text().unwrap_or_default().to_string()))
        })
        .collect()
}

/// Pulls the recorded value out of an assumption such as `x = 5;`.
struct ValueExtractor {
    regex: Regex,
    /// The same pattern without the leading assignment, for values returned by a call.
    fallback: Regex,
}

static GDART_VALUES: LazyLock<ValueExtractor> =
    LazyLock::new(|| ValueExtractor::compile(GDART_ASSUMPTION_RE, "="));
static JAVA_VALUES: LazyLock<ValueExtractor> =
    LazyLock::new(|| ValueExtractor::compile(JAVA_ASSUMPTION_RE, "="));
static KOTLIN_VALUES: LazyLock<ValueExtractor> =
    LazyLock::new(|| ValueExtractor::compile(KOTLIN_ASSUMPTION_RE, "= "));

impl ValueExtractor {
    fn compile(pattern: &str, assignment: &str) -> Self {
        ValueExtractor {
            regex: Regex::new(pattern).unwrap(),
            fallback: Regex::new(&pattern[assignment.len()..]).unwrap(),
        }
    }

    fn get(language: SourceLanguage, producer: Option<&str>) -> &'static ValueExtractor {
        match (language, producer) {
            (SourceLanguage::Java, Some(GDART)) => &*GDART_VALUES,
            (SourceLanguage::Java, _) => &*JAVA_VALUES,
            (SourceLanguage::Kotlin, _) => &*KOTLIN_VALUES,
        }
    }

    fn extract(&self, assumption: &str) -> Option<String> {
        let value = last_capture(&self.regex, assumption)
            .or_else(|| last_capture(&self.fallback, assumption))?;
        let value = value.strip_suffix(';').unwrap_or(value);
        Some(normalize(value))
    }
}

/// The last group that took part in the first match.
fn last_capture<'a>(regex: &Regex, text: &'a str) -> Option<&'a str> {
    let captures = regex.captures(text)?;
    captures.iter().skip(1).flatten().last().map(|m| m.as_str())
}

/// Rewrite Java spellings of values into the literal the replay library parses.
fn normalize(value: &str) -> String {
    match value {
        "Double.NaN" | "Float.NaN" => "NaN".to_string(),
        "Double.POSITIVE_INFINITY" | "Float.POSITIVE_INFINITY" => "Infinity".to_string(),
        "Double.NEGATIVE_INFINITY" | "Float.NEGATIVE_INFINITY" => "-Infinity".to_string(),
        _ if LONG_LITERAL.is_match(value) => value[..value.len() - 1].to_string(),
        _ => value.to_string(),
    }
}
