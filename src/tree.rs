//! Command tree consumed by the interpreter.
//!
//! The tree is produced by an external parser and is read-only from the point of
//! view of this crate. It can be built in memory with the constructors below, or
//! decoded from its JSON form with [`CommandNode::from_json`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One piece of a [`Word`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordPart {
    /// Text taken as-is.
    Literal(String),
    /// `$NAME`: substituted with the value of an environment variable.
    Var(String),
}

/// A shell word: parts that are concatenated when the word is resolved.
///
/// In JSON a word is either a plain string (a single literal part) or an array of
/// parts such as `[{"literal": "x"}, {"var": "HOME"}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WordRepr", into = "WordRepr")]
pub struct Word {
    parts: Vec<WordPart>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WordRepr {
    Text(String),
    Parts(Vec<WordPart>),
}

impl From<WordRepr> for Word {
    fn from(repr: WordRepr) -> Self {
        match repr {
            WordRepr::Text(s) => Word::literal(s),
            WordRepr::Parts(parts) => Word { parts },
        }
    }
}

impl From<Word> for WordRepr {
    fn from(word: Word) -> Self {
        match word.parts.as_slice() {
            [WordPart::Literal(s)] => WordRepr::Text(s.clone()),
            _ => WordRepr::Parts(word.parts),
        }
    }
}

impl Word {
    pub fn literal(s: impl Into<String>) -> Self {
        Word {
            parts: vec![WordPart::Literal(s.into())],
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Word {
            parts: vec![WordPart::Var(name.into())],
        }
    }

    pub fn from_parts(parts: Vec<WordPart>) -> Self {
        Word { parts }
    }

    pub fn parts(&self) -> &[WordPart] {
        &self.parts
    }

    /// True when the word can only ever resolve to the empty string.
    pub fn is_empty(&self) -> bool {
        self.parts
            .iter()
            .all(|p| matches!(p, WordPart::Literal(s) if s.is_empty()))
    }

    /// Resolve the word against the current process environment.
    ///
    /// Unset variables substitute to the empty string, like in POSIX shells.
    pub fn resolve(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                WordPart::Literal(text) => out.push_str(text),
                WordPart::Var(name) => {
                    if let Some(value) = crate::env::get_var(name) {
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }

    /// Split `NAME`, `=`, `value...` into the variable name and its value word.
    ///
    /// Returns `None` unless the first part is a literal immediately followed by
    /// a literal `=` part. The value may be empty (`NAME=`).
    pub fn as_assignment(&self) -> Option<(&str, Word)> {
        match self.parts.as_slice() {
            [WordPart::Literal(name), WordPart::Literal(eq), rest @ ..] if eq == "=" => {
                Some((name.as_str(), Word::from_parts(rest.to_vec())))
            }
            _ => None,
        }
    }
}

impl From<&str> for Word {
    fn from(s: &str) -> Self {
        Word::literal(s)
    }
}

impl From<String> for Word {
    fn from(s: String) -> Self {
        Word::literal(s)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                WordPart::Literal(s) => write!(f, "{}", s)?,
                WordPart::Var(name) => write!(f, "${}", name)?,
            }
        }
        Ok(())
    }
}

/// A leaf of the tree: verb, parameters and optional redirections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleCommand {
    /// Program or builtin name (`argv[0]`), or `NAME`,`=`,`value` for an assignment.
    pub verb: Word,
    /// Parameters, `argv[1..]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Word>,
    /// `< file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Word>,
    /// `> file`, or `>> file` when `append_output` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Word>,
    /// `2> file`, or `2>> file` when `append_error` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Word>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub append_output: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub append_error: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl SimpleCommand {
    pub fn new(verb: impl Into<Word>) -> Self {
        Self {
            verb: verb.into(),
            params: Vec::new(),
            input: None,
            output: None,
            error: None,
            append_output: false,
            append_error: false,
        }
    }

    /// `name=value`, with the value kept as a word so it can carry substitutions.
    pub fn assignment(name: &str, value: impl Into<Word>) -> Self {
        let mut parts = vec![
            WordPart::Literal(name.to_string()),
            WordPart::Literal("=".to_string()),
        ];
        parts.extend(value.into().parts);
        Self::new(Word::from_parts(parts))
    }

    pub fn arg(mut self, param: impl Into<Word>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn args<I, W>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<Word>,
    {
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    pub fn stdin_from(mut self, target: impl Into<Word>) -> Self {
        self.input = Some(target.into());
        self
    }

    pub fn stdout_to(mut self, target: impl Into<Word>) -> Self {
        self.output = Some(target.into());
        self.append_output = false;
        self
    }

    pub fn stdout_append(mut self, target: impl Into<Word>) -> Self {
        self.output = Some(target.into());
        self.append_output = true;
        self
    }

    pub fn stderr_to(mut self, target: impl Into<Word>) -> Self {
        self.error = Some(target.into());
        self.append_error = false;
        self
    }

    pub fn stderr_append(mut self, target: impl Into<Word>) -> Self {
        self.error = Some(target.into());
        self.append_error = true;
        self
    }

    /// Resolved argument vector: the verb followed by every parameter.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(&self.verb)
            .chain(&self.params)
            .map(Word::resolve)
            .collect()
    }
}

/// Operator tag of an internal node.
///
/// Serialized as a string; both the names (`"pipe"`) and the shell spellings
/// (`"|"`) are accepted. Any other tag is kept as [`Operator::Unknown`] and makes
/// the evaluation fail with [`INVALID_TREE`](crate::command::INVALID_TREE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    /// `;` — run right after left, unconditionally
    Sequential,
    /// `&` — run both sides concurrently
    Parallel,
    /// `|` — left's stdout feeds right's stdin
    Pipe,
    /// `&&` — run right only if left succeeded
    And,
    /// `||` — run right only if left failed
    Or,
    /// Tag not understood by this crate.
    Unknown(String),
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Sequential => ";",
            Operator::Parallel => "&",
            Operator::Pipe => "|",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Unknown(tag) => tag,
        }
    }
}

impl From<String> for Operator {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "sequential" | ";" => Operator::Sequential,
            "parallel" | "&" => Operator::Parallel,
            "pipe" | "|" => Operator::Pipe,
            "and" | "&&" => Operator::And,
            "or" | "||" => Operator::Or,
            _ => Operator::Unknown(tag),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Sequential => "sequential".into(),
            Operator::Parallel => "parallel".into(),
            Operator::Pipe => "pipe".into(),
            Operator::And => "and".into(),
            Operator::Or => "or".into(),
            Operator::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandNode {
    /// Leaf: exactly one simple command.
    Simple(SimpleCommand),
    /// Internal node: an operator over exactly two sub-trees.
    Compound {
        op: Operator,
        left: Box<CommandNode>,
        right: Box<CommandNode>,
    },
}

impl CommandNode {
    pub fn simple(cmd: SimpleCommand) -> Self {
        CommandNode::Simple(cmd)
    }

    pub fn compound(op: Operator, left: CommandNode, right: CommandNode) -> Self {
        CommandNode::Compound {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn sequential(left: CommandNode, right: CommandNode) -> Self {
        Self::compound(Operator::Sequential, left, right)
    }

    pub fn parallel(left: CommandNode, right: CommandNode) -> Self {
        Self::compound(Operator::Parallel, left, right)
    }

    pub fn pipe(left: CommandNode, right: CommandNode) -> Self {
        Self::compound(Operator::Pipe, left, right)
    }

    pub fn and(left: CommandNode, right: CommandNode) -> Self {
        Self::compound(Operator::And, left, right)
    }

    pub fn or(left: CommandNode, right: CommandNode) -> Self {
        Self::compound(Operator::Or, left, right)
    }

    /// Operator of an internal node; `None` for a leaf.
    pub fn operator(&self) -> Option<&Operator> {
        match self {
            CommandNode::Simple(_) => None,
            CommandNode::Compound { op, .. } => Some(op),
        }
    }

    /// Decode a tree from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to decode command tree")
    }

    /// Encode the tree to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to encode command tree")
    }
}

impl From<SimpleCommand> for CommandNode {
    fn from(cmd: SimpleCommand) -> Self {
        CommandNode::Simple(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_decodes_from_string_or_parts() {
        let plain: Word = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(plain, Word::literal("hello"));

        let parts: Word = serde_json::from_str(r#"[{"literal": "a"}, {"var": "B"}]"#).unwrap();
        assert_eq!(
            parts.parts(),
            &[
                WordPart::Literal("a".into()),
                WordPart::Var("B".into())
            ]
        );
        assert_eq!(parts.to_string(), "a$B");
    }

    #[test]
    fn test_word_resolves_literals_and_unset_vars() {
        let word = Word::from_parts(vec![
            WordPart::Literal("pre-".into()),
            WordPart::Var("MINISHELL_TREE_TEST_SURELY_UNSET".into()),
            WordPart::Literal("-post".into()),
        ]);
        assert_eq!(word.resolve(), "pre--post");
    }

    #[test]
    fn test_word_emptiness() {
        assert!(Word::literal("").is_empty());
        assert!(Word::from_parts(vec![]).is_empty());
        assert!(!Word::literal("ls").is_empty());
        assert!(!Word::var("X").is_empty());
    }

    #[test]
    fn test_assignment_split() {
        let cmd = SimpleCommand::assignment("GREETING", "hi");
        let (name, value) = cmd.verb.as_assignment().expect("assignment");
        assert_eq!(name, "GREETING");
        assert_eq!(value, Word::literal("hi"));

        let empty = SimpleCommand::assignment("EMPTY", Word::from_parts(vec![]));
        let (_, value) = empty.verb.as_assignment().expect("assignment");
        assert!(value.is_empty());

        assert!(Word::literal("A=b").as_assignment().is_none());
        assert!(Word::var("A").as_assignment().is_none());
    }

    #[test]
    fn test_operator_accepts_names_and_symbols() {
        for (tag, op) in [
            (";", Operator::Sequential),
            ("sequential", Operator::Sequential),
            ("&", Operator::Parallel),
            ("pipe", Operator::Pipe),
            ("&&", Operator::And),
            ("or", Operator::Or),
        ] {
            assert_eq!(Operator::from(tag.to_string()), op, "tag: {}", tag);
        }
        assert_eq!(
            Operator::from("|&".to_string()),
            Operator::Unknown("|&".into())
        );
    }

    #[test]
    fn test_tree_from_json() {
        let json = r#"{"compound": {"op": "&&",
            "left": {"simple": {"verb": "true"}},
            "right": {"simple": {"verb": "echo", "params": ["hi"],
                                 "output": "out.txt", "append_output": true}}}}"#;
        let tree = CommandNode::from_json(json).unwrap();
        let expected = CommandNode::and(
            SimpleCommand::new("true").into(),
            SimpleCommand::new("echo")
                .arg("hi")
                .stdout_append("out.txt")
                .into(),
        );
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_tree_json_keeps_unknown_operator() {
        let tree = CommandNode::compound(
            Operator::Unknown("<>".into()),
            SimpleCommand::new("a").into(),
            SimpleCommand::new("b").into(),
        );
        let json = tree.to_json().unwrap();
        assert_eq!(CommandNode::from_json(&json).unwrap(), tree);
    }

    #[test]
    fn test_tree_from_json_rejects_garbage() {
        assert!(CommandNode::from_json(r#"{"simple": {}}"#).is_err());
        assert!(CommandNode::from_json("not json").is_err());
    }

    #[test]
    fn test_argv_resolves_verb_and_params() {
        let cmd = SimpleCommand::new("printf").args(["%s\n", "x"]);
        assert_eq!(cmd.argv(), vec!["printf", "%s\n", "x"]);
    }
}
