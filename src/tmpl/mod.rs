//! `{{name}}` placeholder templates for command strings.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::{CmdError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template(pub Vec<Segment>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Lit(String),
    Var(String),
}

/// What to do with supplied values the template never references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnusedPolicy {
    #[default]
    Ignore,
    Reject,
}

pub trait VariableResolver {
    fn get(&self, key: &str) -> Option<String>;

    /// Every name this resolver can answer; only strict resolution asks.
    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<K, V> VariableResolver for HashMap<K, V>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
{
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| v.as_ref().to_string())
    }

    fn keys(&self) -> Vec<String> {
        HashMap::keys(self).map(|k| k.borrow().to_string()).collect()
    }
}

impl<K, V> VariableResolver for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).map(|v| v.as_ref().to_string())
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).map(|k| k.borrow().to_string()).collect()
    }
}

impl Template {
    /// Parse a string containing `{{name}}` placeholders.
    /// Names may use `A-Z`, `a-z`, `0-9`, `_`, `-` and `.`; surrounding
    /// whitespace inside the braces is ignored. Anything else between braces,
    /// and an unclosed `{{`, is kept as literal text.
    pub fn parse(input: &str) -> Self {
        let mut segs: Vec<Segment> = Vec::new();
        let mut lit = String::new();
        let mut rest = input;
        while let Some(open) = rest.find("{{") {
            lit.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let inner = after.find("}}").map(|close| (after[..close].trim(), close));
            match inner {
                Some((name, close)) if is_placeholder_name(name) => {
                    if !lit.is_empty() {
                        segs.push(Segment::Lit(std::mem::take(&mut lit)));
                    }
                    segs.push(Segment::Var(name.to_string()));
                    rest = &after[close + 2..];
                }
                // Step over one brace only, so `{{{x}}}` still finds `{{x}}`
                _ => {
                    lit.push('{');
                    rest = &rest[open + 1..];
                }
            }
        }
        lit.push_str(rest);
        if !lit.is_empty() {
            segs.push(Segment::Lit(lit));
        }
        Template(segs)
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for seg in &self.0 {
            if let Segment::Var(name) = seg {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }

    pub fn render<V>(&self, vars: &V, unused: UnusedPolicy) -> Result<String>
    where
        V: VariableResolver + ?Sized,
    {
        if unused == UnusedPolicy::Reject {
            let used = self.placeholders();
            let mut supplied = vars.keys();
            supplied.sort();
            if let Some(name) = supplied.into_iter().find(|k| !used.contains(&k.as_str())) {
                return Err(CmdError::PlaceholderUnused { name });
            }
        }

        let mut out = String::new();
        for seg in &self.0 {
            match seg {
                Segment::Lit(s) => out.push_str(s),
                Segment::Var(k) => match vars.get(k) {
                    Some(v) => out.push_str(&v),
                    None => return Err(CmdError::PlaceholderMissing { name: k.clone() }),
                },
            }
        }
        Ok(out)
    }
}

/// Substitute every `{{name}}` in `template`, ignoring unused values.
pub fn resolve_placeholders<V: VariableResolver + ?Sized>(template: &str, vars: &V) -> Result<String> {
    Template::parse(template).render(vars, UnusedPolicy::Ignore)
}

fn is_placeholder_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}
