//! Skill tree flattening.
//!
//! The engine hands over skills as an arbitrarily nested tree of categories.
//! Only leaves carry data. A leaf is an object with `_canDevelop: true`, either
//! directly or one level down under the `system` wrapper key; everything else
//! is a container whose children are walked, except the wrapper key itself,
//! which has already been inspected.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use super::ExtractContext;
use crate::document::{SkillEntry, SkillGroup};
use crate::format::format_signed_bonus;
use crate::i18n::{key_fragment, resolve_label};
use crate::options::SectionKey;
use crate::source::{WRAPPER_KEY, first_of, flag, number, text};

const LEAF_MARKER: &str = "_canDevelop";
const DEFAULT_CATEGORY: &str = "General";

/// How a single tree node is treated during traversal.
#[derive(Debug, Clone, Copy)]
pub enum SkillNode<'a> {
    /// Skill data, either found directly or unwrapped from `system`.
    Leaf(&'a Map<String, Value>),
    /// Object whose children (minus the wrapper key) are further nodes.
    Group(&'a Map<String, Value>),
    /// Array whose elements are further nodes.
    List(&'a [Value]),
    /// Scalars and nulls; nothing to visit.
    Empty,
}

impl<'a> SkillNode<'a> {
    pub fn classify(node: &'a Value) -> Self {
        match node {
            Value::Array(items) => Self::List(items),
            Value::Object(map) => {
                if flag(map.get(LEAF_MARKER)) {
                    return Self::Leaf(map);
                }
                if let Some(Value::Object(inner)) = map.get(WRAPPER_KEY)
                    && flag(inner.get(LEAF_MARKER))
                {
                    return Self::Leaf(inner);
                }
                Self::Group(map)
            }
            _ => Self::Empty,
        }
    }
}

/// Every leaf under `root`, depth first, each visited exactly once.
///
/// Uses an explicit stack so deeply nested trees cannot exhaust the call stack.
pub fn collect_leaves(root: &Value) -> Vec<&Map<String, Value>> {
    let mut leaves = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match SkillNode::classify(node) {
            SkillNode::Leaf(data) => leaves.push(data),
            SkillNode::List(items) => stack.extend(items.iter().rev()),
            SkillNode::Group(map) => stack.extend(
                map.iter()
                    .filter(|(key, _)| key.as_str() != WRAPPER_KEY)
                    .map(|(_, child)| child)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev(),
            ),
            SkillNode::Empty => {}
        }
    }

    leaves
}

pub fn extract(ctx: &ExtractContext<'_>) -> Option<Vec<SkillGroup>> {
    if !ctx.enabled(SectionKey::Skills) {
        return None;
    }

    let Some(tree) = first_of(ctx.system(), &[&["_skills"], &["skills"]]) else {
        return Some(Vec::new());
    };

    let show_all = ctx.options.show_all_skills;
    let mut grouped: BTreeMap<String, Vec<SkillEntry>> = BTreeMap::new();

    for skill in collect_leaves(tree) {
        let ranks = number(first_of_map(skill, &["_totalRanks", "totalRanks", "ranks"]))
            .unwrap_or_else(|| Number::from(0));
        let favorite = flag(skill.get("favorite"));
        let ranked = ranks.as_f64().is_some_and(|r| r > 0.0);
        if !(show_all || ranked || favorite) {
            continue;
        }

        let category = text(skill.get("category")).unwrap_or(DEFAULT_CATEGORY);
        grouped
            .entry(category.to_string())
            .or_default()
            .push(SkillEntry {
                name: text(skill.get("name")).unwrap_or("Unknown").to_string(),
                specialisation: text(skill.get("specialization"))
                    .unwrap_or_default()
                    .to_string(),
                ranks,
                bonus: format_signed_bonus(first_of_map(skill, &["_bonus", "bonus"])),
                favorite,
            });
    }

    let mut groups: Vec<SkillGroup> = grouped
        .into_iter()
        .filter(|(_, list)| !list.is_empty())
        .map(|(category, mut list)| {
            list.sort_by(|a, b| compare_names(&a.name, &b.name));
            SkillGroup {
                label: resolve_label(
                    ctx.labels,
                    &format!("RMU.SkillCategory.{}", key_fragment(&category)),
                    &category,
                ),
                category,
                list,
            }
        })
        .collect();
    groups.sort_by(|a, b| compare_names(&a.label, &b.label));

    Some(groups)
}

fn first_of_map<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
}

/// Case-insensitive first, raw order as the tie-break.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
