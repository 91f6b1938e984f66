//! Seeding-order computation over the belongsTo dependency graph.
//!
//! An entity must be seeded after every entity it belongs to. Cycles are
//! broken by dropping the back-edge rather than failing the run; the
//! validator surfaces cycle presence as a warning so the permissive
//! behavior is visible.
use crate::schema::Schema;
use std::collections::HashSet;

/// Topologically sort entity names so every entity appears after all
/// entities it `belongsTo`, where resolvable. Deterministic: entities
/// with no dependencies keep declaration order.
pub fn seeding_order(schema: &Schema) -> Vec<String> {
    let mut ordered = Vec::with_capacity(schema.entities.len());
    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();

    for name in schema.entities.keys() {
        visit(schema, name, &mut visited, &mut in_progress, &mut ordered);
    }

    ordered
}

/// Iterative DFS. A target already in the in-progress set is a back-edge
/// and is skipped instead of re-descended.
fn visit(
    schema: &Schema,
    name: &str,
    visited: &mut HashSet<String>,
    in_progress: &mut HashSet<String>,
    ordered: &mut Vec<String>,
) {
    if visited.contains(name) {
        return;
    }

    // Explicit stack of (entity, next-dependency index) frames.
    let mut stack: Vec<(String, usize)> = vec![(name.to_string(), 0)];
    in_progress.insert(name.to_string());

    while let Some((current, dep_index)) = stack.pop() {
        let deps: Vec<String> = schema
            .entities
            .get(&current)
            .map(|entity| {
                entity
                    .belongs_to_targets()
                    .into_iter()
                    .filter(|target| schema.entities.contains_key(*target))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        match deps.get(dep_index) {
            Some(dep) if visited.contains(dep) || in_progress.contains(dep) => {
                stack.push((current, dep_index + 1));
            }
            Some(dep) => {
                stack.push((current, dep_index + 1));
                in_progress.insert(dep.clone());
                stack.push((dep.clone(), 0));
            }
            None => {
                in_progress.remove(&current);
                if visited.insert(current.clone()) {
                    ordered.push(current);
                }
            }
        }
    }
}

/// Entities involved in at least one belongsTo cycle, in declaration
/// order. Empty when the graph is acyclic.
pub fn cycle_members(schema: &Schema) -> Vec<String> {
    let mut members = Vec::new();
    for start in schema.entities.keys() {
        if reachable_from_self(schema, start) && !members.contains(start) {
            members.push(start.clone());
        }
    }
    members
}

fn reachable_from_self(schema: &Schema, start: &str) -> bool {
    let mut stack: Vec<&str> = schema
        .entities
        .get(start)
        .map(|e| e.belongs_to_targets())
        .unwrap_or_default();
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == start {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(entity) = schema.entities.get(current) {
            stack.extend(entity.belongs_to_targets());
        }
    }
    false
}
