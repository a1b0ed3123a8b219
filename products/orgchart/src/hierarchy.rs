use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use tracing::warn;

use crate::{
    error::{HierarchyError, HierarchyResult},
    name::last_name_key,
    record::{EmployeeRecord, OrgNode},
};

/// Result of a build: the sorted roots plus the records that were left out
/// because their manager chain ends at an unknown id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Forest {
    pub roots: Vec<OrgNode>,
    pub orphans: Vec<OrphanReference>,
}

impl Forest {
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(OrgNode::node_count).sum()
    }
}

/// `id` names a manager that is not in the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrphanReference {
    pub id: i32,
    pub manager_id: i32,
}

/// Deepest reporting chain accepted, counting the root as level 1. Deeper
/// chains fail the build with [`HierarchyError::MalformedInput`].
pub const MAX_REPORTING_DEPTH: usize = 256;

/// Build the org chart and log any orphan references.
pub fn build_hierarchy(records: &[EmployeeRecord]) -> HierarchyResult<Vec<OrgNode>> {
    let forest = build_forest(records)?;
    for orphan in &forest.orphans {
        warn!(
            id = orphan.id,
            manager_id = orphan.manager_id,
            "employee reports to an unknown manager; left out of the org chart"
        );
    }
    Ok(forest.roots)
}

/// Build the org chart, returning orphan references instead of logging them.
///
/// Siblings (and roots) are ordered by [`last_name_key`] using plain string
/// ordering, ties broken by ascending id. Duplicate ids keep the last record.
pub fn build_forest(records: &[EmployeeRecord]) -> HierarchyResult<Forest> {
    let builder = HierarchyBuilder::new(records)?;
    let mut placed = HashSet::with_capacity(builder.by_id.len());
    let roots = builder.roots(&mut placed)?;
    let orphans = builder.unplaced(&placed)?;
    Ok(Forest { roots, orphans })
}

struct HierarchyBuilder<'a> {
    by_id: HashMap<i32, &'a EmployeeRecord>,
    reports: HashMap<i32, Vec<i32>>,
}

impl<'a> HierarchyBuilder<'a> {
    fn new(records: &'a [EmployeeRecord]) -> HierarchyResult<Self> {
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            record.validate()?;
            if by_id.insert(record.id, record).is_some() {
                warn!(id = record.id, "duplicate employee id; keeping the last record");
            }
        }

        // Bucketed from the deduplicated map so a replaced record cannot
        // leave a stale entry under its old manager.
        let mut reports: HashMap<i32, Vec<i32>> = HashMap::new();
        for record in by_id.values() {
            if let Some(manager_id) = record.manager_id {
                reports.entry(manager_id).or_default().push(record.id);
            }
        }
        Ok(Self { by_id, reports })
    }

    /// Expand every root with an explicit stack, then assemble nodes from
    /// the deepest level up so neither step recurses per level.
    fn roots(&self, placed: &mut HashSet<i32>) -> HierarchyResult<Vec<OrgNode>> {
        let mut roots: Vec<&EmployeeRecord> = self
            .by_id
            .values()
            .copied()
            .filter(|record| record.manager_id.is_none())
            .collect();
        roots.sort_by(|a, b| sibling_order(a, b));

        // Pre-order visit list: each record with its sorted report ids.
        let mut visits: Vec<(&EmployeeRecord, Vec<i32>)> = Vec::with_capacity(self.by_id.len());
        let mut stack: Vec<(&EmployeeRecord, usize)> =
            roots.iter().rev().map(|record| (*record, 1)).collect();
        while let Some((record, depth)) = stack.pop() {
            if depth > MAX_REPORTING_DEPTH {
                return Err(HierarchyError::malformed(
                    record.id,
                    format!("reporting chain is deeper than {MAX_REPORTING_DEPTH} levels"),
                ));
            }
            // Backstop only: with one manager per id a root's subtree cannot
            // revisit an id. `unplaced` is what finds and reports cycles.
            if !placed.insert(record.id) {
                return Err(HierarchyError::cycle([record.id]));
            }
            let children = self.children_of(record.id);
            stack.extend(children.iter().rev().map(|child| (*child, depth + 1)));
            visits.push((record, children.iter().map(|child| child.id).collect()));
        }

        let mut built: HashMap<i32, OrgNode> = HashMap::with_capacity(visits.len());
        for (record, report_ids) in visits.into_iter().rev() {
            let reports = report_ids
                .iter()
                .filter_map(|id| built.remove(id))
                .collect();
            built.insert(
                record.id,
                OrgNode {
                    full_name: record.full_name.clone(),
                    title: record.title.clone(),
                    reports,
                },
            );
        }
        Ok(roots
            .iter()
            .filter_map(|record| built.remove(&record.id))
            .collect())
    }

    fn children_of(&self, manager_id: i32) -> Vec<&'a EmployeeRecord> {
        let mut children: Vec<&EmployeeRecord> = self
            .reports
            .get(&manager_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id).copied())
            .collect();
        children.sort_by(|a, b| sibling_order(a, b));
        children
    }

    /// Classify every record no root reached: either its manager chain ends
    /// at an unknown id (orphan, reported once at the head of the chain) or
    /// it loops (cycle, fatal).
    fn unplaced(&self, placed: &HashSet<i32>) -> HierarchyResult<Vec<OrphanReference>> {
        let mut pending: Vec<i32> = self
            .by_id
            .keys()
            .copied()
            .filter(|id| !placed.contains(id))
            .collect();
        pending.sort_unstable();

        let mut settled: HashSet<i32> = HashSet::new();
        let mut orphans = Vec::new();
        for start in pending {
            let mut chain: Vec<i32> = Vec::new();
            let mut on_chain: HashSet<i32> = HashSet::new();
            let mut current = start;
            while !settled.contains(&current) {
                if !on_chain.insert(current) {
                    let at = chain.iter().position(|id| *id == current).unwrap_or(0);
                    return Err(HierarchyError::cycle(chain[at..].iter().copied()));
                }
                chain.push(current);
                let Some(manager_id) = self.by_id.get(&current).and_then(|r| r.manager_id) else {
                    break;
                };
                if !self.by_id.contains_key(&manager_id) {
                    orphans.push(OrphanReference {
                        id: current,
                        manager_id,
                    });
                    break;
                }
                current = manager_id;
            }
            settled.extend(chain);
        }
        orphans.sort_unstable();
        Ok(orphans)
    }
}

fn sibling_order(a: &EmployeeRecord, b: &EmployeeRecord) -> Ordering {
    last_name_key(&a.full_name)
        .cmp(last_name_key(&b.full_name))
        .then(a.id.cmp(&b.id))
}
