//! Nesting a flat task list into blocks
//!
//! Todoist returns subtasks as a flat list where each task names its parent.
//! `TreeBuilder` groups the list by parent id once, walks it from the root
//! tasks, enriches every reachable task in depth-first pre-order and then
//! assembles the forest. Roots and siblings keep their relative input order.
//!
//! Tasks that cannot be reached from a root are left out: a parent id that is
//! not in the list, a task naming itself as parent, or a parent cycle. None of
//! these are validated beyond that; they simply never get visited.

use std::collections::HashMap;

use outline_api::{BlockProperties, BlockToInsert, DocumentPlatform};
use tracing::{info, warn};

use crate::comments::CommentEnricher;
use crate::error::EnrichmentError;
use crate::format::{task_content, FormatOptions};
use crate::models::TodoistTask;
use crate::settings::CommentFailurePolicy;
use crate::task_service::TaskService;

/// Outcome counters of one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Blocks in the resulting forest
    pub inserted: usize,
    /// Tasks not reachable from any root
    pub unreachable: Vec<String>,
    /// Tasks whose comments could not be fetched
    pub failed_enrichment: Vec<String>,
    /// Tasks left out under `CommentFailurePolicy::Skip`, descendants included
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BuiltTree {
    pub blocks: Vec<BlockToInsert>,
    pub report: BuildReport,
}

/// Traversal of the task list from its roots
struct Walk {
    /// Visited task indices in depth-first pre-order
    order: Vec<usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    visited: Vec<bool>,
}

impl Walk {
    fn new(tasks: &[TodoistTask]) -> Self {
        let mut by_parent: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (index, task) in tasks.iter().enumerate() {
            match task.parent() {
                Some(parent_id) => by_parent.entry(parent_id).or_default().push(index),
                None => roots.push(index),
            }
        }

        let mut walk = Walk {
            order: Vec::with_capacity(tasks.len()),
            parent: vec![None; tasks.len()],
            children: vec![Vec::new(); tasks.len()],
            roots: Vec::with_capacity(roots.len()),
            visited: vec![false; tasks.len()],
        };

        let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            if walk.visited[index] {
                continue;
            }
            walk.visited[index] = true;
            walk.order.push(index);
            match walk.parent[index] {
                Some(parent) => walk.children[parent].push(index),
                None => walk.roots.push(index),
            }

            if let Some(kids) = by_parent.get(tasks[index].id.as_str()) {
                for &kid in kids.iter().rev() {
                    if !walk.visited[kid] {
                        walk.parent[kid] = Some(index);
                        stack.push(kid);
                    }
                }
            }
        }
        walk
    }

    fn assemble(&self, index: usize, built: &mut [Option<BlockToInsert>]) -> Option<BlockToInsert> {
        let mut block = built[index].take()?;
        for &child in &self.children[index] {
            if let Some(child_block) = self.assemble(child, built) {
                block.children.push(child_block);
            }
        }
        Some(block)
    }
}

pub struct TreeBuilder<'a, S: ?Sized, P: ?Sized> {
    enricher: CommentEnricher<'a, S, P>,
    options: &'a FormatOptions,
    policy: CommentFailurePolicy,
}

impl<'a, S, P> TreeBuilder<'a, S, P>
where
    S: TaskService + ?Sized,
    P: DocumentPlatform + ?Sized,
{
    pub fn new(service: &'a S, platform: &'a P, options: &'a FormatOptions) -> Self {
        Self {
            enricher: CommentEnricher::new(service, platform),
            options,
            policy: CommentFailurePolicy::default(),
        }
    }

    /// Builder: set how comment fetch failures are handled
    pub fn with_policy(mut self, policy: CommentFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the block forest for `tasks`.
    ///
    /// Comment fetches run one at a time in pre-order, so siblings are
    /// enriched in input order. Fails only under `CommentFailurePolicy::Abort`.
    pub async fn build(&self, tasks: &[TodoistTask]) -> Result<BuiltTree, EnrichmentError> {
        let walk = Walk::new(tasks);
        let mut report = BuildReport::default();
        let mut built: Vec<Option<BlockToInsert>> = vec![None; tasks.len()];
        let mut skipped = vec![false; tasks.len()];

        for &index in &walk.order {
            let task = &tasks[index];
            if walk.parent[index].is_some_and(|parent| skipped[parent]) {
                skipped[index] = true;
                report.skipped.push(task.id.clone());
                continue;
            }

            let content = task_content(task, self.options);
            let block = BlockToInsert::new(content.clone(), BlockProperties::for_task(&task.id));

            match self.enricher.enrich(&task.id, block).await {
                Ok(block) => built[index] = Some(block),
                Err(e) => {
                    report.failed_enrichment.push(task.id.clone());
                    match self.policy {
                        CommentFailurePolicy::Placeholder => {
                            built[index] = Some(BlockToInsert::new(
                                content,
                                BlockProperties::for_task(&task.id),
                            ));
                        }
                        CommentFailurePolicy::Skip => {
                            skipped[index] = true;
                            report.skipped.push(task.id.clone());
                        }
                        CommentFailurePolicy::Abort => return Err(e),
                    }
                }
            }
        }

        let blocks: Vec<BlockToInsert> = walk
            .roots
            .iter()
            .filter_map(|&root| walk.assemble(root, &mut built))
            .collect();

        report.inserted = outline_api::forest_len(&blocks);
        report.unreachable = tasks
            .iter()
            .zip(&walk.visited)
            .filter(|(_, visited)| !**visited)
            .map(|(task, _)| task.id.clone())
            .collect();

        if !report.unreachable.is_empty() {
            warn!(
                "[TreeBuilder] {} task(s) have no reachable parent and were left out: {:?}",
                report.unreachable.len(),
                report.unreachable
            );
        }
        info!(
            "[TreeBuilder] Built {} root block(s), {} block(s) total from {} task(s)",
            blocks.len(),
            report.inserted,
            tasks.len()
        );

        Ok(BuiltTree { blocks, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeTaskService;
    use crate::models::TodoistComment;
    use outline_api::RecordingPlatform;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn task(id: &str, parent: Option<&str>) -> TodoistTask {
        let task = TodoistTask::new(id, format!("task {}", id));
        match parent {
            Some(parent) => task.with_parent(parent),
            None => task,
        }
    }

    async fn build_with(
        service: &FakeTaskService,
        policy: CommentFailurePolicy,
        tasks: &[TodoistTask],
    ) -> Result<BuiltTree, EnrichmentError> {
        let platform = RecordingPlatform::new();
        let options = FormatOptions::default();
        TreeBuilder::new(service, &platform, &options)
            .with_policy(policy)
            .build(tasks)
            .await
    }

    async fn build(tasks: &[TodoistTask]) -> BuiltTree {
        build_with(
            &FakeTaskService::new(),
            CommentFailurePolicy::Placeholder,
            tasks,
        )
        .await
        .unwrap()
    }

    fn shape(blocks: &[BlockToInsert]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| {
                if b.children.is_empty() {
                    b.task_id().to_string()
                } else {
                    format!("{}{:?}", b.task_id(), shape(&b.children))
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_three_level_chain_in_one_call() {
        let tree = build(&[
            task("1", None),
            task("2", Some("1")),
            task("3", Some("2")),
        ])
        .await;

        assert_eq!(tree.blocks.len(), 1);
        let root = &tree.blocks[0];
        assert_eq!(root.task_id(), "1");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].task_id(), "2");
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[0].children[0].task_id(), "3");
        assert!(root.children[0].children[0].children.is_empty());
        assert_eq!(tree.report.inserted, 3);
    }

    #[tokio::test]
    async fn test_children_listed_before_parents() {
        let tree = build(&[
            task("3", Some("2")),
            task("2b", Some("1")),
            task("2", Some("1")),
            task("1", None),
        ])
        .await;

        assert_eq!(shape(&tree.blocks), vec![r#"1["2b", "2[\"3\"]"]"#]);
    }

    #[tokio::test]
    async fn test_roots_and_siblings_keep_input_order() {
        let tree = build(&[
            task("b", None),
            task("a", None),
            task("b2", Some("b")),
            task("a1", Some("a")),
            task("b1", Some("b")),
        ])
        .await;

        let roots: Vec<&str> = tree.blocks.iter().map(|b| b.task_id()).collect();
        assert_eq!(roots, vec!["b", "a"]);
        let b_children: Vec<&str> = tree.blocks[0].children.iter().map(|b| b.task_id()).collect();
        assert_eq!(b_children, vec!["b2", "b1"]);
    }

    #[tokio::test]
    async fn test_orphans_self_parents_and_cycles_are_dropped() {
        let tree = build(&[
            task("1", None),
            task("orphan", Some("missing")),
            task("orphan-child", Some("orphan")),
            task("self", Some("self")),
            task("x", Some("y")),
            task("y", Some("x")),
        ])
        .await;

        assert_eq!(shape(&tree.blocks), vec!["1"]);
        assert_eq!(
            tree.report.unreachable,
            vec!["orphan", "orphan-child", "self", "x", "y"]
        );
    }

    #[tokio::test]
    async fn test_empty_input() {
        let tree = build(&[]).await;
        assert!(tree.blocks.is_empty());
        assert_eq!(tree.report, BuildReport::default());
    }

    #[tokio::test]
    async fn test_enrichment_runs_in_pre_order() {
        let service = FakeTaskService::new();
        build_with(
            &service,
            CommentFailurePolicy::Placeholder,
            &[
                task("1", None),
                task("2", None),
                task("1a", Some("1")),
                task("1b", Some("1")),
                task("1a-i", Some("1a")),
            ],
        )
        .await
        .unwrap();

        assert_eq!(
            service.comment_requests().await,
            vec!["1", "1a", "1a-i", "1b", "2"]
        );
    }

    #[tokio::test]
    async fn test_blocks_carry_content_and_comments() {
        let service = FakeTaskService::new().with_comments(
            "1",
            vec![
                TodoistComment::text("c1", "1", "a"),
                TodoistComment::text("c2", "1", "b"),
            ],
        );
        let tasks = [task("1", None).with_description("details")];

        let tree = build_with(&service, CommentFailurePolicy::Placeholder, &tasks)
            .await
            .unwrap();

        let block = &tree.blocks[0];
        assert_eq!(block.content, "task 1: details");
        assert_eq!(block.properties.comments, "a, b");
        assert_eq!(block.properties.todoistid, "1");
    }

    #[tokio::test]
    async fn test_placeholder_policy_keeps_failed_task() {
        let service = FakeTaskService::new()
            .with_comments("2", vec![TodoistComment::text("c", "2", "kept")])
            .failing_comments("1", "timeout");
        let tasks = [task("1", None), task("2", Some("1"))];

        let tree = build_with(&service, CommentFailurePolicy::Placeholder, &tasks)
            .await
            .unwrap();

        assert_eq!(shape(&tree.blocks), vec![r#"1["2"]"#]);
        assert_eq!(tree.blocks[0].properties, BlockProperties::for_task("1"));
        assert_eq!(tree.blocks[0].children[0].properties.comments, "kept");
        assert_eq!(tree.report.failed_enrichment, vec!["1"]);
    }

    #[tokio::test]
    async fn test_skip_policy_drops_subtree_without_fetching() {
        let service = FakeTaskService::new().failing_comments("1", "timeout");
        let tasks = [
            task("1", None),
            task("1a", Some("1")),
            task("1a-i", Some("1a")),
            task("2", None),
        ];

        let tree = build_with(&service, CommentFailurePolicy::Skip, &tasks)
            .await
            .unwrap();

        assert_eq!(shape(&tree.blocks), vec!["2"]);
        assert_eq!(tree.report.skipped, vec!["1", "1a", "1a-i"]);
        assert_eq!(service.comment_requests().await, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_abort_policy_fails_build() {
        let service = FakeTaskService::new().failing_comments("2", "HTTP 500");
        let tasks = [task("1", None), task("2", None), task("3", None)];

        let err = build_with(&service, CommentFailurePolicy::Abort, &tasks)
            .await
            .unwrap_err();

        assert_eq!(err.task_id, "2");
        assert_eq!(service.comment_requests().await, vec!["1", "2"]);
    }

    /// Forest of `n` tasks: task `i` is a root, a child of an earlier task,
    /// or an orphan; then shuffled so children may precede their parents
    fn task_list() -> impl Strategy<Value = Vec<TodoistTask>> {
        (0usize..25)
            .prop_flat_map(|n| {
                proptest::collection::vec((0u8..4, any::<prop::sample::Index>()), n)
            })
            .prop_map(|specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (kind, pick))| {
                        let id = format!("t{}", i);
                        match kind {
                            0 | 1 if i > 0 => task(&id, Some(&format!("t{}", pick.index(i)))),
                            2 => task(&id, Some(&format!("missing{}", i))),
                            _ => task(&id, None),
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .prop_shuffle()
    }

    /// Tasks reachable from a root by repeatedly rescanning the list
    fn reachable(tasks: &[TodoistTask]) -> HashSet<String> {
        let mut found: HashSet<String> = tasks
            .iter()
            .filter(|t| t.is_root())
            .map(|t| t.id.clone())
            .collect();
        loop {
            let before = found.len();
            for t in tasks {
                if t.parent().is_some_and(|p| found.contains(p)) {
                    found.insert(t.id.clone());
                }
            }
            if found.len() == before {
                return found;
            }
        }
    }

    fn assert_sibling_order(blocks: &[BlockToInsert], position: &HashMap<String, usize>) {
        let positions: Vec<usize> = blocks.iter().map(|b| position[b.task_id()]).collect();
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "siblings out of input order: {:?}",
            positions
        );
        for block in blocks {
            assert_sibling_order(&block.children, position);
        }
    }

    proptest! {
        #[test]
        fn prop_tree_contains_exactly_reachable_tasks(tasks in task_list()) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let tree = runtime.block_on(build(&tasks));

            let expected = reachable(&tasks);
            let ids: Vec<&str> = tree.blocks.iter().flat_map(|b| b.task_ids()).collect();
            let unique: HashSet<String> = ids.iter().map(|id| id.to_string()).collect();

            prop_assert_eq!(ids.len(), unique.len());
            prop_assert_eq!(&unique, &expected);
            prop_assert!(tree.report.inserted <= tasks.len());
            prop_assert_eq!(tree.report.inserted + tree.report.unreachable.len(), tasks.len());
        }

        #[test]
        fn prop_siblings_keep_input_order(tasks in task_list()) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let tree = runtime.block_on(build(&tasks));

            let position: HashMap<String, usize> = tasks
                .iter()
                .enumerate()
                .map(|(i, t)| (t.id.clone(), i))
                .collect();
            assert_sibling_order(&tree.blocks, &position);
        }

        #[test]
        fn prop_children_match_parent_ids(tasks in task_list()) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let tree = runtime.block_on(build(&tasks));

            let parent_of: HashMap<&str, Option<&str>> =
                tasks.iter().map(|t| (t.id.as_str(), t.parent())).collect();
            let mut stack: Vec<&BlockToInsert> = tree.blocks.iter().collect();
            for root in &tree.blocks {
                prop_assert_eq!(parent_of[root.task_id()], None);
            }
            while let Some(block) = stack.pop() {
                for child in &block.children {
                    prop_assert_eq!(parent_of[child.task_id()], Some(block.task_id()));
                    stack.push(child);
                }
            }
        }
    }
}
