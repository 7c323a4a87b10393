use serde::{Deserialize, Serialize};

/// Block properties attached to every synced task.
///
/// Serialized with the property names the outline document expects, so a
/// block inserted from a task reads `attachments::`, `comments::` and
/// `todoistid::` in the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockProperties {
    /// Markdown link to the last attachment seen in the task's comments
    pub attachments: String,

    /// All non-empty comment texts, joined with `", "`
    pub comments: String,

    /// Identifier of the originating Todoist task
    pub todoistid: String,
}

impl BlockProperties {
    pub fn for_task(task_id: impl Into<String>) -> Self {
        Self {
            attachments: String::new(),
            comments: String::new(),
            todoistid: task_id.into(),
        }
    }
}

/// A block to be created in the outline, together with its subtree.
///
/// This is the batch format accepted by [`crate::DocumentPlatform::insert_batch_block`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockToInsert {
    /// Fully decorated display text
    pub content: String,

    pub properties: BlockProperties,

    /// Child blocks in insertion order (empty for leaves)
    #[serde(default)]
    pub children: Vec<BlockToInsert>,
}

impl BlockToInsert {
    pub fn new(content: impl Into<String>, properties: BlockProperties) -> Self {
        Self {
            content: content.into(),
            properties,
            children: Vec::new(),
        }
    }

    /// Identifier of the task this block was built from
    pub fn task_id(&self) -> &str {
        &self.properties.todoistid
    }

    /// Builder: append a child block
    pub fn with_child(mut self, child: BlockToInsert) -> Self {
        self.children.push(child);
        self
    }

    /// Number of blocks in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(BlockToInsert::subtree_len)
            .sum::<usize>()
    }

    /// Task identifiers of this subtree in depth-first pre-order
    pub fn task_ids(&self) -> Vec<&str> {
        let mut ids = Vec::with_capacity(self.subtree_len());
        let mut stack = vec![self];
        while let Some(block) = stack.pop() {
            ids.push(block.task_id());
            stack.extend(block.children.iter().rev());
        }
        ids
    }
}

/// Total number of blocks in a forest
pub fn forest_len(blocks: &[BlockToInsert]) -> usize {
    blocks.iter().map(BlockToInsert::subtree_len).sum()
}
