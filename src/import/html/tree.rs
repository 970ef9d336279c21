use scraper::ElementRef;

/// The part of a document tree the table extraction needs: element name, element children and text content.
pub trait TreeNode: Sized {
    fn name(&self) -> &str;
    fn children(&self) -> Vec<Self>;
    fn text(&self) -> String;
}

impl<'a> TreeNode for ElementRef<'a> {
    fn name(&self) -> &str {
        self.value().name()
    }

    fn children(&self) -> Vec<Self> {
        std::ops::Deref::deref(self)
            .children()
            .filter_map(ElementRef::wrap)
            .collect()
    }

    fn text(&self) -> String {
        ElementRef::text(self).collect::<String>().trim().to_string()
    }
}

/// Pre-order depth-first walk over `root` and everything below it.
/// Uses an explicit stack so deeply nested documents can't overflow the call stack.
pub struct Descendants<N> {
    stack: Vec<N>,
}

impl<N: TreeNode> Iterator for Descendants<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.stack.pop()?;
        let mut children = node.children();
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}

pub fn descendants<N: TreeNode>(root: N) -> Descendants<N> {
    Descendants { stack: vec![root] }
}

pub fn find_first<N: TreeNode>(root: N, name: &str) -> Option<N> {
    descendants(root).find(|node| node.name() == name)
}

/// All nodes called `name` anywhere below `root`, including inside nested structures.
pub fn find_all<N: TreeNode>(root: N, name: &str) -> Vec<N> {
    descendants(root).filter(|node| node.name() == name).collect()
}

/// Children of `node` whose name is one of `names`. Grandchildren are never returned.
pub fn direct_children_named<N: TreeNode>(node: &N, names: &[&str]) -> Vec<N> {
    node.children()
        .into_iter()
        .filter(|child| names.contains(&child.name()))
        .collect()
}
