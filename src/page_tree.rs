//! Mutable page tree.
//!
//! The page tree is a hierarchy of `/Pages` nodes whose `/Kids` arrays hold
//! references to nested nodes or to `/Page` leaves. Every node caches the
//! number of leaves below it in `/Count`, which lets positional lookups skip
//! whole subtrees. `/Parent` entries point back up the tree; they are plain
//! references into the store, never owners. The root has no `/Parent`.
//!
//! Out-of-range indices are not errors: lookups and deletions return `None`
//! and insertions clamp to the end.

use crate::dictionary;
use crate::document::{Document, ObjectKind};
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use std::collections::HashSet;

/// A page tree kid, classified once when it is read from `/Kids`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Page,
    Pages,
}

/// Route from the root to a page: each step is a node and the position of
/// the next kid inside its `/Kids`.
#[derive(Debug)]
struct PagePath {
    steps: Vec<(ObjectRef, usize)>,
    page: ObjectRef,
}

/// Page tree view over a document, rooted at a `/Pages` node.
pub struct PageTree<'a> {
    doc: &'a mut Document,
    root: ObjectRef,
}

impl Document {
    /// Open the page tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// [`Error::StructuralMismatch`] if `root` is not a `/Pages` node.
    pub fn page_tree(&mut self, root: ObjectRef) -> Result<PageTree<'_>> {
        let obj = self
            .object(root)
            .ok_or(Error::ObjectNotFound(root.id, root.gen))?;
        if obj.kind() != ObjectKind::Pages {
            return Err(Error::mismatch("Pages", obj.object_type().unwrap_or("untyped object")));
        }
        Ok(PageTree { doc: self, root })
    }

    /// Root page tree node named by the trailer's `/Root` catalog.
    pub fn catalog_pages(&self) -> Option<ObjectRef> {
        let catalog = self.trailer().get("Root")?.as_reference()?;
        self.resolve(catalog)?.get("Pages")?.as_reference()
    }
}

impl<'a> PageTree<'a> {
    /// The root node.
    pub fn root(&self) -> ObjectRef {
        self.root
    }

    /// The underlying document.
    pub fn document(&self) -> &Document {
        &*self.doc
    }

    fn classify(&self, oref: ObjectRef) -> Result<Node> {
        let obj = self
            .doc
            .object(oref)
            .ok_or(Error::ObjectNotFound(oref.id, oref.gen))?;
        match obj.kind() {
            ObjectKind::Page => Ok(Node::Page),
            ObjectKind::Pages => Ok(Node::Pages),
            _ => Err(Error::mismatch(
                "Page or Pages",
                format!("{} ({})", obj.object_type().unwrap_or(obj.value.type_name()), oref),
            )),
        }
    }

    fn kids(&self, node: ObjectRef) -> Result<Vec<ObjectRef>> {
        match self.doc.dict(node)?.get("Kids") {
            None => Ok(Vec::new()),
            Some(Object::Array(kids)) => kids
                .iter()
                .map(|kid| {
                    kid.as_reference()
                        .ok_or_else(|| Error::mismatch("Reference in /Kids", kid.type_name()))
                })
                .collect(),
            Some(other) => Err(Error::mismatch("Array for /Kids", other.type_name())),
        }
    }

    fn set_kids(&mut self, node: ObjectRef, kids: Vec<ObjectRef>) -> Result<()> {
        let kids = kids.into_iter().map(Object::Reference).collect();
        self.doc
            .dict_mut(node)?
            .insert("Kids".to_string(), Object::Array(kids));
        Ok(())
    }

    fn count(&self, node: ObjectRef) -> Result<i64> {
        Ok(self
            .doc
            .dict(node)?
            .get("Count")
            .and_then(Object::as_integer)
            .unwrap_or(0))
    }

    fn adjust_count(&mut self, node: ObjectRef, delta: i64) -> Result<()> {
        let count = self.count(node)? + delta;
        self.doc
            .dict_mut(node)?
            .insert("Count".to_string(), Object::Integer(count));
        Ok(())
    }

    fn set_parent(&mut self, kid: ObjectRef, parent: ObjectRef) -> Result<()> {
        self.doc
            .dict_mut(kid)?
            .insert("Parent".to_string(), Object::Reference(parent));
        Ok(())
    }

    /// Number of pages, as cached on the root.
    pub fn page_count(&self) -> Result<usize> {
        Ok(self.count(self.root)?.max(0) as usize)
    }

    /// Walk down to the page at `index`, subtracting each kid's page budget.
    fn locate(&self, index: i64) -> Result<Option<PagePath>> {
        let total = self.count(self.root)?;
        let index = if index < 0 { index + total } else { index };
        if index < 0 || index >= total {
            return Ok(None);
        }

        let mut remaining = index;
        let mut node = self.root;
        let mut steps = Vec::new();

        'descend: loop {
            let kids = self.kids(node)?;
            for (pos, &kid) in kids.iter().enumerate() {
                match self.classify(kid)? {
                    Node::Page => {
                        if remaining == 0 {
                            steps.push((node, pos));
                            return Ok(Some(PagePath { steps, page: kid }));
                        }
                        remaining -= 1;
                    },
                    Node::Pages => {
                        let count = self.count(kid)?;
                        if remaining < count {
                            steps.push((node, pos));
                            node = kid;
                            continue 'descend;
                        }
                        remaining -= count;
                    },
                }
            }

            log::warn!("Page tree node {} has a stale /Count, page {} not found", node, index);
            return Ok(None);
        }
    }

    /// Page at `index`; negative indices count from the end (`-1` is last).
    pub fn page(&self, index: i64) -> Result<Option<ObjectRef>> {
        Ok(self.locate(index)?.map(|path| path.page))
    }

    /// All pages in document order.
    pub fn pages(&self) -> Result<Vec<ObjectRef>> {
        let mut pages = Vec::new();
        let mut stack = vec![self.kids(self.root)?.into_iter()];
        let mut visited = HashSet::from([self.root]);

        while let Some(iter) = stack.last_mut() {
            let Some(kid) = iter.next() else {
                stack.pop();
                continue;
            };
            match self.classify(kid)? {
                Node::Page => pages.push(kid),
                Node::Pages => {
                    if !visited.insert(kid) {
                        return Err(Error::mismatch("acyclic page tree", format!("cycle at {}", kid)));
                    }
                    stack.push(self.kids(kid)?.into_iter());
                },
            }
        }

        Ok(pages)
    }

    /// Find the node and kid position where a page inserted at `index` goes,
    /// together with every node from the root down to that node.
    fn insertion_point(&self, index: i64) -> Result<(Vec<ObjectRef>, usize)> {
        let total = self.count(self.root)?;
        let index = if index < 0 { total + index + 1 } else { index };
        let index = index.max(0);

        if index >= total {
            let end = self.kids(self.root)?.len();
            return Ok((vec![self.root], end));
        }

        let mut remaining = index;
        let mut path = vec![self.root];

        'descend: loop {
            let node = path[path.len() - 1];
            let kids = self.kids(node)?;
            for (pos, &kid) in kids.iter().enumerate() {
                if remaining == 0 {
                    return Ok((path, pos));
                }
                match self.classify(kid)? {
                    Node::Page => remaining -= 1,
                    Node::Pages => {
                        let count = self.count(kid)?;
                        if remaining <= count {
                            path.push(kid);
                            continue 'descend;
                        }
                        remaining -= count;
                    },
                }
            }

            if remaining != 0 {
                log::warn!("Page tree node {} has a stale /Count, appending there", node);
            }
            return Ok((path, kids.len()));
        }
    }

    /// Insert a page at `index` and return it.
    ///
    /// With `page == None` a new empty `/Page` is created. Indices beyond the
    /// page count append; negative indices count from the end, so `-1`
    /// appends too.
    pub fn insert_page(&mut self, index: i64, page: Option<ObjectRef>) -> Result<ObjectRef> {
        if let Some(page) = page {
            if self.classify(page)? != Node::Page {
                return Err(Error::mismatch("Page", format!("Pages ({})", page)));
            }
        }

        let (path, pos) = self.insertion_point(index)?;
        let node = path[path.len() - 1];
        let page = match page {
            Some(page) => page,
            None => self.doc.add(dictionary! { "Type" => "Page" }),
        };

        let mut kids = self.kids(node)?;
        kids.insert(pos, page);
        self.set_kids(node, kids)?;
        self.set_parent(page, node)?;
        for &ancestor in &path {
            self.adjust_count(ancestor, 1)?;
        }

        log::debug!("Inserted page {} into {} at kid position {}", page, node, pos);
        Ok(page)
    }

    /// Append a page, see [`PageTree::insert_page`].
    pub fn add_page(&mut self, page: Option<ObjectRef>) -> Result<ObjectRef> {
        self.insert_page(-1, page)
    }

    /// Remove the page at `index` from the tree and return it.
    ///
    /// Intermediate nodes left with a single kid are replaced by that kid;
    /// nodes left empty are removed, repeating up the tree as long as
    /// removals leave ancestors empty or single-kid. Discarded nodes are
    /// freed in the current revision.
    pub fn delete_page(&mut self, index: i64) -> Result<Option<ObjectRef>> {
        let Some(path) = self.locate(index)? else {
            return Ok(None);
        };

        let (parent, pos) = path.steps[path.steps.len() - 1];
        let mut kids = self.kids(parent)?;
        kids.remove(pos);
        self.set_kids(parent, kids)?;
        for &(node, _) in &path.steps {
            self.adjust_count(node, -1)?;
        }
        self.doc.dict_mut(path.page)?.remove("Parent");

        self.collapse(&path.steps)?;

        log::debug!("Deleted page {} from {}", path.page, parent);
        Ok(Some(path.page))
    }

    /// Collapse degenerate intermediate nodes, deepest first.
    fn collapse(&mut self, steps: &[(ObjectRef, usize)]) -> Result<()> {
        for level in (1..steps.len()).rev() {
            let node = steps[level].0;
            let (grandparent, slot) = steps[level - 1];
            let kids = self.kids(node)?;

            match kids.len() {
                0 => {
                    let mut siblings = self.kids(grandparent)?;
                    siblings.remove(slot);
                    self.set_kids(grandparent, siblings)?;
                    self.doc.free(node);
                    log::trace!("Removed empty page tree node {}", node);
                },
                1 => {
                    let only = kids[0];
                    let mut siblings = self.kids(grandparent)?;
                    siblings[slot] = only;
                    self.set_kids(grandparent, siblings)?;
                    self.set_parent(only, grandparent)?;
                    self.doc.free(node);
                    log::trace!("Collapsed single-kid page tree node {} into {}", node, only);
                    break;
                },
                _ => break,
            }
        }
        Ok(())
    }

    /// Check the tree's invariants.
    ///
    /// Every node's `/Count` must equal its leaf count, every kid's `/Parent`
    /// must name the node listing it, and the root must not have a `/Parent`.
    pub fn verify(&self) -> Result<()> {
        if self.doc.dict(self.root)?.contains_key("Parent") {
            return Err(Error::mismatch("root without /Parent", format!("/Parent on {}", self.root)));
        }
        let mut visited = HashSet::new();
        self.verify_node(self.root, &mut visited).map(|_| ())
    }

    fn verify_node(&self, node: ObjectRef, visited: &mut HashSet<ObjectRef>) -> Result<i64> {
        if !visited.insert(node) {
            return Err(Error::mismatch("acyclic page tree", format!("cycle at {}", node)));
        }

        let mut leaves = 0;
        for kid in self.kids(node)? {
            let parent = self.doc.dict(kid)?.get("Parent").and_then(Object::as_reference);
            if parent != Some(node) {
                return Err(Error::mismatch(
                    format!("/Parent {} on {}", node, kid),
                    format!("{:?}", parent),
                ));
            }
            leaves += match self.classify(kid)? {
                Node::Page => 1,
                Node::Pages => self.verify_node(kid, visited)?,
            };
        }

        let cached = self.count(node)?;
        if cached != leaves {
            return Err(Error::mismatch(
                format!("/Count {} on {}", leaves, node),
                format!("/Count {}", cached),
            ));
        }
        Ok(leaves)
    }
}
