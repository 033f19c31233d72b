//! Tests for page tree lookup, insertion and deletion.
//!
//! The multilevel fixture is:
//!
//! ```text
//! root (8)
//! ├── kid1 (5)
//! │   ├── kid11 (2): p0 p1
//! │   └── kid12 (3): p2 p3 p4
//! ├── p5
//! └── kid2 (2): p6 p7
//! ```

use pdf_repack::{dictionary, Document, Error, Object, ObjectRef, PageTree};

struct Fixture {
    doc: Document,
    root: ObjectRef,
    kid1: ObjectRef,
    kid11: ObjectRef,
    kid12: ObjectRef,
    kid2: ObjectRef,
    pages: Vec<ObjectRef>,
}

fn refs(items: &[ObjectRef]) -> Object {
    Object::Array(items.iter().copied().map(Object::Reference).collect())
}

fn node(doc: &mut Document, parent: Option<ObjectRef>, kids: &[ObjectRef], count: i64) -> ObjectRef {
    let oref = doc.add(dictionary! { "Type" => "Pages", "Kids" => refs(kids), "Count" => count });
    if let Some(parent) = parent {
        doc.dict_mut(oref).unwrap().insert("Parent".into(), Object::Reference(parent));
    }
    for kid in kids {
        doc.dict_mut(*kid).unwrap().insert("Parent".into(), Object::Reference(oref));
    }
    oref
}

fn empty_tree() -> (Document, ObjectRef) {
    let mut doc = Document::new();
    let root = node(&mut doc, None, &[], 0);
    (doc, root)
}

fn multilevel() -> Fixture {
    let mut doc = Document::new();
    let pages: Vec<ObjectRef> = (0..8).map(|_| doc.add(dictionary! { "Type" => "Page" })).collect();

    let kid11 = node(&mut doc, None, &pages[0..2], 2);
    let kid12 = node(&mut doc, None, &pages[2..5], 3);
    let kid1 = node(&mut doc, None, &[kid11, kid12], 5);
    let kid2 = node(&mut doc, None, &pages[6..8], 2);
    let root = node(&mut doc, None, &[kid1, pages[5], kid2], 8);

    Fixture {
        doc,
        root,
        kid1,
        kid11,
        kid12,
        kid2,
        pages,
    }
}

fn kids(doc: &Document, node: ObjectRef) -> Vec<ObjectRef> {
    doc.resolve(node)
        .and_then(|v| v.get("Kids"))
        .and_then(Object::as_array)
        .map(|arr| arr.iter().filter_map(Object::as_reference).collect())
        .unwrap_or_default()
}

fn count(doc: &Document, node: ObjectRef) -> i64 {
    doc.resolve(node)
        .and_then(|v| v.get("Count"))
        .and_then(Object::as_integer)
        .unwrap_or(-1)
}

fn tree(fixture: &mut Fixture) -> PageTree<'_> {
    fixture.doc.page_tree(fixture.root).unwrap()
}

#[test]
fn test_fixture_is_valid() {
    let mut f = multilevel();
    let tree = tree(&mut f);
    tree.verify().unwrap();
    assert_eq!(tree.page_count().unwrap(), 8);
}

#[test]
fn test_page_lookup() {
    let mut f = multilevel();
    let pages = f.pages.clone();
    let tree = tree(&mut f);

    assert_eq!(tree.page(0).unwrap(), Some(pages[0]));
    assert_eq!(tree.page(3).unwrap(), Some(pages[3]));
    assert_eq!(tree.page(5).unwrap(), Some(pages[5]));
    assert_eq!(tree.page(7).unwrap(), Some(pages[7]));
    assert_eq!(tree.pages().unwrap(), pages);
}

#[test]
fn test_page_lookup_negative() {
    let mut f = multilevel();
    let pages = f.pages.clone();
    let tree = tree(&mut f);

    assert_eq!(tree.page(-8).unwrap(), Some(pages[0]));
    assert_eq!(tree.page(-5).unwrap(), Some(pages[3]));
    assert_eq!(tree.page(-3).unwrap(), Some(pages[5]));
    assert_eq!(tree.page(-1).unwrap(), Some(pages[7]));

    for i in 0..8 {
        assert_eq!(tree.page(i).unwrap(), tree.page(i - 8).unwrap());
    }
}

#[test]
fn test_page_lookup_out_of_range() {
    let mut f = multilevel();
    let tree = tree(&mut f);
    assert_eq!(tree.page(20).unwrap(), None);
    assert_eq!(tree.page(-20).unwrap(), None);
    assert_eq!(tree.page(8).unwrap(), None);
}

#[test]
fn test_insert_new_page_into_empty_root() {
    let (mut doc, root) = empty_tree();
    let page = doc.page_tree(root).unwrap().insert_page(3, None).unwrap();

    assert_eq!(kids(&doc, root), vec![page]);
    assert_eq!(count(&doc, root), 1);
    let value = doc.resolve(page).unwrap();
    assert_eq!(value.dict_type(), Some("Page"));
    assert_eq!(value.get("Parent"), Some(&Object::Reference(root)));
    assert!(doc.resolve(root).unwrap().get("Parent").is_none());
}

#[test]
fn test_insert_provided_page() {
    let (mut doc, root) = empty_tree();
    let page = doc.add(dictionary! { "Type" => "Page" });

    let inserted = doc.page_tree(root).unwrap().insert_page(3, Some(page)).unwrap();

    assert_eq!(inserted, page);
    assert_eq!(kids(&doc, root), vec![page]);
    assert_eq!(doc.resolve(page).unwrap().get("Parent"), Some(&Object::Reference(root)));
    assert!(doc.resolve(root).unwrap().get("Parent").is_none());
}

#[test]
fn test_insert_multiple_into_empty_root() {
    let (mut doc, root) = empty_tree();
    let mut tree = doc.page_tree(root).unwrap();
    let page3 = tree.insert_page(5, None).unwrap();
    let page1 = tree.insert_page(0, None).unwrap();
    let page2 = tree.insert_page(1, None).unwrap();
    tree.verify().unwrap();

    assert_eq!(kids(&doc, root), vec![page1, page2, page3]);
    assert_eq!(count(&doc, root), 3);
}

#[test]
fn test_insert_multilevel() {
    let mut f = multilevel();
    let p = f.pages.clone();

    let page = tree(&mut f).insert_page(2, None).unwrap();
    assert_eq!(kids(&f.doc, f.kid11), vec![p[0], p[1], page]);
    assert_eq!(count(&f.doc, f.kid11), 3);
    assert_eq!(count(&f.doc, f.kid1), 6);
    assert_eq!(count(&f.doc, f.root), 9);

    let page = tree(&mut f).insert_page(4, None).unwrap();
    assert_eq!(kids(&f.doc, f.kid12), vec![p[2], page, p[3], p[4]]);
    assert_eq!(count(&f.doc, f.kid12), 4);
    assert_eq!(count(&f.doc, f.kid1), 7);
    assert_eq!(count(&f.doc, f.root), 10);

    let page8 = tree(&mut f).insert_page(8, None).unwrap();
    assert_eq!(kids(&f.doc, f.root), vec![f.kid1, p[5], page8, f.kid2]);
    assert_eq!(count(&f.doc, f.root), 11);

    let page = tree(&mut f).insert_page(100, None).unwrap();
    assert_eq!(kids(&f.doc, f.root), vec![f.kid1, p[5], page8, f.kid2, page]);
    assert_eq!(count(&f.doc, f.root), 12);

    tree(&mut f).verify().unwrap();
}

#[test]
fn test_insert_negative_index() {
    let mut f = multilevel();

    let page = tree(&mut f).insert_page(-1, None).unwrap();
    assert_eq!(kids(&f.doc, f.root).last(), Some(&page));

    let page = tree(&mut f).insert_page(-4, None).unwrap();
    assert_eq!(kids(&f.doc, f.root)[2], page);

    tree(&mut f).verify().unwrap();
}

#[test]
fn test_insert_then_delete_restores_counts() {
    let mut f = multilevel();
    let nodes = [f.root, f.kid1, f.kid11, f.kid12, f.kid2];
    let before: Vec<i64> = nodes.iter().map(|n| count(&f.doc, *n)).collect();

    let page = tree(&mut f).insert_page(3, None).unwrap();
    assert_eq!(tree(&mut f).page(3).unwrap(), Some(page));
    assert_eq!(tree(&mut f).delete_page(3).unwrap(), Some(page));

    let after: Vec<i64> = nodes.iter().map(|n| count(&f.doc, *n)).collect();
    assert_eq!(before, after);
    tree(&mut f).verify().unwrap();
}

#[test]
fn test_delete_out_of_range() {
    let mut f = multilevel();
    assert_eq!(tree(&mut f).delete_page(20).unwrap(), None);
    assert_eq!(tree(&mut f).delete_page(-20).unwrap(), None);
    assert_eq!(count(&f.doc, f.root), 8);
}

#[test]
fn test_delete_correct_page() {
    let mut f = multilevel();
    let p = f.pages.clone();

    assert_eq!(tree(&mut f).delete_page(2).unwrap(), Some(p[2]));
    assert_eq!(count(&f.doc, f.kid12), 2);
    assert_eq!(count(&f.doc, f.kid1), 4);
    assert_eq!(count(&f.doc, f.root), 7);

    assert_eq!(tree(&mut f).delete_page(4).unwrap(), Some(p[5]));
    assert_eq!(count(&f.doc, f.root), 6);
    tree(&mut f).verify().unwrap();
}

#[test]
fn test_delete_collapses_single_kid_node() {
    let mut f = multilevel();
    let p = f.pages.clone();

    assert_eq!(tree(&mut f).delete_page(0).unwrap(), Some(p[0]));
    assert_eq!(count(&f.doc, f.kid1), 4);
    assert_eq!(count(&f.doc, f.root), 7);
    assert_eq!(f.doc.resolve(f.kid11), None);
    assert_eq!(kids(&f.doc, f.kid1)[0], p[1]);
    assert_eq!(f.doc.resolve(p[1]).unwrap().get("Parent"), Some(&Object::Reference(f.kid1)));
    tree(&mut f).verify().unwrap();
}

#[test]
fn test_delete_removes_empty_node() {
    let mut f = multilevel();
    let page = f.doc.add(dictionary! { "Type" => "Page" });
    let extra = node(&mut f.doc, Some(f.root), &[page], 1);
    {
        let root = f.doc.dict_mut(f.root).unwrap();
        if let Some(Object::Array(kids)) = root.get_mut("Kids") {
            kids.push(Object::Reference(extra));
        }
        root.insert("Count".into(), Object::Integer(9));
    }

    assert_eq!(tree(&mut f).delete_page(-1).unwrap(), Some(page));
    assert_eq!(f.doc.resolve(extra), None);
    assert_ne!(kids(&f.doc, f.root).last(), Some(&extra));
    assert_eq!(count(&f.doc, f.root), 8);
    tree(&mut f).verify().unwrap();
}

#[test]
fn test_delete_cascades_collapse() {
    // root: [a, p2], a: [b, c], b: [p0], c: [p1]
    let mut doc = Document::new();
    let p0 = doc.add(dictionary! { "Type" => "Page" });
    let p1 = doc.add(dictionary! { "Type" => "Page" });
    let p2 = doc.add(dictionary! { "Type" => "Page" });
    let b = node(&mut doc, None, &[p0], 1);
    let c = node(&mut doc, None, &[p1], 1);
    let a = node(&mut doc, None, &[b, c], 2);
    let root = node(&mut doc, None, &[a, p2], 3);

    // Removing p0 empties b; a is left with the single kid c, so c takes
    // a's place under the root
    assert_eq!(doc.page_tree(root).unwrap().delete_page(0).unwrap(), Some(p0));

    assert_eq!(doc.resolve(b), None);
    assert_eq!(doc.resolve(a), None);
    assert_eq!(kids(&doc, root), vec![c, p2]);
    assert_eq!(doc.resolve(c).unwrap().get("Parent"), Some(&Object::Reference(root)));
    let tree = doc.page_tree(root).unwrap();
    tree.verify().unwrap();
    assert_eq!(tree.pages().unwrap(), vec![p1, p2]);
}

#[test]
fn test_delete_last_page() {
    let (mut doc, root) = empty_tree();
    let mut tree = doc.page_tree(root).unwrap();
    let page = tree.add_page(None).unwrap();

    assert_eq!(tree.delete_page(0).unwrap(), Some(page));
    assert_eq!(tree.page_count().unwrap(), 0);
    assert_eq!(tree.page(0).unwrap(), None);
    tree.verify().unwrap();
    assert!(doc.resolve(root).is_some());
}

#[test]
fn test_structural_mismatch() {
    let mut doc = Document::new();
    let font = doc.add(dictionary! { "Type" => "Font" });
    assert!(matches!(doc.page_tree(font), Err(Error::StructuralMismatch { .. })));

    let root = node(&mut doc, None, &[font], 1);
    let tree = doc.page_tree(root).unwrap();
    assert!(matches!(tree.page(0), Err(Error::StructuralMismatch { .. })));
}

#[test]
fn test_catalog_pages() {
    let (mut doc, root) = empty_tree();
    assert_eq!(doc.catalog_pages(), None);
    let catalog = doc.add(dictionary! { "Type" => "Catalog", "Pages" => root });
    doc.trailer_mut().insert("Root".into(), Object::Reference(catalog));
    assert_eq!(doc.catalog_pages(), Some(root));
}
