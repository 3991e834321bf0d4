mod common;

use std::collections::BTreeSet;
use std::path::PathBuf;

use common::SchemaTree;
use schema_gc::{
    ReferenceIssue, ResolutionError, SchemaGcError, SchemaReferenceCollector, WalkOutcome, wsdl,
};

fn paths(report: &schema_gc::CollectionReport) -> BTreeSet<PathBuf> {
    report
        .references
        .iter()
        .map(|r| r.path().to_path_buf())
        .collect()
}

#[tokio::test]
async fn test_collect_is_idempotent() {
    let tree = SchemaTree::new();
    let wsdl = tree.wsdl("service.wsdl", &[&[("import", "a.xsd"), ("import", "b.xsd")]]);
    tree.schema("a.xsd", &[("include", "common/c.xsd")]);
    tree.schema("b.xsd", &[]);
    tree.schema("common/c.xsd", &[]);

    let first = SchemaReferenceCollector::collect_from_paths(&[wsdl.clone()])
        .await
        .unwrap();
    let second = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert_eq!(first.references, second.references);
    assert_eq!(first.references.len(), 3);
}

#[tokio::test]
async fn test_include_cycle_terminates() {
    let tree = SchemaTree::new();
    let wsdl = tree.wsdl("service.wsdl", &[&[("include", "a.xsd")]]);
    tree.schema("a.xsd", &[("include", "b.xsd")]);
    tree.schema("b.xsd", &[("include", "a.xsd")]);

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert_eq!(
        paths(&report),
        BTreeSet::from([tree.canonical("a.xsd"), tree.canonical("b.xsd")])
    );
    assert_eq!(report.outcome(), WalkOutcome::Complete);
}

#[tokio::test]
async fn test_self_include_terminates() {
    let tree = SchemaTree::new();
    let wsdl = tree.wsdl("service.wsdl", &[&[("include", "self.xsd")]]);
    tree.schema("self.xsd", &[("include", "./self.xsd")]);

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert_eq!(report.references.len(), 1);
}

#[tokio::test]
async fn test_diamond_visits_shared_schema_once() {
    let tree = SchemaTree::new();
    let wsdl = tree.wsdl("service.wsdl", &[&[("import", "a/a.xsd"), ("import", "b/b.xsd")]]);
    tree.schema("a/a.xsd", &[("include", "../shared/c.xsd")]);
    tree.schema("b/b.xsd", &[("include", "../shared/./c.xsd")]);
    tree.schema("shared/c.xsd", &[]);

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert_eq!(report.references.len(), 3);
    let shared = tree.canonical("shared/c.xsd");
    assert_eq!(
        report.references.iter().filter(|r| r.path() == shared).count(),
        1
    );
}

#[tokio::test]
async fn test_relative_spellings_resolve_to_one_entry() {
    let tree = SchemaTree::new();
    let wsdl = tree.wsdl(
        "service.wsdl",
        &[
            &[("import", "./schemas/x.xsd")],
            &[("import", "schemas/x.xsd")],
        ],
    );
    tree.schema("schemas/x.xsd", &[]);

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert_eq!(paths(&report), BTreeSet::from([tree.canonical("schemas/x.xsd")]));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_location_is_canonicalized() {
    let tree = SchemaTree::new();
    tree.schema("real/x.xsd", &[]);
    std::os::unix::fs::symlink(tree.path("real"), tree.path("alias")).unwrap();
    let wsdl = tree.wsdl("service.wsdl", &[&[("import", "alias/x.xsd"), ("import", "real/x.xsd")]]);

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert_eq!(paths(&report), BTreeSet::from([tree.canonical("real/x.xsd")]));
}

#[tokio::test]
async fn test_import_without_location_is_not_an_error() {
    let tree = SchemaTree::new();
    let wsdl = tree.raw(
        "service.wsdl",
        r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                  xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <wsdl:types>
    <xsd:schema>
      <xsd:import namespace="urn:elsewhere"/>
      <xsd:import namespace="urn:blank" schemaLocation=""/>
    </xsd:schema>
  </wsdl:types>
</wsdl:definitions>"#,
    );

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert!(report.references.is_empty());
    assert!(report.issues.is_empty());
    assert_eq!(report.outcome(), WalkOutcome::Complete);
}

#[tokio::test]
async fn test_missing_schema_is_skipped_and_reported() {
    let tree = SchemaTree::new();
    let wsdl = tree.wsdl("service.wsdl", &[&[("import", "missing.xsd"), ("import", "present.xsd")]]);
    tree.schema("present.xsd", &[]);

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl.clone()])
        .await
        .unwrap();

    assert_eq!(paths(&report), BTreeSet::from([tree.canonical("present.xsd")]));
    assert_eq!(report.outcome(), WalkOutcome::Partial);
    match &report.issues[..] {
        [ReferenceIssue::Unresolved { referrer, error, .. }] => {
            assert_eq!(referrer, &wsdl.canonicalize().unwrap());
            assert_eq!(error.location(), "missing.xsd");
        }
        other => panic!("unexpected issues: {:?}", other),
    }
}

#[tokio::test]
async fn test_remote_location_is_not_fetched() {
    let tree = SchemaTree::new();
    let wsdl = tree.wsdl(
        "service.wsdl",
        &[&[("import", "https://schemas.example.com/common.xsd")]],
    );

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert!(report.references.is_empty());
    assert!(matches!(
        &report.issues[0],
        ReferenceIssue::Unresolved {
            error: ResolutionError::Remote { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_unparsable_schema_does_not_hide_siblings() {
    let tree = SchemaTree::new();
    let wsdl = tree.wsdl(
        "service.wsdl",
        &[&[("import", "broken.xsd"), ("import", "ok.xsd")]],
    );
    tree.raw("broken.xsd", "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\">");
    tree.schema("ok.xsd", &[("include", "deep.xsd")]);
    tree.schema("deep.xsd", &[]);

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert_eq!(
        paths(&report),
        BTreeSet::from([
            tree.canonical("broken.xsd"),
            tree.canonical("ok.xsd"),
            tree.canonical("deep.xsd"),
        ])
    );
    assert_eq!(report.outcome(), WalkOutcome::Degraded);
}

#[tokio::test]
async fn test_redefine_and_override_are_followed() {
    let tree = SchemaTree::new();
    let wsdl = tree.wsdl("service.wsdl", &[&[("redefine", "r.xsd")]]);
    tree.schema("r.xsd", &[("override", "o.xsd")]);
    tree.schema("o.xsd", &[]);

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert_eq!(report.references.len(), 2);
}

#[tokio::test]
async fn test_multiple_roots_share_visited_set() {
    let tree = SchemaTree::new();
    let orders = tree.wsdl("orders.wsdl", &[&[("import", "common.xsd")]]);
    let billing = tree.wsdl("billing.wsdl", &[&[("import", "common.xsd"), ("import", "billing.xsd")]]);
    tree.schema("common.xsd", &[]);
    tree.schema("billing.xsd", &[]);

    let report = SchemaReferenceCollector::collect_from_paths(&[orders, billing])
        .await
        .unwrap();

    assert_eq!(report.roots.len(), 2);
    assert_eq!(report.references.len(), 2);
}

#[tokio::test]
async fn test_deep_chain_uses_worklist() {
    let tree = SchemaTree::new();
    let depth = 500;
    let wsdl = tree.wsdl("service.wsdl", &[&[("include", "s0.xsd")]]);
    for i in 0..depth {
        let next = format!("s{}.xsd", i + 1);
        if i + 1 < depth {
            tree.schema(&format!("s{}.xsd", i), &[("include", next.as_str())]);
        } else {
            tree.schema(&format!("s{}.xsd", i), &[]);
        }
    }

    let report = SchemaReferenceCollector::collect_from_paths(&[wsdl])
        .await
        .unwrap();

    assert_eq!(report.references.len(), depth);
}

#[tokio::test]
async fn test_broken_root_is_fatal() {
    let tree = SchemaTree::new();
    let good = tree.wsdl("good.wsdl", &[]);
    let bad = tree.raw("bad.wsdl", "this is not xml");

    let result = SchemaReferenceCollector::collect_from_paths(&[good, bad]).await;

    assert!(matches!(result, Err(SchemaGcError::Parse(_))));
}

#[tokio::test]
async fn test_collect_references_on_a_single_fragment() {
    let tree = SchemaTree::new();
    tree.schema("types/a.xsd", &[]);
    let wsdl_path = tree.wsdl("service.wsdl", &[&[("import", "types/a.xsd")]]);

    let root = wsdl::load_root(&wsdl_path).await.unwrap();
    let mut collector = SchemaReferenceCollector::new();
    let references = collector
        .collect_references(&root.fragments[0], root.base_dir())
        .await;

    assert_eq!(references.len(), 1);
    assert!(references.contains_path(&tree.canonical("types/a.xsd")));
}
