//! Tree algebra over analyzed logs: filters, convolution, combination.

use braid_core::prelude::*;

braid_core::template! {
    struct Cat0("cat zero {}", category = 0);
    struct Cat1("cat one {}", category = 1);
    struct Cat2("cat two {}", category = 2);
    struct Cat3("cat three {}", category = 3);
    struct Pair("pair {} {}", category = 1);
    struct Phase("phase", category = 0);
}

fn category_log(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("categories.log");
    let log: Log = Log::create(&path, LogConfig::default()).unwrap();
    let stream = log.create_stream();
    stream.message::<Cat0, _>((0u32,));
    stream.message::<Cat1, _>((1u32,));
    stream.message::<Cat2, _>((2u32,));
    stream.message::<Cat3, _>((3u32,));
    log.close().unwrap();
    path
}

/// Nine sibling messages; the ones at indices 3, 4 and 7 use a high
/// category, the rest a low one.
fn sibling_log(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("siblings.log");
    let log: Log = Log::create(&path, LogConfig::default()).unwrap();
    let stream = log.create_stream();
    for i in 0..9u32 {
        if matches!(i, 3 | 4 | 7) {
            stream.message::<Cat2, _>((i,));
        } else {
            stream.message::<Cat0, _>((i,));
        }
    }
    log.close().unwrap();
    path
}

fn message_flags(analyzer: &Analyzer, tree: &Tree<'_>) -> Vec<bool> {
    analyzer
        .nodes()
        .iter()
        .zip(tree.flags())
        .filter(|(node, _)| node.kind == NodeKind::Message)
        .map(|(_, flag)| flag.is_enabled())
        .collect()
}

#[test]
fn category_filter_keeps_high_categories() {
    let dir = tempfile::tempdir().unwrap();
    let path = category_log(dir.path());

    let mut analyzer = Analyzer::new();
    analyzer.read(&path).unwrap();

    let mut tree = Tree::new(&analyzer);
    tree.filter_category(|flag, category| {
        if category >= 2 {
            flag
        } else {
            Flag::Disabled
        }
    });

    assert_eq!(message_flags(&analyzer, &tree), [false, false, true, true]);
    // Non-message nodes are untouched.
    for (node, flag) in analyzer.nodes().iter().zip(tree.flags()) {
        if node.kind != NodeKind::Message {
            assert!(flag.is_enabled());
        }
    }
}

#[test]
fn reduce_drops_isolated_marks_and_keeps_supported_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = sibling_log(dir.path());

    let mut analyzer = Analyzer::new();
    analyzer.read(&path).unwrap();

    let mut tree = Tree::new(&analyzer);
    tree.filter_category(|flag, category| {
        if category >= 2 {
            flag
        } else {
            Flag::Disabled
        }
    });
    assert_eq!(
        message_flags(&analyzer, &tree),
        [false, false, false, true, true, false, false, true, false]
    );

    tree.reduce(1, 1);
    // 7's neighbors (6, 8) are both disabled; 3 and 4 support each other.
    assert_eq!(
        message_flags(&analyzer, &tree),
        [false, false, false, true, true, false, false, false, false]
    );

    // Idempotent against the stable window.
    tree.reduce(1, 1);
    assert_eq!(
        message_flags(&analyzer, &tree),
        [false, false, false, true, true, false, false, false, false]
    );
}

#[test]
fn expand_pulls_in_neighbors() {
    let dir = tempfile::tempdir().unwrap();
    let path = sibling_log(dir.path());

    let mut analyzer = Analyzer::new();
    analyzer.read(&path).unwrap();

    let mut tree = Tree::new(&analyzer);
    tree.filter_category(|flag, category| {
        if category >= 2 {
            flag
        } else {
            Flag::Disabled
        }
    });

    tree.expand(1, 1);
    assert_eq!(
        message_flags(&analyzer, &tree),
        [false, false, true, true, true, true, true, true, true]
    );

    // Expand only ever enables.
    tree.expand(1, 1);
    assert_eq!(
        message_flags(&analyzer, &tree),
        [false, true, true, true, true, true, true, true, true]
    );
}

#[test]
fn zero_radius_convolution_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = sibling_log(dir.path());

    let mut analyzer = Analyzer::new();
    analyzer.read(&path).unwrap();

    let mut tree = Tree::new(&analyzer);
    tree.filter_category(|flag, category| {
        if category >= 2 {
            flag
        } else {
            Flag::Disabled
        }
    });
    let before: Vec<Flag> = tree.flags().to_vec();

    tree.expand(0, 0);
    assert_eq!(tree.flags(), before.as_slice());
    tree.reduce(0, 0);
    assert_eq!(tree.flags(), before.as_slice());
}

#[test]
fn disabled_parent_prunes_convolution_and_filters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested.log");

    let log: Log = Log::create(&path, LogConfig::default()).unwrap();
    let stream = log.create_stream();
    {
        let _outer = stream.named_region::<Phase>();
        stream.message::<Cat3, _>((1u32,));
    }
    log.close().unwrap();

    let mut analyzer = Analyzer::new();
    analyzer.read(&path).unwrap();

    let mut tree = Tree::new(&analyzer);
    tree.filter_region(|_, _| Flag::Disabled);

    // The message under the disabled region is unreachable for filters.
    let mut visited = 0;
    tree.filter_category(|_flag, _| {
        visited += 1;
        Flag::Disabled
    });
    assert_eq!(visited, 0);

    // And expand does not resurrect anything below it.
    tree.expand(5, 5);
    let message_flag = analyzer
        .nodes()
        .iter()
        .zip(tree.flags())
        .find(|(node, _)| node.kind == NodeKind::Message)
        .map(|(_, flag)| *flag)
        .unwrap();
    assert!(message_flag.is_enabled(), "flag itself was never cleared");
}

#[test]
fn action_callback_controls_the_walk() {
    let dir = tempfile::tempdir().unwrap();
    let path = category_log(dir.path());

    let mut analyzer = Analyzer::new();
    analyzer.read(&path).unwrap();

    // SKIP everywhere: the predicate never runs.
    let mut tree = Tree::new(&analyzer);
    let mut runs = 0;
    tree.filter_category_with(
        |flag, _| {
            runs += 1;
            flag
        },
        |_, _| Action::SKIP,
    );
    assert_eq!(runs, 0);

    // TERMINATE at the stream: nothing below is visited.
    let mut tree = Tree::new(&analyzer);
    let mut runs = 0;
    tree.filter_category_with(
        |flag, _| {
            runs += 1;
            flag
        },
        |node, _| {
            if node.kind == NodeKind::Stream {
                Action::TERMINATE
            } else {
                Action::APPLY
            }
        },
    );
    assert_eq!(runs, 0);

    // APPLY | TERMINATE runs the predicate on the node, then prunes
    // everything below it.
    let nested = dir.path().join("nested.log");
    let log: Log = Log::create(&nested, LogConfig::default()).unwrap();
    let stream = log.create_stream();
    {
        let _outer = stream.region();
        let _inner = stream.region();
    }
    log.close().unwrap();

    let mut analyzer = Analyzer::new();
    analyzer.read(&nested).unwrap();

    let mut tree = Tree::new(&analyzer);
    let mut applied = 0;
    tree.filter_region_with(
        |_flag, _| {
            applied += 1;
            Flag::Disabled
        },
        |node, _| {
            if node.kind == NodeKind::Region {
                Action::APPLY | Action::TERMINATE
            } else {
                Action::SKIP
            }
        },
    );
    assert_eq!(applied, 1, "outer region applied, inner pruned");
    // nodes: log, stream, outer region, inner region
    assert!(!tree.flags()[2].is_enabled());
    assert!(tree.flags()[3].is_enabled());
}

#[test]
fn filter_stream_touches_only_stream_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two.log");

    let log: Log = Log::create(&path, LogConfig::default()).unwrap();
    let s0 = log.create_stream();
    let s1 = log.create_stream();
    s0.message::<Cat0, _>((1u32,));
    s1.message::<Cat0, _>((2u32,));
    log.close().unwrap();

    let mut analyzer = Analyzer::new();
    analyzer.read(&path).unwrap();

    let mut tree = Tree::new(&analyzer);
    tree.filter_stream(|flag, _, index| {
        if index == 0 {
            Flag::Disabled
        } else {
            flag
        }
    });

    assert!(!tree.flags()[1].is_enabled());
    assert!(tree.flags()[2].is_enabled());
    // Messages keep their own flags.
    for (node, flag) in analyzer.nodes().iter().zip(tree.flags()) {
        if node.kind == NodeKind::Message {
            assert!(flag.is_enabled());
        }
    }
}

#[test]
fn message_filter_matches_template_and_arity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.log");

    let log: Log = Log::create(&path, LogConfig::default()).unwrap();
    let stream = log.create_stream();
    stream.message::<Pair, _>((1u32, 2u32,));
    log.close().unwrap();

    let mut analyzer = Analyzer::new();
    analyzer.read(&path).unwrap();

    // Wrong arity: [u32] does not match the [u32, u32] descriptor.
    let mut tree = Tree::new(&analyzer);
    let mut matched = 0;
    tree.filter_message::<Pair, (u32,), _>(|flag, _| {
        matched += 1;
        flag
    });
    assert_eq!(matched, 0);

    // Exact match.
    let mut matched = 0;
    tree.filter_message::<Pair, (u32, u32), _>(|flag, _| {
        matched += 1;
        flag
    });
    assert_eq!(matched, 1);

    // Wildcard first position.
    let mut matched = 0;
    tree.filter_message::<Pair, (Any, u32), _>(|flag, _| {
        matched += 1;
        flag
    });
    assert_eq!(matched, 1);

    // Wildcards match types, not text: a different template stays out.
    let mut matched = 0;
    tree.filter_message::<Cat0, (Any,), _>(|flag, _| {
        matched += 1;
        flag
    });
    assert_eq!(matched, 0);
}

#[test]
fn union_and_intersection_laws() {
    let dir = tempfile::tempdir().unwrap();
    let path = category_log(dir.path());

    let mut analyzer = Analyzer::new();
    analyzer.read(&path).unwrap();

    let low = {
        let mut tree = Tree::new(&analyzer);
        tree.filter_category(|_, category| {
            if category < 2 {
                Flag::Enabled
            } else {
                Flag::Disabled
            }
        });
        tree
    };
    let high = {
        let mut tree = Tree::new(&analyzer);
        tree.filter_category(|_, category| {
            if category >= 2 {
                Flag::Enabled
            } else {
                Flag::Disabled
            }
        });
        tree
    };

    // A |= A and A &= A are identities.
    let mut tree = Tree::new(&analyzer);
    tree.filter_category(|_, c| if c == 1 { Flag::Enabled } else { Flag::Disabled });
    let before = tree.flags().to_vec();
    let copy = {
        let mut copy = Tree::new(&analyzer);
        copy.filter_category(|_, c| if c == 1 { Flag::Enabled } else { Flag::Disabled });
        copy
    };
    tree.union(&copy).unwrap();
    assert_eq!(tree.flags(), before.as_slice());
    tree.intersect(&copy).unwrap();
    assert_eq!(tree.flags(), before.as_slice());

    // Union of the two halves enables all messages; intersection none.
    let mut both = Tree::new(&analyzer);
    both.intersect(&low).unwrap();
    both.union(&high).unwrap();
    // (all ∩ low) ∪ high = low ∪ high = everything
    assert_eq!(message_flags(&analyzer, &both), [true; 4]);

    let mut none = Tree::new(&analyzer);
    none.intersect(&low).unwrap();
    none.intersect(&high).unwrap();
    assert_eq!(message_flags(&analyzer, &none), [false; 4]);

    // Commutativity on messages.
    let mut ab = Tree::new(&analyzer);
    ab.intersect(&low).unwrap();
    ab.union(&high).unwrap();
    let mut ba = Tree::new(&analyzer);
    ba.intersect(&high).unwrap();
    ba.union(&low).unwrap();
    assert_eq!(
        message_flags(&analyzer, &ab),
        message_flags(&analyzer, &ba)
    );
}

#[test]
fn trees_of_different_analyzers_do_not_combine() {
    let dir = tempfile::tempdir().unwrap();
    let path = category_log(dir.path());

    let mut first = Analyzer::new();
    first.read(&path).unwrap();
    let mut second = Analyzer::new();
    second.read(&path).unwrap();

    let mut tree = Tree::new(&first);
    let foreign = Tree::new(&second);
    assert_eq!(tree.union(&foreign).unwrap_err().code(), "E203");
    assert_eq!(tree.intersect(&foreign).unwrap_err().code(), "E203");
}
