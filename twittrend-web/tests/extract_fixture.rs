use twittrend_common::{ErrorKind, ExtractionFailure, TrendError};
use twittrend_web::dom::{DocumentTree, HtmlTree};
use twittrend_web::extract::select_longest_list;
use twittrend_web::{Landmarks, RawDocument, TrendExtractor};

const PAGE: &str = include_str!("fixtures/trends_47.html");

#[test]
fn fixture_yields_all_47_trends_in_order() {
    let list = TrendExtractor::new()
        .extract_document(&RawDocument::from_html(PAGE))
        .expect("fixture has a qualifying list");

    assert_eq!(list.len(), 47);
    let labels = list.labels();
    assert_eq!(labels[0], "東京都");
    assert_eq!(labels[2], "#今日の積み上げ");
    assert_eq!(labels[5], "ドラクエ3 リメイク");
    assert_eq!(labels[31], "Mrs. GREEN APPLE");
    assert_eq!(labels[45], "48時間テレビ");
    assert_eq!(labels[46], "100日後に死ぬワニ");
}

#[test]
fn decoy_lists_are_scanned_but_lose() {
    let tree = HtmlTree::parse(PAGE);
    let selection = select_longest_list(&tree);
    assert_eq!(selection.lists_scanned, 3);

    let (winner, count) = selection.winner.expect("a winner");
    assert_eq!(count, 47);
    assert_eq!(winner.value().attr("class"), Some("trends"));

    let sizes: Vec<usize> = tree
        .find_all(&["ul", "ol"])
        .into_iter()
        .map(|l| tree.count_children(l, "li"))
        .collect();
    assert_eq!(sizes, vec![5, 47, 8]);
}

#[test]
fn landmark_diagnostics_do_not_change_the_result() {
    let plain = TrendExtractor::new()
        .extract_document(&RawDocument::from_html(PAGE))
        .unwrap();
    let with_landmarks = TrendExtractor::new()
        .with_landmark_fallback(Landmarks::default())
        .extract_document(&RawDocument::from_html(PAGE))
        .unwrap();
    assert_eq!(plain, with_landmarks);
}

#[test]
fn page_with_only_navigation_fails_with_counts() {
    let html = r#"<html><body>
        <ul><li>a</li><li>b</li><li>c</li><li>d</li><li>e</li></ul>
        <ul><li>1</li><li>2</li><li>3</li><li>4</li><li>5</li><li>6</li><li>7</li><li>8</li></ul>
        </body></html>"#;

    let err = TrendExtractor::new()
        .extract_document(&RawDocument::from_html(html))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Extraction);
    match err {
        TrendError::Extraction(ExtractionFailure::ListTooShort {
            best_count,
            threshold,
            lists_scanned,
        }) => {
            assert_eq!((best_count, threshold, lists_scanned), (8, 20, 2));
        }
        other => panic!("unexpected: {other:?}"),
    }
}
