mod common;

use common::{ops, quick_config, visible, FakeFactory, FakePage};
use scrap_engine::{error::ScrapError,
                   script::{Script, ScriptRunner, ScriptStore}};
use std::{collections::HashMap, sync::Arc};
use tokio_util::sync::CancellationToken;

const SEARCH: &str = r##"{
    "site": "http://ex.test",
    "input": {"q": "search text"},
    "steps": [
        {"action": "fill", "selector": "#q", "text": "{{q}}"},
        {"action": "click", "selector": "#go"},
        {"action": "extract", "selector": "#result", "properties": {"textContent": "text"}}
    ]
}"##;

fn runner(page: &Arc<std::sync::Mutex<FakePage>>) -> ScriptRunner {
    ScriptRunner::new(Arc::new(FakeFactory::new(page.clone()))).with_session_config(quick_config())
}

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn search_page() -> FakePage {
    FakePage::new("about:blank")
        .element("#q", visible("input", "", ""))
        .element("#go", visible("button", "", "Go"))
        .element("#result", visible("div", "", "3 widgets found"))
        .property("page", "#result", "textContent", "\n   3 widgets\n   found  ")
}

#[tokio::test]
async fn test_fill_click_extract() {
    let page = search_page().shared();
    let script = Script::from_json(SEARCH).unwrap();

    let output = runner(&page).run(&script, &values(&[("q", "widgets")])).await.unwrap();

    assert!(output.is_complete());
    assert!(output.text().contains("TEXT: 3 widgets found"));

    let recorded = ops(&page);
    let fill = recorded.iter().position(|op| op == "fill #q widgets").unwrap();
    let click = recorded.iter().position(|op| op == "click #go").unwrap();
    assert!(fill < click);
    assert_eq!(recorded.first().map(String::as_str), Some("open http://ex.test"));
    assert_eq!(recorded.last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn test_missing_input_touches_no_browser() {
    let page = search_page().shared();
    let script = Script::from_json(SEARCH).unwrap();

    let err = runner(&page).run(&script, &HashMap::new()).await.unwrap_err();

    match err {
        ScrapError::MissingInput { missing } => {
            assert_eq!(missing, vec![("q".to_string(), "search text".to_string())]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(ops(&page).is_empty());
    assert_eq!(page.lock().unwrap().created, 0);
}

#[tokio::test]
async fn test_failing_step_stops_the_run() {
    let page = search_page().shared();
    let script = Script::from_json(
        r##"{"site": "http://ex.test", "steps": [
            {"action": "extract", "selector": "#result", "properties": {"textContent": "first"}},
            {"action": "click", "selector": "#absent"},
            {"action": "extract", "selector": "#result", "properties": {"textContent": "second"}}
        ]}"##,
    )
    .unwrap();

    let output = runner(&page).run(&script, &HashMap::new()).await.unwrap();

    assert_eq!(output.text(), "FIRST: 3 widgets found");
    let failure = output.failure.unwrap();
    assert_eq!(failure.index, 1);
    assert_eq!(failure.action, "click");
    assert_eq!(page.lock().unwrap().closed, 1);
}

#[tokio::test]
async fn test_extract_missing_element() {
    let page = FakePage::new("about:blank").shared();
    let script = Script::from_json(
        r##"{"site": "http://ex.test", "steps": [
            {"action": "extract", "selector": "#nothing", "properties": {"textContent": "text"}}
        ]}"##,
    )
    .unwrap();

    let output = runner(&page).run(&script, &HashMap::new()).await.unwrap();
    assert_eq!(output.text(), "Element not found");
}

#[tokio::test]
async fn test_for_each_blocks() {
    let page = FakePage::new("about:blank")
        .element("article", visible("article", "product_pod", ""))
        .element("article", visible("article", "product_pod", ""))
        .element("article", visible("article", "product_pod", ""))
        .property("article#0", "h3 a", "title", "Dune")
        .property("article#0", ".price", "textContent", "£10.00")
        .property("article#1", "h3 a", "title", "Solaris")
        .property("article#1", ".price", "textContent", "£12.50")
        .shared();
    let script = Script::from_json(
        r##"{"site": "http://ex.test", "steps": [
            {"action": "extract_all", "selector": "article", "label": "book", "limit": 2, "forEach": [
                {"action": "extract", "selector": "h3 a", "properties": {"title": "title"}},
                {"action": "extract", "selector": ".price", "properties": {"textContent": "price"}}
            ]}
        ]}"##,
    )
    .unwrap();

    let output = runner(&page).run(&script, &HashMap::new()).await.unwrap();
    assert_eq!(
        output.text(),
        "BOOK #1\nTITLE: Dune\nPRICE: £10.00\nBOOK #2\nTITLE: Solaris\nPRICE: £12.50"
    );
}

#[tokio::test]
async fn test_outputs_are_blank_line_separated() {
    let page = search_page().property("page", "#go", "textContent", "Go").shared();
    let script = Script::from_json(
        r##"{"site": "http://ex.test", "steps": [
            {"action": "extract", "selector": "#result", "properties": {"textContent": "result"}},
            {"action": "navigate", "url": "http://ex.test/next"},
            {"action": "extract", "selector": "#go", "properties": {"textContent": "button"}}
        ]}"##,
    )
    .unwrap();

    let output = runner(&page).run(&script, &HashMap::new()).await.unwrap();
    assert_eq!(output.text(), "RESULT: 3 widgets found\n\nBUTTON: Go");
    assert!(ops(&page).contains(&"navigate http://ex.test/next".to_string()));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let page = search_page().shared();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let script = Script::from_json(SEARCH).unwrap();

    let output = runner(&page)
        .with_cancellation(cancel)
        .run(&script, &values(&[("q", "widgets")]))
        .await
        .unwrap();

    assert!(output.cancelled);
    assert!(!ops(&page).iter().any(|op| op.starts_with("fill") || op.starts_with("click")));
}

#[tokio::test]
async fn test_stored_script_replay() {
    let dir = tempfile::tempdir().unwrap();
    let store = ScriptStore::new(dir.path());
    let script = Script::from_json(SEARCH).unwrap();

    let key = ScriptStore::key_for_url("http://ex.test/some/page");
    store.save(&key, &script).unwrap();
    assert!(store.exists("ex.test"));

    let page = search_page().shared();
    let loaded = store.get(&key).unwrap();
    let output = runner(&page).run(&loaded, &values(&[("q", "gadgets")])).await.unwrap();

    assert!(ops(&page).contains(&"fill #q gadgets".to_string()));
    assert!(output.text().starts_with("TEXT: "));
}
