//! End-to-end interpretation scenarios: text in, action request out.

mod common;

use std::sync::Arc;

use voxcmd::config::default_search_engines;
use voxcmd::engine::{Engine, EngineError, NoChooser};
use voxcmd::executor::DryRunExecutor;
use voxcmd::table::CommandTable;
use voxcmd::{ActionDescriptor, ActionRequest, KeyChord};

fn engine() -> (Engine, Arc<DryRunExecutor>) {
    let executor = Arc::new(DryRunExecutor::new());
    (Engine::new(default_search_engines(), executor.clone()), executor)
}

#[test]
fn test_substring_keyword_launches_program() {
    let (engine, executor) = engine();
    let mut table = CommandTable::in_memory();
    table
        .put("浏览器", ActionDescriptor::program("C:\\chrome.exe").unwrap())
        .unwrap();

    let outcome = engine.handle("打开浏览器", &table, &NoChooser);

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(
        executor.requests(),
        [ActionRequest::Launch("C:\\chrome.exe".into())]
    );
}

#[test]
fn test_search_trigger_extracts_query() {
    let (engine, executor) = engine();
    let outcome = engine.handle("搜索 猫咪图片", &CommandTable::in_memory(), &NoChooser);

    assert!(outcome.success);
    assert_eq!(
        executor.requests(),
        [ActionRequest::SearchWeb {
            template: "https://www.perplexity.ai/search?q={query}".to_string(),
            query: "猫咪图片".to_string(),
        }]
    );
}

#[test]
fn test_browser_phrase_never_consults_table() {
    let (engine, executor) = engine();
    let mut table = CommandTable::in_memory();
    table
        .put("网页", ActionDescriptor::url("https://example.com").unwrap())
        .unwrap();

    let outcome = engine.handle("关闭网页", &table, &NoChooser);

    assert!(outcome.success);
    assert_eq!(
        executor.requests(),
        [ActionRequest::SendKeys(KeyChord::new(["ctrl", "w"]))]
    );
}

#[test]
fn test_empty_table_reports_no_match() {
    let (engine, executor) = engine();
    let table = CommandTable::in_memory();

    let result = engine.interpret("随便说点什么", &table, &NoChooser);
    assert!(matches!(result, Err(EngineError::NoMatch { .. })));

    let outcome = engine.handle("随便说点什么", &table, &NoChooser);
    assert!(!outcome.success);
    assert!(executor.requests().is_empty());
}

#[test]
fn test_close_foreground_failure_is_surfaced() {
    let (engine, executor) = engine();
    executor.fail_with("no foreground window");

    let outcome = engine.handle("关闭当前程序", &CommandTable::in_memory(), &NoChooser);

    assert!(!outcome.success);
    assert!(outcome.message.contains("no foreground window"));
    assert_eq!(executor.requests(), [ActionRequest::CloseForeground]);
}
