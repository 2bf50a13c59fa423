//! Scripted in-memory browser.
//!
//! Pages are keyed by URL and hold a tree of [`FakeElement`]s. Lookups match
//! by [`Locator`] equality, so a test describes an element with the same
//! locator the code under test uses.

use crate::domain::locator::{ElementRef, Locator};
use crate::domain::ports::Browser;
use crate::utils::error::{RegoError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

const ID_PREFIX: &str = "fake-";

/// One element of a scripted page.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    locators: Vec<Locator>,
    text: String,
    properties: HashMap<String, String>,
    attributes: HashMap<String, String>,
    hidden: bool,
    disabled: bool,
    appears_after: Duration,
    on_click: Option<String>,
    children: Vec<FakeElement>,
}

impl FakeElement {
    pub fn new(locator: Locator) -> Self {
        Self {
            locators: vec![locator],
            ..Self::default()
        }
    }

    /// Another locator this element answers to.
    pub fn also(mut self, locator: Locator) -> Self {
        self.locators.push(locator);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn property(mut self, name: &str, value: impl Into<String>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Not present until this long after the page loaded.
    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self
    }

    /// Clicking loads `url`.
    pub fn navigates_to(mut self, url: impl Into<String>) -> Self {
        self.on_click = Some(url.into());
        self
    }

    pub fn child(mut self, child: FakeElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = FakeElement>) -> Self {
        self.children.extend(children);
        self
    }

    fn label(&self) -> String {
        self.locators
            .first()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "element".to_string())
    }
}

/// Something the code under test did to the browser.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Goto(String),
    Cleared(String),
    Typed { target: String, text: String },
    Clicked(String),
    Script(String),
    Cdp(String),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
struct Handle {
    page: String,
    path: Vec<usize>,
}

#[derive(Debug)]
struct Inner {
    pages: HashMap<String, Vec<FakeElement>>,
    current: Option<String>,
    loaded_at: Instant,
    handles: Vec<Handle>,
    values: HashMap<usize, String>,
    scripts: HashMap<String, Value>,
    failures: HashMap<String, (String, String)>,
    actions: Vec<Action>,
    page_load_timeout: Option<Duration>,
    open_sessions: usize,
    max_open_sessions: usize,
    quit_count: usize,
}

/// In-memory [`Browser`]. Clones share state, so a test can keep one handle
/// while the code under test drives another.
#[derive(Debug, Clone)]
pub struct FakeBrowser {
    inner: Arc<Mutex<Inner>>,
}

impl Default for FakeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                pages: HashMap::new(),
                current: None,
                loaded_at: Instant::now(),
                handles: Vec::new(),
                values: HashMap::new(),
                scripts: HashMap::new(),
                failures: HashMap::new(),
                actions: Vec::new(),
                page_load_timeout: None,
                open_sessions: 0,
                max_open_sessions: 0,
                quit_count: 0,
            })),
        }
    }

    pub fn with_page(self, url: &str, elements: Vec<FakeElement>) -> Self {
        self.lock().pages.insert(url.to_string(), elements);
        self
    }

    /// Value returned when `script` is executed verbatim.
    pub fn with_script_result(self, script: &str, value: Value) -> Self {
        self.lock().scripts.insert(script.to_string(), value);
        self
    }

    /// Makes every call of `operation` (a [`Browser`] method name) fail.
    /// A `code` of `"timeout"` yields a timeout error.
    pub fn failing(self, operation: &str, code: &str, message: &str) -> Self {
        self.lock().failures.insert(
            operation.to_string(),
            (code.to_string(), message.to_string()),
        );
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Goto(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Everything typed into the element first located by `locator`.
    pub fn typed_into(&self, locator: &Locator) -> String {
        let target = locator.to_string();
        self.lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Typed { target: t, text } if *t == target => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clicked(&self, locator: &Locator) -> bool {
        let target = locator.to_string();
        self.lock()
            .actions
            .iter()
            .any(|a| matches!(a, Action::Clicked(t) if *t == target))
    }

    pub fn cdp_commands(&self) -> Vec<String> {
        self.lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Cdp(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn current_url(&self) -> Option<String> {
        self.lock().current.clone()
    }

    pub fn page_load_timeout(&self) -> Option<Duration> {
        self.lock().page_load_timeout
    }

    pub fn quit_count(&self) -> usize {
        self.lock().quit_count
    }

    pub fn open_sessions(&self) -> usize {
        self.lock().open_sessions
    }

    /// Highest number of sessions that were open at the same time.
    pub fn max_open_sessions(&self) -> usize {
        self.lock().max_open_sessions
    }

    pub(crate) fn session_opened(&self) {
        let mut inner = self.lock();
        inner.open_sessions += 1;
        inner.max_open_sessions = inner.max_open_sessions.max(inner.open_sessions);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn injected(&self, operation: &str) -> Result<()> {
        match self.lock().failures.get(operation) {
            Some((code, message)) if code == "timeout" => Err(RegoError::timeout(message.clone())),
            Some((code, message)) => Err(RegoError::WebDriverError {
                code: code.clone(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Inner {
    fn navigate(&mut self, url: &str) {
        self.current = Some(url.to_string());
        self.loaded_at = Instant::now();
    }

    fn roots(&self) -> &[FakeElement] {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn register(&mut self, path: Vec<usize>) -> ElementRef {
        let handle = Handle {
            page: self.current.clone().unwrap_or_default(),
            path,
        };
        let index = match self.handles.iter().position(|h| *h == handle) {
            Some(index) => index,
            None => {
                self.handles.push(handle);
                self.handles.len() - 1
            }
        };
        ElementRef::new(format!("{}{}", ID_PREFIX, index))
    }

    fn index_of(element: &ElementRef) -> Result<usize> {
        element
            .id()
            .strip_prefix(ID_PREFIX)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| no_such_element(element.id()))
    }

    fn resolve(&self, element: &ElementRef) -> Result<(usize, &FakeElement, Vec<usize>)> {
        let index = Self::index_of(element)?;
        let handle = self
            .handles
            .get(index)
            .ok_or_else(|| no_such_element(element.id()))?;
        if self.current.as_deref() != Some(handle.page.as_str()) {
            return Err(RegoError::WebDriverError {
                code: "stale element reference".to_string(),
                message: format!("{} is not attached to the page document", element.id()),
            });
        }
        let mut level = self.roots();
        let mut found = None;
        for &i in &handle.path {
            let el = level.get(i).ok_or_else(|| no_such_element(element.id()))?;
            level = &el.children;
            found = Some(el);
        }
        let found = found.ok_or_else(|| no_such_element(element.id()))?;
        Ok((index, found, handle.path.clone()))
    }

    fn search(&self, scope: Option<&ElementRef>, locator: &Locator) -> Result<Vec<Vec<usize>>> {
        let elapsed = Instant::now().saturating_duration_since(self.loaded_at);
        let mut matches = Vec::new();
        match scope {
            Some(parent) => {
                let (_, el, path) = self.resolve(parent)?;
                collect(&el.children, path, locator, elapsed, &mut matches);
            }
            None => collect(self.roots(), Vec::new(), locator, elapsed, &mut matches),
        }
        Ok(matches)
    }
}

fn collect(
    elements: &[FakeElement],
    base: Vec<usize>,
    locator: &Locator,
    elapsed: Duration,
    out: &mut Vec<Vec<usize>>,
) {
    for (i, el) in elements.iter().enumerate() {
        if el.appears_after > elapsed {
            continue;
        }
        let mut path = base.clone();
        path.push(i);
        if el.locators.contains(locator) {
            out.push(path.clone());
        }
        collect(&el.children, path, locator, elapsed, out);
    }
}

fn no_such_element(id: &str) -> RegoError {
    RegoError::WebDriverError {
        code: "no such element".to_string(),
        message: format!("unknown element {}", id),
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        self.injected("goto")?;
        let mut inner = self.lock();
        inner.actions.push(Action::Goto(url.to_string()));
        inner.navigate(url);
        Ok(())
    }

    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()> {
        self.injected("set_page_load_timeout")?;
        self.lock().page_load_timeout = Some(timeout);
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>> {
        self.injected("find")?;
        let mut inner = self.lock();
        let first = inner.search(None, locator)?.into_iter().next();
        Ok(first.map(|path| inner.register(path)))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        self.injected("find_all")?;
        let mut inner = self.lock();
        let paths = inner.search(None, locator)?;
        Ok(paths.into_iter().map(|p| inner.register(p)).collect())
    }

    async fn find_in(&self, parent: &ElementRef, locator: &Locator) -> Result<Option<ElementRef>> {
        self.injected("find_in")?;
        let mut inner = self.lock();
        let first = inner.search(Some(parent), locator)?.into_iter().next();
        Ok(first.map(|path| inner.register(path)))
    }

    async fn find_all_in(&self, parent: &ElementRef, locator: &Locator) -> Result<Vec<ElementRef>> {
        self.injected("find_all_in")?;
        let mut inner = self.lock();
        let paths = inner.search(Some(parent), locator)?;
        Ok(paths.into_iter().map(|p| inner.register(p)).collect())
    }

    async fn text(&self, element: &ElementRef) -> Result<String> {
        self.injected("text")?;
        let inner = self.lock();
        let (_, el, _) = inner.resolve(element)?;
        Ok(el.text.clone())
    }

    async fn property(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        self.injected("property")?;
        let inner = self.lock();
        let (index, el, _) = inner.resolve(element)?;
        if name == "value" {
            if let Some(value) = inner.values.get(&index) {
                return Ok(Some(value.clone()));
            }
        }
        Ok(el.properties.get(name).cloned())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        self.injected("attribute")?;
        let inner = self.lock();
        let (_, el, _) = inner.resolve(element)?;
        Ok(el.attributes.get(name).cloned())
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        self.injected("is_displayed")?;
        let inner = self.lock();
        let (_, el, _) = inner.resolve(element)?;
        Ok(!el.hidden)
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        self.injected("is_enabled")?;
        let inner = self.lock();
        let (_, el, _) = inner.resolve(element)?;
        Ok(!el.disabled)
    }

    async fn clear(&self, element: &ElementRef) -> Result<()> {
        self.injected("clear")?;
        let mut inner = self.lock();
        let (index, el, _) = inner.resolve(element)?;
        let label = el.label();
        inner.values.insert(index, String::new());
        inner.actions.push(Action::Cleared(label));
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.injected("send_keys")?;
        let mut inner = self.lock();
        let (index, el, _) = inner.resolve(element)?;
        let label = el.label();
        let initial = el.properties.get("value").cloned().unwrap_or_default();
        inner.values.entry(index).or_insert(initial).push_str(text);
        inner.actions.push(Action::Typed {
            target: label,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.injected("execute")?;
        let mut inner = self.lock();
        inner.actions.push(Action::Script(script.to_string()));

        if script.contains(".click()") {
            if let Some(target) = args.first().and_then(ElementRef::from_json) {
                let (_, el, _) = inner.resolve(&target)?;
                let (label, next) = (el.label(), el.on_click.clone());
                inner.actions.push(Action::Clicked(label));
                if let Some(url) = next {
                    inner.navigate(&url);
                }
            }
        }
        Ok(inner.scripts.get(script).cloned().unwrap_or(Value::Null))
    }

    async fn cdp(&self, command: &str, _params: Value) -> Result<Value> {
        self.injected("cdp")?;
        self.lock().actions.push(Action::Cdp(command.to_string()));
        Ok(Value::Object(Default::default()))
    }

    async fn quit(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.actions.push(Action::Quit);
        inner.quit_count += 1;
        inner.open_sessions = inner.open_sessions.saturating_sub(1);
        drop(inner);
        self.injected("quit")
    }
}
