//! Pilot: programmatic interaction with a headless document.
//!
//! The `Pilot` wraps a [`Sting`] and addresses elements by their
//! `data-testid`. Every interaction sets the form state a user would change,
//! dispatches the event a browser would fire, and then drains the
//! microtask queue so observers and deferred mounts have run before the
//! next assertion.

use crate::app::Sting;
use crate::document::Document;
use crate::dom::{Event, NodeId};
use crate::error::StingError;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless driver for tests.
///
/// Lookups panic when the test id is missing, like a failed assertion.
///
/// # Examples
///
/// ```ignore
/// use sting::testing::Pilot;
///
/// let pilot = Pilot::from_html(r#"<div x-data="counter">...</div>"#)?;
/// pilot.sting().register_component("counter", counter)?;
/// pilot.tick();
/// pilot.click("inc");
/// assert_eq!(pilot.text("count"), "1");
/// ```
pub struct Pilot {
    sting: Sting,
}

impl Pilot {
    pub fn new(sting: Sting) -> Self {
        Self { sting }
    }

    /// A pilot over a loaded document whose body holds `html`.
    pub fn from_html(html: &str) -> Result<Self, StingError> {
        Ok(Self::new(Sting::from_html(html)?))
    }

    pub fn sting(&self) -> &Sting {
        &self.sting
    }

    pub fn document(&self) -> &Document {
        self.sting.document()
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// The element with `data-testid="<test_id>"`.
    ///
    /// # Panics
    ///
    /// If no such element is in the document.
    #[track_caller]
    pub fn find(&self, test_id: &str) -> NodeId {
        match self.try_find(test_id) {
            Some(id) => id,
            None => panic!("no element with data-testid={test_id:?}"),
        }
    }

    pub fn try_find(&self, test_id: &str) -> Option<NodeId> {
        self.document().dom().query_by_test_id(test_id)
    }

    pub fn exists(&self, test_id: &str) -> bool {
        self.try_find(test_id).is_some()
    }

    // ── Interaction ──────────────────────────────────────────────────

    /// Dispatch a bubbling `click`.
    #[track_caller]
    pub fn click(&self, test_id: &str) {
        self.fire(test_id, Event::new("click"));
    }

    /// Replace a text control's value and fire `input`.
    #[track_caller]
    pub fn input(&self, test_id: &str, text: &str) {
        let el = self.find(test_id);
        self.document().dom_mut().set_form_value(el, text);
        self.dispatch_on(el, Event::new("input"));
    }

    /// Set a checkbox or radio and fire `change`. Checking a radio unchecks
    /// the others sharing its `name`.
    #[track_caller]
    pub fn check(&self, test_id: &str, checked: bool) {
        let el = self.find(test_id);
        {
            let mut dom = self.document().dom_mut();
            let radio_group = dom
                .get(el)
                .filter(|d| d.attr("type") == Some("radio"))
                .and_then(|d| d.attr("name"))
                .map(str::to_owned);
            if let (Some(group), true) = (radio_group, checked) {
                let root = dom.document();
                let peers = dom.query_all(root, |d| {
                    d.is_tag("input") && d.attr("type") == Some("radio") && d.attr("name") == Some(group.as_str())
                });
                for peer in peers {
                    dom.set_checked(peer, false);
                }
            }
            dom.set_checked(el, checked);
        }
        self.dispatch_on(el, Event::new("change"));
    }

    /// Choose a `<select>` value and fire `change`.
    #[track_caller]
    pub fn select(&self, test_id: &str, value: &str) {
        let el = self.find(test_id);
        self.document().dom_mut().set_form_value(el, value);
        self.dispatch_on(el, Event::new("change"));
    }

    /// Dispatch an arbitrary event. Returns `false` if a listener
    /// prevented the default.
    #[track_caller]
    pub fn fire(&self, test_id: &str, event: Event) -> bool {
        let el = self.find(test_id);
        self.dispatch_on(el, event)
    }

    fn dispatch_on(&self, el: NodeId, event: Event) -> bool {
        let allowed = self.document().dispatch(el, event);
        self.tick();
        allowed
    }

    // ── Event loop ───────────────────────────────────────────────────

    /// Drain microtasks and deliver mutation records.
    pub fn tick(&self) {
        self.document().tick();
    }

    /// Move virtual time forward, firing due timers.
    pub fn advance(&self, ms: u64) {
        self.document().advance(ms);
    }

    // ── Inspection ───────────────────────────────────────────────────

    #[track_caller]
    pub fn text(&self, test_id: &str) -> String {
        let el = self.find(test_id);
        self.document().dom().text_content(el)
    }

    #[track_caller]
    pub fn value(&self, test_id: &str) -> String {
        let el = self.find(test_id);
        self.document().dom().form_value(el)
    }

    #[track_caller]
    pub fn is_checked(&self, test_id: &str) -> bool {
        let el = self.find(test_id);
        self.document().dom().is_checked(el)
    }

    #[track_caller]
    pub fn attr(&self, test_id: &str, name: &str) -> Option<String> {
        let el = self.find(test_id);
        self.document().dom().attr(el, name).map(str::to_owned)
    }

    #[track_caller]
    pub fn style(&self, test_id: &str, property: &str) -> Option<String> {
        let el = self.find(test_id);
        self.document().dom().style_property(el, property)
    }

    /// Whether the element is rendered, going by inline `display: none`
    /// on it and its ancestors.
    #[track_caller]
    pub fn is_visible(&self, test_id: &str) -> bool {
        let el = self.find(test_id);
        let dom = self.document().dom();
        std::iter::once(el)
            .chain(dom.ancestors(el))
            .all(|n| dom.style_property(n, "display").as_deref() != Some("none"))
    }

    /// Serialised element, for snapshots.
    #[track_caller]
    pub fn html(&self, test_id: &str) -> String {
        let el = self.find(test_id);
        self.document().dom().outer_html(el)
    }

    /// Serialised body contents.
    pub fn body_html(&self) -> String {
        let body = self.document().body();
        self.document().dom().inner_html(body)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
