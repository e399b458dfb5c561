//! Integration tests for sting.
//!
//! These drive whole components through the public API and the headless
//! [`Pilot`], checking that the reactive core, the directives, and the
//! mount lifecycle work together.

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use sting::testing::Pilot;
use sting::{
    json, Arg, Document, Handler, LifecycleEvent, Scope, Sting, StingConfig, StingError, Value,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn as_int(v: &Value) -> i64 {
    v.as_i64().unwrap_or(0)
}

fn counter(s: &Sting) -> Scope {
    let (count, set_count) = s.create_signal(json!(0));
    let inc = set_count.clone();
    let dec = set_count.clone();
    Scope::new()
        .with("count", (count, set_count))
        .with("increment", Handler::new(move |_| inc.update(|n| json!(as_int(n) + 1))))
        .with("decrement", Handler::new(move |_| dec.update(|n| json!(as_int(n) - 1))))
}

const COUNTER: &str = concat!(
    r#"<div data-testid="root" x-data="counter">"#,
    r#"<span data-testid="count" x-text="count"></span>"#,
    r#"<button data-testid="inc" x-on:click="increment">+</button>"#,
    r#"<button data-testid="dec" x-on:click="decrement">-</button>"#,
    r#"</div>"#,
);

fn manual(html: &str) -> Sting {
    let doc = Document::from_html(html).expect("valid html");
    Sting::with_document(doc, StingConfig::new().with_auto_start(false))
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

#[test]
fn test_counter_increments_and_decrements() {
    let pilot = Pilot::from_html(COUNTER).expect("valid html");
    pilot
        .sting()
        .register_component("counter", counter)
        .expect("valid name");
    pilot.tick();

    assert_eq!(pilot.text("count"), "0");
    pilot.click("inc");
    assert_eq!(pilot.text("count"), "1");
    pilot.click("inc");
    assert_eq!(pilot.text("count"), "2");
    pilot.click("dec");
    assert_eq!(pilot.text("count"), "1");
}

#[test]
fn test_counter_call_arguments() {
    let pilot = Pilot::from_html(concat!(
        r#"<div x-data="adder">"#,
        r#"<span data-testid="total" x-text="total"></span>"#,
        r#"<button data-testid="add5" x-on:click="add(5, step)">+5</button>"#,
        r#"</div>"#,
    ))
    .expect("valid html");
    pilot
        .sting()
        .register_component("adder", |s| {
            let (total, set_total) = s.create_signal(json!(0));
            let set = set_total.clone();
            Scope::new()
                .with("total", (total, set_total))
                .with("step", json!(2))
                .with(
                    "add",
                    Handler::new(move |args| {
                        let sum: i64 = args.iter().filter_map(Arg::as_value).map(as_int).sum();
                        set.update(|n| json!(as_int(n) + sum));
                    }),
                )
        })
        .expect("valid name");
    pilot.tick();
    pilot.click("add5");
    assert_eq!(pilot.text("total"), "7");
}

// ---------------------------------------------------------------------------
// Conditional rendering
// ---------------------------------------------------------------------------

#[test]
fn test_if_block_binds_and_releases_its_contents() {
    let pilot = Pilot::from_html(concat!(
        r#"<div x-data="panel">"#,
        r#"<button data-testid="toggle" x-on:click="toggle">toggle</button>"#,
        r#"<template x-if="open"><div data-testid="body">"#,
        r#"<input data-testid="name" x-model="name">"#,
        r#"<span data-testid="greeting" x-text="name"></span>"#,
        r#"<button data-testid="shout" x-on:click="shout">!</button>"#,
        r#"<i x-effect="watch"></i>"#,
        r#"</div></template>"#,
        r#"</div>"#,
    ))
    .expect("valid html");
    let sting = pilot.sting().clone();
    let (name, set_name) = sting.create_signal(json!("Ada"));
    let runs = Rc::new(Cell::new(0));

    {
        let runs = runs.clone();
        let (name, set_name) = (name.clone(), set_name.clone());
        sting
            .register_component("panel", move |s| {
                let (open, set_open) = s.create_signal(json!(false));
                let flip = set_open.clone();
                let shout = set_name.clone();
                let watched = name.clone();
                let runs = runs.clone();
                Scope::new()
                    .with("open", (open, set_open))
                    .with("name", (name.clone(), set_name.clone()))
                    .with(
                        "toggle",
                        Handler::new(move |_| flip.update(|v| json!(!v.as_bool().unwrap_or(false)))),
                    )
                    .with(
                        "shout",
                        Handler::new(move |_| {
                            shout.update(|v| json!(format!("{}!", v.as_str().unwrap_or_default())))
                        }),
                    )
                    .with(
                        "watch",
                        Handler::new(move |_| {
                            let _ = watched.get();
                            runs.set(runs.get() + 1);
                        }),
                    )
            })
            .expect("valid name");
    }
    pilot.tick();
    assert!(!pilot.exists("body"));

    pilot.click("toggle");
    assert!(pilot.exists("body"));
    assert_eq!(pilot.value("name"), "Ada");
    assert_eq!(pilot.text("greeting"), "Ada");
    assert_eq!(runs.get(), 1);

    pilot.input("name", "Grace");
    assert_eq!(pilot.text("greeting"), "Grace");
    pilot.click("shout");
    assert_eq!(pilot.text("greeting"), "Grace!");
    assert_eq!(pilot.value("name"), "Grace!");
    assert_eq!(runs.get(), 3);

    pilot.click("toggle");
    assert!(!pilot.exists("body"));
    set_name.set(json!("Zed"));
    assert_eq!(runs.get(), 3);
    // Only the toggle button still listens.
    assert_eq!(pilot.document().dom().total_listeners(), 1);

    pilot.click("toggle");
    assert_eq!(pilot.text("greeting"), "Zed");
    assert_eq!(runs.get(), 4);
}

#[test]
fn test_if_block_waits_for_its_template_to_be_attached() {
    let sting = manual(concat!(
        r#"<div x-data="panel">"#,
        r#"<template data-testid="tpl" x-if="open"><p data-testid="body">hi</p></template>"#,
        r#"</div>"#,
    ));
    let (open, set_open) = sting.create_signal(json!(0));
    {
        let state = (open, set_open.clone());
        sting
            .register_component("panel", move |_| Scope::new().with("open", state.clone()))
            .expect("valid name");
    }
    sting.start(None).expect("starts");
    let pilot = Pilot::new(sting);

    let tpl = pilot.find("tpl");
    let root = pilot.document().dom().parent(tpl).expect("attached");
    pilot.document().dom_mut().remove(tpl);
    set_open.set(json!(1));
    assert!(!pilot.exists("body"));

    pilot.document().dom_mut().append_child(root, tpl);
    set_open.set(json!(2));
    assert!(pilot.exists("body"));
}

#[test]
fn test_component_inside_if_block_mounts_and_unmounts() {
    let pilot = Pilot::from_html(concat!(
        r#"<div x-data="outer">"#,
        r#"<button data-testid="toggle" x-on:click="toggle"></button>"#,
        r#"<template x-if="open"><section data-testid="inner" x-data="inner">"#,
        r#"<span data-testid="label" x-text="label"></span>"#,
        r#"</section></template>"#,
        r#"</div>"#,
    ))
    .expect("valid html");
    let sting = pilot.sting();
    sting
        .register_component("outer", |s| {
            let (open, set_open) = s.create_signal(json!(false));
            let flip = set_open.clone();
            Scope::new()
                .with("open", (open, set_open))
                .with("label", json!("outer"))
                .with(
                    "toggle",
                    Handler::new(move |_| flip.update(|v| json!(!v.as_bool().unwrap_or(false)))),
                )
        })
        .expect("valid name");
    sting
        .register_component("inner", |_| Scope::new().with("label", json!("inner")))
        .expect("valid name");
    pilot.tick();
    sting.lifecycle_events();

    pilot.click("toggle");
    assert_eq!(pilot.text("label"), "inner");
    let inner = pilot.find("inner");
    assert!(sting.is_mounted(inner));

    pilot.click("toggle");
    assert!(!pilot.exists("inner"));
    assert_eq!(
        sting.lifecycle_events(),
        vec![
            LifecycleEvent::Mount {
                root: inner,
                name: "inner".into()
            },
            LifecycleEvent::Unmount {
                root: inner,
                name: "inner".into()
            },
        ]
    );
}

// ---------------------------------------------------------------------------
// List rendering
// ---------------------------------------------------------------------------

#[test]
fn test_for_block_follows_the_array() {
    let pilot = Pilot::from_html(concat!(
        r#"<div x-data="todos">"#,
        r#"<ul data-testid="list"><template x-for="(todo, i) in items">"#,
        r#"<li x-text="todo" x-bind:data-index="i"></li>"#,
        r#"</template></ul>"#,
        r#"<button data-testid="add" x-on:click="add('d')">add</button>"#,
        r#"<button data-testid="pop" x-on:click="pop">pop</button>"#,
        r#"</div>"#,
    ))
    .expect("valid html");
    pilot
        .sting()
        .register_component("todos", |s| {
            let (items, set_items) = s.create_signal(json!(["a", "b", "c"]));
            let push = set_items.clone();
            let pop = set_items.clone();
            Scope::new()
                .with("items", (items, set_items))
                .with(
                    "add",
                    Handler::new(move |args| {
                        let item = args.first().and_then(Arg::as_value).cloned().unwrap_or_default();
                        push.update_in_place(|list| {
                            if let Some(list) = list.as_array_mut() {
                                list.push(item);
                            }
                        });
                    }),
                )
                .with(
                    "pop",
                    Handler::new(move |_| {
                        pop.update_in_place(|list| {
                            if let Some(list) = list.as_array_mut() {
                                list.pop();
                            }
                        });
                    }),
                )
        })
        .expect("valid name");
    pilot.tick();

    let items = |p: &Pilot| -> Vec<String> {
        let list = p.find("list");
        let dom = p.document().dom();
        let texts = dom
            .query_by_tag(list, "li")
            .into_iter()
            .map(|li| dom.text_content(li))
            .collect();
        texts
    };
    assert_eq!(items(&pilot), vec!["a", "b", "c"]);

    pilot.click("add");
    assert_eq!(items(&pilot), vec!["a", "b", "c", "d"]);

    pilot.click("pop");
    assert_eq!(items(&pilot), vec!["a", "b", "c"]);

    insta::assert_snapshot!(
        pilot.html("list"),
        @r#"<ul data-testid="list"><template x-for="(todo, i) in items"><li x-text="todo" x-bind:data-index="i"></li></template><li x-text="todo" x-bind:data-index="i" data-index="0">a</li><li x-text="todo" x-bind:data-index="i" data-index="1">b</li><li x-text="todo" x-bind:data-index="i" data-index="2">c</li></ul>"#
    );
}

#[test]
fn test_for_rebuilds_free_their_nodes_without_the_observer() {
    let doc = Document::from_html(
        r#"<ul x-data="list"><template x-for="item in items"><li x-text="item"></li></template></ul>"#,
    )
    .expect("valid html");
    let sting = Sting::with_document(
        doc,
        StingConfig::new()
            .with_auto_start(false)
            .with_observe_mutations(false),
    );
    let (items, set_items) = sting.create_signal(json!(["a", "b", "c"]));
    {
        let state = (items, set_items.clone());
        sting
            .register_component("list", move |_| Scope::new().with("items", state.clone()))
            .expect("valid name");
    }
    sting.start(None).expect("starts");
    let baseline = sting.document().dom().len();

    for round in 0..100 {
        set_items.set(json!(["a", "b", round]));
    }
    assert_eq!(sting.document().dom().len(), baseline);
}

#[test]
fn test_for_items_call_back_with_their_item() {
    let pilot = Pilot::from_html(concat!(
        r#"<div x-data="picker">"#,
        r#"<p data-testid="picked" x-text="picked"></p>"#,
        r#"<template x-for="fruit in fruits">"#,
        r#"<button x-bind:data-testid="fruit" x-on:click="pick(fruit)" x-text="fruit"></button>"#,
        r#"</template>"#,
        r#"</div>"#,
    ))
    .expect("valid html");
    pilot
        .sting()
        .register_component("picker", |s| {
            let (picked, set_picked) = s.create_signal(Value::Null);
            let pick = set_picked.clone();
            Scope::new()
                .with("picked", (picked, set_picked))
                .with("fruits", json!(["apple", "pear"]))
                .with(
                    "pick",
                    Handler::new(move |args| {
                        if let Some(v) = args.first().and_then(Arg::as_value) {
                            pick.set(v.clone());
                        }
                    }),
                )
        })
        .expect("valid name");
    pilot.tick();
    assert_eq!(pilot.text("picked"), "");
    pilot.click("pear");
    assert_eq!(pilot.text("picked"), "pear");
}

// ---------------------------------------------------------------------------
// Mount lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_unmount_is_idempotent_and_remount_is_fresh() {
    let sting = manual(COUNTER);
    let factory_runs = Rc::new(Cell::new(0));
    {
        let factory_runs = factory_runs.clone();
        sting
            .register_component("counter", move |s| {
                factory_runs.set(factory_runs.get() + 1);
                counter(s)
            })
            .expect("valid name");
    }
    sting.start(None).expect("starts");
    let pilot = Pilot::new(sting.clone());
    let root = pilot.find("root");

    pilot.click("inc");
    assert_eq!(pilot.text("count"), "1");

    assert!(sting.unmount_component(root));
    assert!(!sting.unmount_component(root));
    pilot.click("inc");
    assert_eq!(pilot.text("count"), "1");
    assert_eq!(pilot.document().dom().total_listeners(), 0);

    assert!(sting.mount_component(root).expect("mounts"));
    assert_eq!(factory_runs.get(), 2);
    assert_eq!(pilot.text("count"), "0");
    pilot.click("inc");
    assert_eq!(pilot.text("count"), "1");
}

#[test]
fn test_timers_are_cancelled_on_unmount() {
    let sting = manual(r#"<div data-testid="clock" x-data="clock"><b data-testid="t" x-text="seconds"></b></div>"#);
    sting
        .register_component("clock", |s| {
            let (seconds, set_seconds) = s.create_signal(json!(0));
            let tick = set_seconds.clone();
            s.set_interval_safe(move || tick.update(|n| json!(as_int(n) + 1)), 1000)
                .expect("inside setup");
            Scope::new().with("seconds", (seconds, set_seconds))
        })
        .expect("valid name");
    sting.start(None).expect("starts");
    let pilot = Pilot::new(sting.clone());

    pilot.advance(3500);
    assert_eq!(pilot.text("t"), "3");
    assert_eq!(pilot.document().pending_timers(), 1);

    sting.unmount_component(pilot.find("clock"));
    assert_eq!(pilot.document().pending_timers(), 0);
    pilot.advance(2000);
    assert_eq!(pilot.text("t"), "3");
}

#[test]
fn test_auto_start_waits_for_loading_document() {
    let doc = Document::loading();
    doc.dom_mut()
        .append_html(doc.body(), COUNTER)
        .expect("valid html");
    let sting = Sting::with_document(doc, StingConfig::default());
    sting
        .register_component("counter", counter)
        .expect("valid name");
    let pilot = Pilot::new(sting.clone());

    pilot.tick();
    assert_eq!(pilot.text("count"), "");
    sting.document().finish_loading();
    assert_eq!(pilot.text("count"), "0");
}

#[test]
fn test_stop_tears_everything_down() {
    let pilot = Pilot::from_html(COUNTER).expect("valid html");
    let sting = pilot.sting();
    sting
        .register_component("counter", counter)
        .expect("valid name");
    pilot.tick();
    assert!(sting.is_started());

    sting.stop();
    assert!(!sting.is_started());
    assert!(!sting.is_mounted(pilot.find("root")));
    assert_eq!(sting.reactor().effect_count(), 0);
    assert_eq!(pilot.document().dom().total_listeners(), 0);
}

// ---------------------------------------------------------------------------
// Path safety
// ---------------------------------------------------------------------------

#[cfg(debug_assertions)]
#[test]
fn test_unsafe_paths_are_rejected() {
    for markup in [
        r#"<div x-data="c"><span x-text="count + 1"></span></div>"#,
        r#"<div x-data="c"><span x-show="a; b"></span></div>"#,
        r#"<div x-data="c"><span x-text="items[0]"></span></div>"#,
    ] {
        let sting = manual(markup);
        sting.register_component("c", counter).expect("valid name");
        assert!(
            matches!(sting.start(None), Err(StingError::InvalidPath { .. })),
            "accepted {markup}"
        );
    }
}

#[cfg(debug_assertions)]
#[test]
fn test_malformed_handler_calls_are_rejected() {
    let sting = manual(r#"<div x-data="c"><button x-on:click="increment(1 + 2)"></button></div>"#);
    sting.register_component("c", counter).expect("valid name");
    assert!(matches!(
        sting.start(None),
        Err(StingError::MalformedExpression { .. })
    ));
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

#[test]
fn test_store_writes_replace_the_snapshot() {
    let sting = Sting::new();
    let (user, set_user) = sting.create_store(json!({"name": "Ada", "tags": []}));
    let before = user.snapshot();

    set_user.update(Sting::produce(|draft| draft["name"] = json!("X")));

    let after = user.snapshot();
    assert!(!before.ptr_eq(&after));
    assert_eq!(before["name"], json!("Ada"));
    assert_eq!(after["name"], json!("X"));
}

#[test]
fn test_store_paths_bind_two_ways() {
    let pilot = Pilot::from_html(concat!(
        r#"<div x-data="profile">"#,
        r#"<input data-testid="city" x-model="user.address.city">"#,
        r#"<span data-testid="shown" x-text="user.address.city"></span>"#,
        r#"</div>"#,
    ))
    .expect("valid html");
    let sting = pilot.sting().clone();
    let (user, _set_user) = sting.create_store(json!({"address": {"city": "Oslo"}}));
    {
        let user = user.clone();
        sting
            .register_component("profile", move |_| Scope::new().with("user", user.clone()))
            .expect("valid name");
    }
    pilot.tick();
    assert_eq!(pilot.value("city"), "Oslo");

    pilot.input("city", "Lima");
    assert_eq!(pilot.text("shown"), "Lima");
    assert_eq!(user.at("address").at("city").get(), json!("Lima"));
}

// ---------------------------------------------------------------------------
// Form controls
// ---------------------------------------------------------------------------

#[test]
fn test_model_on_checkbox_radio_and_select() {
    let pilot = Pilot::from_html(concat!(
        r#"<form x-data="prefs">"#,
        r#"<input data-testid="agree" type="checkbox" x-model="agree">"#,
        r#"<input data-testid="small" type="radio" name="size" value="s" x-model="size">"#,
        r#"<input data-testid="large" type="radio" name="size" value="l" x-model="size">"#,
        r#"<select data-testid="color" x-model="color"><option>red</option><option>blue</option></select>"#,
        r#"<p data-testid="summary" x-show="agree">agreed</p>"#,
        r#"</form>"#,
    ))
    .expect("valid html");
    let sting = pilot.sting().clone();
    let (agree, set_agree) = sting.create_signal(json!(false));
    let (size, set_size) = sting.create_signal(json!("s"));
    let (color, set_color) = sting.create_signal(json!("red"));
    {
        let state = (agree, set_agree, size.clone(), set_size, color.clone(), set_color);
        sting
            .register_component("prefs", move |_| {
                let (agree, set_agree, size, set_size, color, set_color) = state.clone();
                Scope::new()
                    .with("agree", (agree, set_agree))
                    .with("size", (size, set_size))
                    .with("color", (color, set_color))
            })
            .expect("valid name");
    }
    pilot.tick();

    assert!(pilot.is_checked("small"));
    assert!(!pilot.is_checked("large"));
    assert!(!pilot.is_visible("summary"));

    pilot.check("agree", true);
    assert!(pilot.is_visible("summary"));

    pilot.check("large", true);
    assert_eq!(size.get(), json!("l"));
    assert!(!pilot.is_checked("small"));

    pilot.select("color", "blue");
    assert_eq!(color.get(), json!("blue"));
}

#[test]
fn test_model_on_number_input_keeps_what_was_typed() {
    let pilot = Pilot::from_html(concat!(
        r#"<div x-data="qty">"#,
        r#"<input data-testid="n" type="number" x-model="amount">"#,
        r#"</div>"#,
    ))
    .expect("valid html");
    let sting = pilot.sting().clone();
    let (amount, set_amount) = sting.create_signal(json!(0));
    {
        let state = (amount.clone(), set_amount.clone());
        sting
            .register_component("qty", move |_| Scope::new().with("amount", state.clone()))
            .expect("valid name");
    }
    pilot.tick();
    assert_eq!(pilot.value("n"), "0");

    pilot.input("n", "1.");
    assert_eq!(pilot.value("n"), "1.");
    assert_eq!(amount.get(), json!(1.0));

    pilot.input("n", "2.50");
    assert_eq!(pilot.value("n"), "2.50");
    assert_eq!(amount.get(), json!(2.5));

    set_amount.set(json!(7));
    assert_eq!(pilot.value("n"), "7");
}

#[test]
fn test_bind_class_and_disabled() {
    let pilot = Pilot::from_html(concat!(
        r#"<div x-data="btn">"#,
        r#"<button data-testid="b" class="base" x-bind:class="classes" x-bind:disabled="busy" x-on:click="work">go</button>"#,
        r#"</div>"#,
    ))
    .expect("valid html");
    pilot
        .sting()
        .register_component("btn", |s| {
            let (busy, set_busy) = s.create_signal(json!(false));
            let busy_read = busy.clone();
            let start = set_busy.clone();
            Scope::new()
                .with("busy", (busy, set_busy))
                .with(
                    "classes",
                    sting::Getter::new(move || json!({"btn": true, "loading": busy_read.get()})),
                )
                .with("work", Handler::new(move |_| start.set(json!(true))))
        })
        .expect("valid name");
    pilot.tick();
    assert_eq!(pilot.attr("b", "class").as_deref(), Some("btn"));
    assert_eq!(pilot.attr("b", "disabled"), None);

    pilot.click("b");
    assert_eq!(pilot.attr("b", "class").as_deref(), Some("btn loading"));
    assert_eq!(pilot.attr("b", "disabled").as_deref(), Some(""));
}

// ---------------------------------------------------------------------------
// Extension
// ---------------------------------------------------------------------------

#[test]
fn test_plugin_directive_runs_and_unregisters() {
    let pilot = Pilot::from_html(concat!(
        r#"<div x-data="c">"#,
        r#"<p data-testid="shout" x-upper="greeting"></p>"#,
        r#"</div>"#,
    ))
    .expect("valid html");
    let sting = pilot.sting();
    let mut handle = None;
    sting.use_plugin(|api| {
        handle = Some(api.register_directive(|ctx| {
            let Some(expr) = ctx.attr("x-upper") else {
                return Ok(());
            };
            let Some(path) = ctx.safe_path("x-upper", &expr)? else {
                return Ok(());
            };
            let el = ctx.el();
            let scope = ctx.scope().clone();
            let doc = ctx.weak_document();
            ctx.effect(move || {
                let text = sting::scope::display(&sting::scope::get_path(&scope, &path));
                if let Some(doc) = doc.upgrade() {
                    doc.dom_mut().set_text_content(el, &text.to_uppercase());
                }
            });
            Ok(())
        }));
    });
    sting
        .register_component("c", |_| Scope::new().with("greeting", json!("hello")))
        .expect("valid name");
    pilot.tick();
    assert_eq!(pilot.text("shout"), "HELLO");

    assert!(handle.is_some_and(|h| h.unregister()));
}
