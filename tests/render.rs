mod helpers;

use std::io;

use tmpl::{value, Engine, ErrorKind, FieldAccess, Object, Value};

use crate::helpers::Writer;

fn render(source: &str, data: Value) -> tmpl::Result<String> {
    Engine::new().compile(source)?.render_from(&data)
}

#[track_caller]
fn render_ok(source: &str, data: Value) -> String {
    render(source, data).unwrap_or_else(|err| panic!("{err:#}"))
}

#[track_caller]
fn render_err(source: &str, data: Value) -> tmpl::Error {
    render(source, data).unwrap_err()
}

#[test]
fn render_literal() {
    let result = render_ok("this is just a literal", Value::None);
    assert_eq!(result, "this is just a literal");
}

#[test]
fn render_constant_if() {
    for (source, exp) in [
        ("{% if 1 %}test{% end if %}", "test"),
        ("{% if 0 %}fail{% else %}test{% end if %}", "test"),
        ("{% if 0 %}fail{% end if %}", ""),
        (r#"{% if "x" %}test{% else %}fail{% end if %}"#, "test"),
        (r#"{% if "" %}fail{% else %}test{% end if %}"#, "test"),
        ("{% if 0.0 %}fail{% else %}test{% end if %}", "test"),
        ("{% if -2 %}test{% end if %}", "test"),
    ] {
        assert_eq!(render_ok(source, Value::None), exp, "{source}");
    }
}

#[test]
fn render_splice_points() {
    assert_eq!(render_ok("t{%%}e{%%}s{%%}t{%%}", Value::None), "test");
}

#[test]
fn render_block_without_override() {
    assert_eq!(
        render_ok("{% block foo %}test{% end block %}", Value::None),
        "test"
    );
}

#[test]
fn render_scalars() {
    for (data, exp) in [
        (value!({ v: true }), "true"),
        (value!({ v: false }), "false"),
        (value!({ v: 123 }), "123"),
        (value!({ v: -123 }), "-123"),
        (value!({ v: 12.5 }), "12.5"),
        (value!({ v: "text" }), "text"),
        (value!({ v: None }), ""),
    ] {
        assert_eq!(render_ok("<{% .v %}>", data), format!("<{exp}>"));
    }
}

#[test]
fn render_literal_exprs() {
    assert_eq!(render_ok(r#"{% "a\tb\n" %}"#, Value::None), "a\tb\n");
    assert_eq!(render_ok("{% 42 %}", Value::None), "42");
    assert_eq!(render_ok("{% 1e3 %}", Value::None), "1000");
}

#[test]
fn render_err_unrenderable() {
    for (data, kind) in [
        (value!({ v: [1, 2] }), "list"),
        (value!({ v: { a: 1 } }), "map"),
    ] {
        let err = render_err("{% .v %}", data);
        assert_eq!(err.kind(), ErrorKind::Render);
        assert_eq!(
            err.message(),
            format!("expected renderable value, found {kind}")
        );
    }
}

#[test]
fn render_whitespace_only_text_is_elided() {
    assert_eq!(render_ok("{% .a %} {% .b %}", value!({ a: 1, b: 2 })), "12");
    assert_eq!(render_ok("{% .a %} - {% .b %}", value!({ a: 1, b: 2 })), "1 - 2");
}

#[test]
fn render_runtime_if() {
    let source = "{% if .v %}yes{% else %}no{% end if %}";
    for (data, exp) in [
        (value!({ v: true }), "yes"),
        (value!({ v: false }), "no"),
        (value!({ v: 1 }), "yes"),
        (value!({ v: 0 }), "no"),
        (value!({ v: 0.5 }), "yes"),
        (value!({ v: 0.0 }), "no"),
        (value!({ v: "x" }), "yes"),
        (value!({ v: "" }), "no"),
        (value!({ v: None }), "no"),
        (value!({ v: [1] }), "no"),
    ] {
        assert_eq!(render_ok(source, data), exp);
    }
}

#[test]
fn render_runtime_if_matches_folding() {
    for (lit, value) in [
        ("0", Value::Integer(0)),
        ("1", Value::Integer(1)),
        ("0.0", Value::Float(0.0)),
        ("2.5", Value::Float(2.5)),
        (r#""""#, Value::from("")),
        (r#""a""#, Value::from("a")),
    ] {
        let folded = render_ok(
            &format!("{{% if {lit} %}}yes{{% else %}}no{{% end if %}}"),
            Value::None,
        );
        let runtime = render_ok(
            "{% if .v %}yes{% else %}no{% end if %}",
            Value::from([("v", value)]),
        );
        assert_eq!(folded, runtime, "{lit}");
    }
}

#[test]
fn render_if_call_condition() {
    let mut engine = Engine::new();
    engine.add_function("even", |i: i64| i % 2 == 0);
    let template = engine
        .compile("{% if call even .n %}even{% else %}odd{% end if %}")
        .unwrap();
    assert_eq!(template.render_from(&value!({ n: 4 })).unwrap(), "even");
    assert_eq!(template.render_from(&value!({ n: 3 })).unwrap(), "odd");
}

#[test]
fn render_range_list() {
    let result = render_ok(
        "{% range .xs as x %}[{% .x %}]{% end range %}",
        value!({ xs: [1, 2, 3] }),
    );
    assert_eq!(result, "[1][2][3]");
}

#[test]
fn render_range_list_index() {
    let result = render_ok(
        "{% range .xs as i, x %}{% .i %}={% .x %};{% end range %}",
        value!({ xs: ["a", "b"] }),
    );
    assert_eq!(result, "0=a;1=b;");
}

#[test]
fn render_range_map() {
    let result = render_ok(
        "{% range .m as k, v %}{% .k %}:{% .v %},{% end range %}",
        value!({ m: { b: 2, a: 1 } }),
    );
    assert_eq!(result, "a:1,b:2,");

    let result = render_ok(
        "{% range .m as v %}{% .v %},{% end range %}",
        value!({ m: { b: 2, a: 1 } }),
    );
    assert_eq!(result, "1,2,");
}

#[test]
fn render_range_empty() {
    let result = render_ok("a{% range .xs as x %}{% .x %}{% end range %}b", value!({ xs: [] }));
    assert_eq!(result, "ab");
}

#[test]
fn render_range_nested() {
    let result = render_ok(
        "{% range .rows as row %}{% range .row as cell %}{% .cell %}{% end range %};{% end range %}",
        value!({ rows: [[1, 2], [3]] }),
    );
    assert_eq!(result, "12;3;");
}

#[test]
fn render_range_binding_is_scoped() {
    let result = render_ok(
        "{% range .xs as x %}{% .x %}{% end range %}-{% .x %}",
        value!({ xs: [1, 2], x: "outer" }),
    );
    assert_eq!(result, "12-outer");
}

#[test]
fn render_range_binding_fields() {
    let result = render_ok(
        "{% range .users as user %}<{% .user.name %}>{% end range %}",
        value!({ users: [{ name: "John" }, { name: "Jane" }] }),
    );
    assert_eq!(result, "<John><Jane>");
}

#[test]
fn render_err_range_not_iterable() {
    let err = render_err("{% range .n as x %}{% .x %}{% end range %}", value!({ n: 1 }));
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(err.message(), "expected iterable, found integer");
}

#[test]
fn render_with() {
    let data = value!({ site: "example.org", user: { name: "John", address: { city: "Paris" } } });
    for (source, exp) in [
        ("{% with .user %}{% .name %}{% end with %}", "John"),
        ("{% with .user.address %}{% .city %}{% end with %}", "Paris"),
        ("{% with .user %}{% $.site %}{% end with %}", "example.org"),
        ("{% with .user.address %}{% $$.site %}{% end with %}", "example.org"),
        ("{% with .user.address %}{% $.name %}{% end with %}", "John"),
        ("{% with .user.address %}{% /.site %}{% end with %}", "example.org"),
        ("{% with .user %}{% with .address %}{% .city %}{% end with %}{% end with %}", "Paris"),
        ("{% with .user %}{% .name %}{% end with %}:{% .site %}", "John:example.org"),
    ] {
        assert_eq!(render_ok(source, data.clone()), exp, "{source}");
    }
}

#[test]
fn render_with_range() {
    let result = render_ok(
        "{% with .user %}{% range .tags as t %}{% .t %}{% $.sep %}{% end range %}{% end with %}",
        value!({ sep: "|", user: { tags: ["a", "b"] } }),
    );
    assert_eq!(result, "a|b|");
}

#[test]
fn render_err_selectors() {
    let data = value!({ n: 1, user: { name: "John" } });
    for (source, msg) in [
        ("{% .missing %}", "field not found at `/.missing`"),
        ("{% .user.missing %}", "field not found at `/.user.missing`"),
        ("{% $ %}", "cannot pop 1 items from path `/.`"),
        ("{% .n.x %}", "cannot indirect into integer to find `/.n.x`"),
        ("{% with .user %}{% $$ %}{% end with %}", "cannot pop 2 items from path `/.user`"),
        ("{% with .missing %}a{% end with %}", "field not found at `/.missing`"),
    ] {
        let err = render_err(source, data.clone());
        assert_eq!(err.kind(), ErrorKind::Render, "{source}");
        assert_eq!(err.message(), msg, "{source}");
    }
}

#[test]
fn render_err_display() {
    let err = render_err("lorem {% .ipsum %}", value!({}));
    assert_eq!(
        err.to_string(),
        "field not found at `/.ipsum` between bytes 9 and 15"
    );
    assert_eq!(
        format!("{err:#}"),
        "
   |
 1 | lorem {% .ipsum %}
   |          ^^^^^^ field not found at `/.ipsum`
"
    );
}

#[test]
fn render_err_named_template() {
    let engine = Engine::new();
    let err = engine
        .compile_named("page", "{% .missing %}")
        .unwrap()
        .render_from(&Value::None)
        .unwrap_err();
    assert_eq!(err.template_name(), Some("page"));
}

#[test]
fn render_failure_restores_context() {
    let engine = Engine::new();
    let template = engine
        .compile("{% with .user %}{% range .tags as t %}{% .t %}{% .missing %}{% end range %}{% end with %}")
        .unwrap();
    let data = value!({ user: { tags: ["a"] } });
    let mut ctx = engine.context(&data);
    ctx.set_at("/.user.t", "kept");

    let mut w = Writer::new();
    let err = template.execute(&mut w, &mut ctx).unwrap_err();
    assert_eq!(err.message(), "field not found at `/.user.missing`");
    assert_eq!(w.into_string(), "a");

    assert!(ctx.path().is_root());
    assert_eq!(ctx.unset_at("/.user.t"), Some(Value::from("kept")));
}

#[test]
fn render_context_overrides() {
    let engine = Engine::new();
    let template = engine.compile("{% .user.name %}").unwrap();
    let data = value!({ user: { name: "John" } });
    let mut ctx = engine.context(&data);
    ctx.set_at("/.user.name", "Jane");

    let mut w = Writer::new();
    template.execute(&mut w, &mut ctx).unwrap();
    assert_eq!(w.into_string(), "Jane");
}

#[test]
fn render_custom_syntax() {
    let syntax = tmpl::Syntax::builder().directive("<%", "%>").build();
    let result = Engine::with_syntax(syntax)
        .compile("<% if .x %>{% .x %}=<% .x %><% end if %>")
        .unwrap()
        .render_from(&value!({ x: 1 }))
        .unwrap();
    assert_eq!(result, "{% .x %}=1");
}

#[derive(Debug)]
struct Env {
    panics: bool,
}

impl FieldAccess for Env {
    fn field(&self, name: &str) -> Option<Value> {
        if self.panics {
            panic!("env is unavailable");
        }
        match name {
            "user" => Some(Value::from("root")),
            "home" => Some(Value::from([("path", "/root")])),
            _ => None,
        }
    }

    fn type_name(&self) -> &str {
        "env"
    }
}

#[derive(Debug)]
struct Lazy(Value);

impl FieldAccess for Lazy {
    fn field(&self, _: &str) -> Option<Value> {
        None
    }

    fn indirect(&self) -> Option<Value> {
        Some(self.0.clone())
    }
}

#[test]
fn render_object_fields() {
    let data = value!({ env: (Object::new(Env { panics: false })) });
    assert_eq!(render_ok("{% .env.user %}", data.clone()), "root");
    assert_eq!(render_ok("{% .env.home.path %}", data.clone()), "/root");
    let err = render_err("{% .env.missing %}", data);
    assert_eq!(err.message(), "field not found at `/.env.missing`");
}

#[test]
fn render_object_indirect() {
    let data = value!({ cell: (Object::new(Lazy(value!([1, 2])))) });
    assert_eq!(
        render_ok("{% range .cell as x %}{% .x %}{% end range %}", data),
        "12"
    );

    let data = value!({ cell: (Object::new(Lazy(value!({ a: "b" })))) });
    assert_eq!(render_ok("{% .cell.a %}", data), "b");
}

#[test]
fn render_object_indirect_value() {
    let data = value!({ cell: (Object::new(Lazy(value!("hi")))) });
    assert_eq!(render_ok("{% .cell %}", data), "hi");

    let data = value!({ cell: (Object::new(Lazy(value!(1)))) });
    assert_eq!(render_ok("{% if .cell %}yes{% else %}no{% end if %}", data), "yes");

    let data = value!({ cell: (Object::new(Lazy(value!(0)))) });
    assert_eq!(render_ok("{% if .cell %}yes{% else %}no{% end if %}", data), "no");

    let data = value!({ cell: (Object::new(Lazy(value!([1, 2])))) });
    let err = render_err("{% .cell %}", data);
    assert_eq!(err.message(), "expected renderable value, found list");
}

#[test]
fn render_err_object_type_name() {
    for (source, msg) in [
        ("{% .env %}", "expected renderable value, found env"),
        (
            "{% range .env as x %}{% .x %}{% end range %}",
            "expected iterable, found env",
        ),
    ] {
        let data = value!({ env: (Object::new(Env { panics: false })) });
        let err = render_err(source, data);
        assert_eq!(err.kind(), ErrorKind::Render);
        assert_eq!(err.message(), msg);
    }
}

#[test]
fn render_object_panic_is_contained() {
    let data = value!({ env: (Object::new(Env { panics: true })) });
    let err = render_err("{% .env.user %}", data);
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(
        err.message(),
        "field access panicked at `/.env.user`: env is unavailable"
    );
}

#[test]
fn render_to_writer() {
    let mut w = Writer::new();
    Engine::new()
        .compile("lorem {% .ipsum %}")
        .unwrap()
        .render_from_to_writer(&mut w, &value!({ ipsum: "dolor" }))
        .unwrap();
    assert_eq!(w.into_string(), "lorem dolor");
}

#[test]
fn render_to_writer_err() {
    let mut w = Writer::with_max(1);
    let err = Engine::new()
        .compile("lorem {% .ipsum %}")
        .unwrap()
        .render_from_to_writer(&mut w, &value!({ ipsum: "dolor" }))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    let source = std::error::Error::source(&err)
        .and_then(|s| s.downcast_ref::<io::Error>())
        .unwrap();
    assert_eq!(source.kind(), io::ErrorKind::AddrInUse);
}

#[cfg(feature = "serde")]
#[test]
fn render_serde_struct() {
    #[derive(serde::Serialize)]
    struct Data {
        users: Vec<User>,
    }

    #[derive(serde::Serialize)]
    struct User {
        name: String,
        admin: bool,
    }

    let data = Data {
        users: vec![
            User {
                name: "John".into(),
                admin: true,
            },
            User {
                name: "Jane".into(),
                admin: false,
            },
        ],
    };
    let result = Engine::new()
        .compile("{% range .users as u %}{% .u.name %}{% if .u.admin %}*{% end if %};{% end range %}")
        .unwrap()
        .render(&data)
        .unwrap();
    assert_eq!(result, "John*;Jane;");

    let result = Engine::new()
        .compile("{% range .users as u %}{% range .u as k, v %}{% .k %}={% .v %},{% end range %}{% end range %}")
        .unwrap()
        .render(&data)
        .unwrap();
    assert_eq!(result, "admin=true,name=John,admin=false,name=Jane,");
}
