#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde::Serialize;

#[derive(Debug, Serialize, Arbitrary)]
enum Value {
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

fuzz_target!(|data: (&str, Option<&str>, Value)| {
    let (base, child, value) = data;
    let mut engine = tmpl::Engine::new();
    engine.add_variadic_function("echo", |args: Vec<tmpl::Value>| args.into_iter().next());
    let Ok(base) = engine.compile_named("base", base) else {
        return;
    };
    match child.map(|source| engine.compile_named("child", source)) {
        Some(Ok(child)) => {
            let _ = base.render_extended(&child, &value);
        }
        Some(Err(_)) => {}
        None => {
            let _ = base.render(&value);
        }
    }
});
