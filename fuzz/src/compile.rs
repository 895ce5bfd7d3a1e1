#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let engine = tmpl::Engine::new();
    let _ = engine.compile_named("fuzz", data);
});
