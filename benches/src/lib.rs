pub mod context;

/// A base page with two overridable blocks and a loop over users.
pub const BASE: &str = r#"<html>
  <head><title>{% block title %}{% .title %}{% end block %}</title></head>
  <body>
    {% block content %}
    <ul>
      {% range .users as user %}
      {% if .user.is_disabled %}
      <li class="disabled">{% .user.name %} ({% .user.age %})</li>
      {% else %}
      <li>{% call upper .user.name %} ({% .user.age %})</li>
      {% end if %}
      {% end range %}
    </ul>
    {% end block %}
  </body>
</html>
"#;

/// A page overriding the title block of [`BASE`].
pub const PAGE: &str = r#"{% block title %}Users of {% /.title %}{% end block %}"#;

/// Returns an engine with the functions used by the benchmark templates.
pub fn engine() -> tmpl::Engine<'static> {
    let mut engine = tmpl::Engine::new();
    engine.add_function("upper", |s: String| s.to_uppercase());
    engine
}

/// Repeats `source` `n` times.
pub fn repeat(source: &str, n: usize) -> String {
    source.repeat(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_renders_every_user() {
        let ctx = context::random(10);
        let result = engine().compile(BASE).unwrap().render(&ctx).unwrap();
        for user in &ctx.users {
            assert!(result.contains(&user.age.to_string()));
        }
    }

    #[test]
    fn page_overrides_title() {
        let ctx = context::random(1);
        let engine = engine();
        let base = engine.compile(BASE).unwrap();
        let page = engine.compile(PAGE).unwrap();
        let result = base.render_extended(&page, &ctx).unwrap();
        assert!(result.contains(&format!("<title>Users of {}</title>", ctx.title)));
    }
}
