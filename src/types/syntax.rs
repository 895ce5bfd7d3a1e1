/// The template syntax configuration.
///
/// Use [`Syntax::default()`] to get the default syntax configuration and
/// [`Syntax::builder()`] to create a custom syntax configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub(crate) begin: String,
    pub(crate) end: String,
}

/// A builder for the syntax configuration.
///
/// This struct is typically created using [`Syntax::builder()`].
#[derive(Debug, Clone)]
pub struct SyntaxBuilder<'a> {
    directive: Option<(&'a str, &'a str)>,
}

impl Default for Syntax {
    /// Returns the default syntax configuration.
    ///
    /// This is equivalent to the following.
    /// ```
    /// use tmpl::Syntax;
    ///
    /// let syntax = Syntax::builder().directive("{%", "%}").build();
    /// assert_eq!(syntax, Syntax::default());
    /// ```
    #[inline]
    fn default() -> Self {
        Syntax::builder().directive("{%", "%}").build()
    }
}

impl Syntax {
    /// Create a new syntax builder.
    ///
    /// # Examples
    ///
    /// ```
    /// let syntax = tmpl::Syntax::builder()
    ///     .directive("<%", "%>")
    ///     .build();
    /// ```
    #[inline]
    pub fn builder<'a>() -> SyntaxBuilder<'a> {
        SyntaxBuilder::new()
    }

    /// Returns the begin and end directive delimiters.
    #[inline]
    pub fn delimiters(&self) -> (&str, &str) {
        (&self.begin, &self.end)
    }
}

impl<'a> SyntaxBuilder<'a> {
    /// Creates a new syntax builder.
    #[inline]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { directive: None }
    }

    /// Set the directive syntax.
    ///
    /// If not set then the default `{%` and `%}` delimiters are used.
    ///
    /// # Panics
    ///
    /// If either of the strings are empty or if they are equal.
    #[inline]
    pub fn directive(&mut self, begin: &'a str, end: &'a str) -> &mut Self {
        assert!(!begin.is_empty() && !end.is_empty());
        assert!(begin != end, "directive delimiters must be distinct");
        self.directive = Some((begin, end));
        self
    }

    /// Builds the syntax configuration.
    pub fn build(&self) -> Syntax {
        let (begin, end) = self.directive.unwrap_or(("{%", "%}"));
        Syntax {
            begin: begin.into(),
            end: end.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_builder_default_delimiters() {
        let syntax = SyntaxBuilder::new().build();
        assert_eq!(syntax.delimiters(), ("{%", "%}"));
    }

    #[test]
    #[should_panic]
    fn syntax_builder_rejects_equal_delimiters() {
        Syntax::builder().directive("%%", "%%");
    }
}
