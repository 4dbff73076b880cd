/// Which character(s) one level of indentation is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IndentKind {
    Space(usize),
    Tab,
}

impl Default for IndentKind {
    fn default() -> Self {
        IndentKind::Space(2)
    }
}

/// Formatter options (spec.md §4.G). `print_width` bounds the "does this
/// collapse to one line" decision for objects and lists; `preserve_comments`
/// set to `false` drops every comment instead of re-emitting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatConfig {
    pub indent: IndentKind,
    pub print_width: usize,
    pub preserve_comments: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: IndentKind::default(),
            print_width: 80,
            preserve_comments: true,
        }
    }
}

impl FormatConfig {
    pub(crate) fn print_options(&self) -> wadler_lindig::PrintOptions {
        match self.indent {
            IndentKind::Space(n) => wadler_lindig::PrintOptions {
                print_width: self.print_width,
                indent_width: n.max(1),
                use_tabs: false,
            },
            IndentKind::Tab => wadler_lindig::PrintOptions {
                print_width: self.print_width,
                indent_width: 2,
                use_tabs: true,
            },
        }
    }
}
