//! A Wadler-Lindig style pretty-printing IR and printer.
//!
//! This crate has no consumer-visible concept of a source language: it
//! is the generic `Doc` tree (`Text`, `Group`, `Indent`, line variants,
//! `IfBreak`, `Fill`, `Align`, `BreakParent`) and the `print` algorithm
//! that decides, group by group, whether a flat rendering fits the
//! configured print width.

use std::rc::Rc;

/// The pretty-printing intermediate representation.
#[derive(Debug, Clone)]
pub enum Doc {
    Text(Rc<str>),
    Concat(Vec<Doc>),
    /// Tries to render flat; breaks (to one line per `Line`) if it
    /// doesn't fit, or if it transitively contains a `Hardline` /
    /// `BreakParent`.
    Group(Box<Doc>),
    Indent(Box<Doc>),
    /// A space when the enclosing group is flat, a newline otherwise.
    Line,
    /// Nothing when the enclosing group is flat, a newline otherwise.
    Softline,
    /// Always a newline, and forces every enclosing group to break.
    Hardline,
    /// Renders the first `Doc` when the enclosing group breaks, the
    /// second when it stays flat.
    IfBreak(Box<Doc>, Box<Doc>),
    /// Alternates content and separators; each separator independently
    /// decides whether the *next* content fits on the current line.
    Fill(Vec<Doc>),
    /// Adds `n` spaces of indentation in addition to the ambient indent.
    Align(usize, Box<Doc>),
    /// Forces every enclosing group to break, without emitting anything.
    BreakParent,
}

impl Doc {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Doc::Text(Rc::from(s.into()))
    }

    #[must_use]
    pub fn concat(docs: impl IntoIterator<Item = Doc>) -> Self {
        Doc::Concat(docs.into_iter().collect())
    }

    #[must_use]
    pub fn group(doc: Doc) -> Self {
        Doc::Group(Box::new(doc))
    }

    #[must_use]
    pub fn indent(doc: Doc) -> Self {
        Doc::Indent(Box::new(doc))
    }

    #[must_use]
    pub fn if_break(broken: Doc, flat: Doc) -> Self {
        Doc::IfBreak(Box::new(broken), Box::new(flat))
    }

    #[must_use]
    pub fn join(sep: Doc, docs: impl IntoIterator<Item = Doc>) -> Self {
        let mut out = Vec::new();
        for (i, d) in docs.into_iter().enumerate() {
            if i > 0 {
                out.push(sep.clone());
            }
            out.push(d);
        }
        Doc::Concat(out)
    }

    fn contains_forced_break(&self) -> bool {
        match self {
            Doc::Hardline | Doc::BreakParent => true,
            Doc::Text(_) | Doc::Line | Doc::Softline => false,
            Doc::Concat(docs) | Doc::Fill(docs) => docs.iter().any(Doc::contains_forced_break),
            Doc::Group(d) | Doc::Indent(d) | Doc::Align(_, d) => d.contains_forced_break(),
            Doc::IfBreak(a, b) => a.contains_forced_break() || b.contains_forced_break(),
        }
    }
}

/// Recursively mark every group inside `doc` as forced to break, the
/// way a document with leading comments must never collapse to one
/// line. Implemented by splicing in a `BreakParent` alongside it.
#[must_use]
pub fn force_group_break(doc: Doc) -> Doc {
    Doc::Concat(vec![doc, Doc::BreakParent])
}

#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
    pub print_width: usize,
    pub indent_width: usize,
    pub use_tabs: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            print_width: 80,
            indent_width: 2,
            use_tabs: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Flat,
    Break,
}

#[derive(Clone)]
struct Cmd {
    indent: usize,
    mode: Mode,
    doc: Doc,
}

fn make_indent(options: &PrintOptions, width: usize) -> String {
    if options.use_tabs {
        "\t".repeat(width / options.indent_width.max(1))
    } else {
        " ".repeat(width)
    }
}

/// Whether the commands starting with `first` (and the rest of the
/// command stack in `rest`, innermost last) fit within `remaining`
/// columns when rendered flat.
fn fits(mut first: Cmd, rest: &[Cmd], mut remaining: i64, options: &PrintOptions) -> bool {
    let mut stack = vec![first.clone()];
    let mut rest_idx = rest.len();
    loop {
        if remaining < 0 {
            return false;
        }
        let Some(cmd) = stack.pop() else {
            if rest_idx == 0 {
                return true;
            }
            rest_idx -= 1;
            stack.push(rest[rest_idx].clone());
            continue;
        };
        first = cmd.clone();
        match &first.doc {
            Doc::Text(s) => {
                remaining -= s.chars().count() as i64;
            }
            Doc::Concat(docs) => {
                for d in docs.iter().rev() {
                    stack.push(Cmd {
                        indent: first.indent,
                        mode: first.mode,
                        doc: d.clone(),
                    });
                }
            }
            Doc::Fill(docs) => {
                for d in docs.iter().rev() {
                    stack.push(Cmd {
                        indent: first.indent,
                        mode: first.mode,
                        doc: d.clone(),
                    });
                }
            }
            Doc::Indent(d) => stack.push(Cmd {
                indent: first.indent + options.indent_width,
                mode: first.mode,
                doc: (**d).clone(),
            }),
            Doc::Align(n, d) => stack.push(Cmd {
                indent: first.indent + n,
                mode: first.mode,
                doc: (**d).clone(),
            }),
            Doc::Group(d) => stack.push(Cmd {
                indent: first.indent,
                mode: first.mode,
                doc: (**d).clone(),
            }),
            Doc::IfBreak(b, f) => {
                let chosen = if first.mode == Mode::Break { b } else { f };
                stack.push(Cmd {
                    indent: first.indent,
                    mode: first.mode,
                    doc: (**chosen).clone(),
                });
            }
            Doc::Line => {
                if first.mode == Mode::Break {
                    return true;
                }
                remaining -= 1;
            }
            Doc::Softline => {
                if first.mode == Mode::Break {
                    return true;
                }
            }
            Doc::Hardline | Doc::BreakParent => return first.mode == Mode::Break,
        }
    }
}

/// Render `doc` to a string per `options`, choosing for each `Group`
/// whether it fits flat on the remaining line width.
#[must_use]
pub fn print(doc: &Doc, options: &PrintOptions) -> String {
    let mut out = String::new();
    let mut col: i64 = 0;
    let mut stack = vec![Cmd {
        indent: 0,
        mode: Mode::Break,
        doc: doc.clone(),
    }];
    while let Some(cmd) = stack.pop() {
        match &cmd.doc {
            Doc::Text(s) => {
                out.push_str(s);
                col += s.chars().count() as i64;
            }
            Doc::Concat(docs) => {
                for d in docs.iter().rev() {
                    stack.push(Cmd {
                        indent: cmd.indent,
                        mode: cmd.mode,
                        doc: d.clone(),
                    });
                }
            }
            Doc::Indent(d) => stack.push(Cmd {
                indent: cmd.indent + options.indent_width,
                mode: cmd.mode,
                doc: (**d).clone(),
            }),
            Doc::Align(n, d) => stack.push(Cmd {
                indent: cmd.indent + n,
                mode: cmd.mode,
                doc: (**d).clone(),
            }),
            Doc::Group(d) => {
                let forced = d.contains_forced_break();
                let flat_cmd = Cmd {
                    indent: cmd.indent,
                    mode: Mode::Flat,
                    doc: (**d).clone(),
                };
                let remaining = options.print_width as i64 - col;
                if !forced && fits(flat_cmd.clone(), &stack, remaining, options) {
                    stack.push(flat_cmd);
                } else {
                    stack.push(Cmd {
                        indent: cmd.indent,
                        mode: Mode::Break,
                        doc: (**d).clone(),
                    });
                }
            }
            Doc::IfBreak(b, f) => {
                let chosen = if cmd.mode == Mode::Break { b } else { f };
                stack.push(Cmd {
                    indent: cmd.indent,
                    mode: cmd.mode,
                    doc: (**chosen).clone(),
                });
            }
            Doc::Line => {
                if cmd.mode == Mode::Break {
                    out.push('\n');
                    out.push_str(&make_indent(options, cmd.indent));
                    col = cmd.indent as i64;
                } else {
                    out.push(' ');
                    col += 1;
                }
            }
            Doc::Softline => {
                if cmd.mode == Mode::Break {
                    out.push('\n');
                    out.push_str(&make_indent(options, cmd.indent));
                    col = cmd.indent as i64;
                }
            }
            Doc::Hardline => {
                out.push('\n');
                out.push_str(&make_indent(options, cmd.indent));
                col = cmd.indent as i64;
            }
            Doc::BreakParent => {}
            Doc::Fill(docs) => {
                let mut items: Vec<Doc> = docs.clone();
                items.reverse();
                for d in items {
                    stack.push(Cmd {
                        indent: cmd.indent,
                        mode: cmd.mode,
                        doc: d,
                    });
                }
            }
        }
    }
    out
}

/// Remove trailing whitespace from every line of `text`, the final pass
/// the formatter applies before returning.
#[must_use]
pub fn trim_trailing_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_group_fits_on_one_line() {
        let doc = Doc::group(Doc::concat([
            Doc::text("{"),
            Doc::indent(Doc::concat([Doc::Line, Doc::text("a: 1")])),
            Doc::Line,
            Doc::text("}"),
        ]));
        let options = PrintOptions::default();
        assert_eq!(print(&doc, &options), "{ a: 1 }");
    }

    #[test]
    fn group_breaks_when_it_does_not_fit() {
        let long = "x".repeat(100);
        let doc = Doc::group(Doc::concat([
            Doc::text("{"),
            Doc::indent(Doc::concat([Doc::Line, Doc::text(long.clone())])),
            Doc::Line,
            Doc::text("}"),
        ]));
        let printed = print(&doc, &PrintOptions::default());
        assert!(printed.contains('\n'));
        assert!(printed.contains(&long));
    }

    #[test]
    fn hardline_forces_break() {
        let doc = Doc::group(Doc::concat([Doc::text("a"), Doc::Hardline, Doc::text("b")]));
        let printed = print(&doc, &PrintOptions::default());
        assert_eq!(printed, "a\nb");
    }

    #[test]
    fn trim_trailing_whitespace_strips_each_line() {
        assert_eq!(trim_trailing_whitespace("a   \nb\t\n"), "a\nb\n".trim_end());
    }
}
